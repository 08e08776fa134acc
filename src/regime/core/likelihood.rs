//! Regime likelihood engine: conditional means and Gaussian log-densities.
//!
//! Purpose
//! -------
//! For every effective time step `t` and every ordered regime pair
//! `(i, j)` = (previous, current), evaluate
//!
//! `ln f(y_t | S_{t−1}=i, S_t=j) = −½ ln 2π − ½ ln σ²_j − (y_t − μ_{ij,t})² / (2σ²_j)`.
//!
//! Conventions
//! -----------
//! - `order = 0`: `μ_{j,t} = a_j + x_t'β_j`. The previous regime does not
//!   matter and the tensor is `(T, 1, k)`.
//! - `order = 1`: `μ_{ij,t} = a_j + x_t'β_j + φ_j (y_{t−1} − a_i − x_{t−1}'β_i)`.
//!   The tensor is `(T − 1, k, k)` and effective row `t` is observation `t + 1`.
//! - The current regime `j` always selects the variance.
use ndarray::{Array3, ArrayViewMut3};

use crate::regime::core::{data::MSData, params::MSParams};

/// `ln(2π)`.
const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Tensor shape `(n_eff, k_prev, k)` for `params` on `data`.
pub fn tensor_dim(params: &MSParams, n_obs: usize) -> (usize, usize, usize) {
    let shape = &params.shape;
    let k_prev = if shape.order == 0 { 1 } else { shape.k_regimes };
    (shape.n_eff(n_obs), k_prev, shape.k_regimes)
}

/// conditional_means — `μ_{ij,t}` for every effective step and regime pair.
///
/// Returns an `(n_eff, k_prev, k)` tensor laid out like [`log_densities`].
/// Used by the likelihood and by in-sample prediction.
pub fn conditional_means(params: &MSParams, data: &MSData) -> Array3<f64> {
    let (n_eff, k_prev, k) = tensor_dim(params, data.n_obs());
    let order = params.shape.order;
    let mut out = Array3::zeros((n_eff, k_prev, k));
    for t in 0..n_eff {
        let s = t + order;
        for j in 0..k {
            let base = params.regression_mean(j, data.exog_row(s));
            if order == 0 {
                out[[t, 0, j]] = base;
                continue;
            }
            let phi = params.ar_coef(j);
            for i in 0..k_prev {
                let lagged_mean = params.regression_mean(i, data.exog_row(s - 1));
                let lagged_dev = data.endog[s - 1] - lagged_mean;
                out[[t, i, j]] = base + phi * lagged_dev;
            }
        }
    }
    out
}

/// log_densities — Gaussian log-density tensor `(n_eff, k_prev, k)`.
pub fn log_densities(params: &MSParams, data: &MSData) -> Array3<f64> {
    let mut out = Array3::zeros(tensor_dim(params, data.n_obs()));
    log_densities_into(params, data, out.view_mut());
    out
}

/// log_densities_into — write the log-density tensor into a caller buffer.
///
/// # Panics
/// - If `out` does not have the shape returned by [`tensor_dim`]
///   (programming error).
pub fn log_densities_into(params: &MSParams, data: &MSData, mut out: ArrayViewMut3<f64>) {
    let dim = tensor_dim(params, data.n_obs());
    assert_eq!(out.dim(), dim, "log-density buffer has the wrong shape");
    let (n_eff, k_prev, k) = dim;
    let order = params.shape.order;

    let log_norm: Vec<f64> =
        (0..k).map(|j| -0.5 * (LN_2PI + params.variance(j).ln())).collect();
    let inv_two_var: Vec<f64> = (0..k).map(|j| 0.5 / params.variance(j)).collect();

    for t in 0..n_eff {
        let s = t + order;
        let y = data.endog[s];
        for j in 0..k {
            let base = params.regression_mean(j, data.exog_row(s));
            let phi = params.ar_coef(j);
            for i in 0..k_prev {
                let mu = if order == 0 {
                    base
                } else {
                    base + phi
                        * (data.endog[s - 1] - params.regression_mean(i, data.exog_row(s - 1)))
                };
                let resid = y - mu;
                out[[t, i, j]] = log_norm[j] - resid * resid * inv_two_var[j];
            }
        }
    }
}
