//! Start values for Markov-switching estimation.
//!
//! Purpose
//! -------
//! Build the deterministic default start and the randomized multi-start
//! candidates used by the estimator.
//!
//! Default start
//! -------------
//! 1. OLS of `y_t` on `[1, x_t, y_{t−1}]` (the lag only for `order = 1`)
//!    through an SVD least-squares solve.
//! 2. Partial residuals `r_t = y_t − x_t'β̂ − φ̂ y_{t−1}` are sorted and split
//!    into `k` equal-count groups; the ascending group means become the
//!    regime intercepts. For `order = 1` they are recentred on the mean of
//!    `y_t − x_t'β̂`, since intercepts are levels in the mean-adjusted form.
//! 3. Variances are the within-group variances (switching) or the pooled
//!    within-group variance (shared), floored at `max(1e-4·var(y), 1e-8)`.
//! 4. The transition matrix has diagonal [`DEFAULT_PERSISTENCE`] and spreads
//!    the remaining mass evenly.
//!
//! Multi-start
//! -----------
//! Candidate 0 is the default θ₀. Candidates `1..=reps` are
//! `θ₀ + scale · s ⊙ z` with `z ~ N(0, I)` from a seeded `StdRng`, where
//! `s` comes from [`perturbation_scales`].
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, StandardNormal};

use crate::{
    optimization::loglik_optimizer::Theta,
    regime::{
        core::{data::MSData, params::MSParams, shape::MSShape},
        errors::{MSError, MSResult},
    },
};

/// Self-transition probability of the default start.
pub const DEFAULT_PERSISTENCE: f64 = 0.8;

/// Relative variance floor (times the sample variance of `y`).
const VARIANCE_FLOOR_REL: f64 = 1e-4;

/// Absolute variance floor.
const VARIANCE_FLOOR_ABS: f64 = 1e-8;

/// Bound on the starting AR coefficient.
const AR_START_BOUND: f64 = 0.95;

/// Singular-value cutoff for the OLS solve.
const OLS_SVD_EPS: f64 = 1e-12;

/// Perturbation standard deviation of the AR block (dimensionless).
const AR_PERTURBATION: f64 = 0.5;

/// default_start — deterministic starting parameters for `shape` on `data`.
///
/// # Errors
/// - [`MSError::ExogDimMismatch`] / [`MSError::InsufficientData`] from
///   [`MSShape::check_data`].
/// - [`MSError::OptimizationFailed`] if the OLS solve breaks down.
/// - Parameter validation errors (not expected for finite data).
pub fn default_start(shape: &MSShape, data: &MSData) -> MSResult<MSParams> {
    shape.check_data(data)?;
    let k = shape.k_regimes;
    let order = shape.order;
    let n_eff = shape.n_eff(data.n_obs());
    let m = shape.n_exog;

    // Design [1, x_t, y_{t-1}] over the effective sample.
    let n_cols = 1 + m + order;
    let design = DMatrix::from_fn(n_eff, n_cols, |r, c| {
        let s = r + order;
        match c {
            0 => 1.0,
            c if c <= m => data.exog.as_ref().map_or(0.0, |x| x[[s, c - 1]]),
            _ => data.endog[s - 1],
        }
    });
    let target = DVector::from_iterator(n_eff, data.endog.iter().skip(order).copied());
    let coef = design
        .svd(true, true)
        .solve(&target, OLS_SVD_EPS)
        .map_err(|reason| MSError::OptimizationFailed { status: reason.to_string() })?;

    let beta = Array1::from_iter((0..m).map(|c| coef[1 + c]));
    let phi = if order == 1 { coef[1 + m].clamp(-AR_START_BOUND, AR_START_BOUND) } else { 0.0 };

    // Partial residuals (intercept kept in).
    let partial: Vec<f64> = (0..n_eff)
        .map(|r| {
            let s = r + order;
            let exog = data.exog_row(s).map_or(0.0, |x| x.dot(&beta));
            let lag = if order == 1 { phi * data.endog[s - 1] } else { 0.0 };
            data.endog[s] - exog - lag
        })
        .collect();
    let mut sorted = partial.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let groups = split_groups(&sorted, k);
    let mut intercepts = Array1::from_iter(groups.iter().map(|g| mean(g)));
    if order == 1 {
        let level = mean(
            &(0..n_eff)
                .map(|r| {
                    let s = r + order;
                    data.endog[s] - data.exog_row(s).map_or(0.0, |x| x.dot(&beta))
                })
                .collect::<Vec<_>>(),
        );
        let centre = intercepts.mean().unwrap_or(0.0);
        intercepts.mapv_inplace(|a| a - centre + level);
    }

    let floor = (VARIANCE_FLOOR_REL * variance(&data.endog)).max(VARIANCE_FLOOR_ABS);
    let within: Vec<f64> = groups.iter().map(|g| variance(*g)).collect();
    let variances = if shape.switching_variance {
        Array1::from_iter(within.iter().map(|&v| v.max(floor)))
    } else {
        let ss: f64 = groups.iter().zip(&within).map(|(g, &v)| v * g.len() as f64).sum();
        Array1::from_elem(1, (ss / n_eff as f64).max(floor))
    };

    let exog = Array2::from_shape_fn((shape.exog_rows(), m), |(_, c)| beta[c]);
    let ar = Array1::from_elem(shape.n_ar(), phi);

    Ok(MSParams::new(*shape, persistent_transition(k), intercepts, exog, ar, variances)?)
}

/// Transition matrix with diagonal [`DEFAULT_PERSISTENCE`] and uniform
/// off-diagonal mass.
pub fn persistent_transition(k: usize) -> Array2<f64> {
    let off = (1.0 - DEFAULT_PERSISTENCE) / (k as f64 - 1.0);
    Array2::from_shape_fn((k, k), |(i, j)| if i == j { DEFAULT_PERSISTENCE } else { off })
}

/// perturbation_scales — per-entry standard deviations for θ perturbations.
///
/// - transition logits and log-variances: 1
/// - intercepts and exogenous coefficients: sample standard deviation of `y`
/// - AR coefficients: 0.5
pub fn perturbation_scales(shape: &MSShape, data: &MSData) -> Array1<f64> {
    let layout = shape.layout();
    let sd_y = variance(&data.endog).sqrt().max(VARIANCE_FLOOR_ABS);
    let mut scales = Array1::ones(layout.len());
    for idx in layout.intercept.start..layout.exog.end {
        scales[idx] = sd_y;
    }
    for idx in layout.ar.clone() {
        scales[idx] = AR_PERTURBATION;
    }
    scales
}

/// search_candidates — θ₀ followed by `reps` Gaussian perturbations.
///
/// The sequence is a deterministic function of `seed`; `None` draws the seed
/// from OS entropy.
pub fn search_candidates(
    theta0: &Theta, scales: &Array1<f64>, scale: f64, reps: usize, seed: Option<u64>,
) -> Vec<Theta> {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let mut out = Vec::with_capacity(reps + 1);
    out.push(theta0.clone());
    for _ in 0..reps {
        let cand = Theta::from_iter(theta0.iter().zip(scales.iter()).map(|(&t, &s)| {
            let z: f64 = StandardNormal.sample(&mut rng);
            t + scale * s * z
        }));
        out.push(cand);
    }
    out
}

// ---- Helper methods ----

/// Split an ascending slice into `k` contiguous groups of (nearly) equal size.
fn split_groups(sorted: &[f64], k: usize) -> Vec<&[f64]> {
    let n = sorted.len();
    (0..k).map(|g| &sorted[g * n / k..(g + 1) * n / k]).collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by `n`); 0 for no values.
///
/// Takes any borrowed iterable so a strided endog column needs no copy.
fn variance<'a, I>(values: I) -> f64
where
    I: IntoIterator<Item = &'a f64> + Copy,
{
    let (n, sum) = values.into_iter().fold((0usize, 0.0), |(n, sum), v| (n + 1, sum + v));
    if n == 0 {
        return 0.0;
    }
    let mu = sum / n as f64;
    values.into_iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / n as f64
}
