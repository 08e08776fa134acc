//! Kim smoother — backward pass turning filtered into full-sample regime
//! probabilities.
//!
//! With `T = n_eff`:
//!
//! - `smoothed(·, T−1) = filtered(·, T−1)` (copied, not recomputed).
//! - For `t = T−2 … 0`:
//!   `smoothed(j, t) = filtered(j, t) · Σ_{j'} P[j][j'] · smoothed(j', t+1) / predicted(j', t+1)`.
//!
//! `predicted(j', t+1)` is the one-step-ahead probability stored by the
//! Hamilton filter. For first-order autoregressive models the recursion is
//! Kim's approximation, which treats `S_t` as independent of future data
//! given `S_{t+1}` and the filtered information.
use ndarray::{Array2, ArrayView2};

use crate::regime::errors::{MSError, MSResult};

/// kim_smoother — smoothed regime probabilities (`n_eff × k`).
///
/// Rows before the last are renormalized to absorb rounding; the last row
/// is the filtered row, bit for bit.
///
/// # Errors
/// - [`MSError::NumericalDegeneracy`] with `stage = "smoother"` when a
///   predicted probability that carries smoothed mass is not strictly
///   positive, or when a smoothed row loses all mass.
///
/// # Panics
/// - If `filtered` and `predicted` differ in shape (programming error).
pub fn kim_smoother(
    filtered: ArrayView2<f64>, predicted: ArrayView2<f64>, transition: ArrayView2<f64>,
) -> MSResult<Array2<f64>> {
    assert_eq!(filtered.dim(), predicted.dim(), "filtered/predicted shapes differ");
    let (n_eff, k) = filtered.dim();
    let mut smoothed = Array2::<f64>::zeros((n_eff, k));
    if n_eff == 0 {
        return Ok(smoothed);
    }
    smoothed.row_mut(n_eff - 1).assign(&filtered.row(n_eff - 1));

    let mut ratio = vec![0.0; k];
    for t in (0..n_eff - 1).rev() {
        for (jp, r) in ratio.iter_mut().enumerate() {
            let pred = predicted[[t + 1, jp]];
            let sm = smoothed[[t + 1, jp]];
            *r = if sm == 0.0 {
                0.0
            } else if pred > 0.0 && pred.is_finite() {
                sm / pred
            } else {
                return Err(MSError::NumericalDegeneracy { t: t + 1, stage: "smoother" });
            };
        }

        let mut total = 0.0;
        for j in 0..k {
            let back: f64 = (0..k).map(|jp| transition[[j, jp]] * ratio[jp]).sum();
            let value = filtered[[t, j]] * back;
            smoothed[[t, j]] = value;
            total += value;
        }
        if !(total > 0.0 && total.is_finite()) {
            return Err(MSError::NumericalDegeneracy { t, stage: "smoother" });
        }
        smoothed.row_mut(t).mapv_inplace(|v| v / total);
    }
    Ok(smoothed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::core::filter::hamilton_filter;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, Array3, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Boundary condition and row sums on a filter run.
    // - Agreement with brute-force enumeration of regime paths.
    // - Degeneracy on a vanishing predicted probability.
    // -------------------------------------------------------------------------

    /// Purpose
    /// -------
    /// Exact `Pr(S_t = j | y_0..y_{T−1})` by enumerating all `k^T` paths of a
    /// static model.
    fn brute_force_smoothed(dens: &Array2<f64>, p: &Array2<f64>, pi0: &Array1<f64>) -> Array2<f64> {
        let (n, k) = dens.dim();
        let mut out = Array2::<f64>::zeros((n, k));
        let mut total = 0.0;
        let paths = k.pow(n as u32);
        for code in 0..paths {
            let mut path = vec![0usize; n];
            let mut c = code;
            for s in path.iter_mut() {
                *s = c % k;
                c /= k;
            }
            let first: f64 = (0..k).map(|i| pi0[i] * p[[i, path[0]]]).sum();
            let mut w = first * dens[[0, path[0]]];
            for t in 1..n {
                w *= p[[path[t - 1], path[t]]] * dens[[t, path[t]]];
            }
            total += w;
            for t in 0..n {
                out[[t, path[t]]] += w;
            }
        }
        out / total
    }

    #[test]
    // Purpose
    // -------
    // The smoother matches exact path enumeration, keeps the last row equal
    // to the filtered row, and produces rows summing to one.
    //
    // Given
    // -----
    // - Two regimes, six steps of positive densities, π₀ = (0.3, 0.7).
    //
    // Expect
    // ------
    // - Every smoothed entry within 1e-10 of brute force; final row
    //   identical to the filtered row; row sums within 1e-12.
    fn smoother_matches_path_enumeration() {
        // Arrange
        let dens: Array2<f64> =
            array![[0.3, 0.01], [0.2, 0.05], [0.001, 0.4], [0.02, 0.3], [0.25, 0.2], [0.4, 0.1]];
        let p = array![[0.85, 0.15], [0.25, 0.75]];
        let pi0 = array![0.3, 0.7];
        let log_dens = Array3::from_shape_fn((6, 1, 2), |(t, _, j)| dens[[t, j]].ln());
        let filt = hamilton_filter(&log_dens, p.view(), pi0.view()).expect("finite filter");

        // Act
        let smoothed =
            kim_smoother(filt.filtered.view(), filt.predicted.view(), p.view()).expect("smooth");
        let exact = brute_force_smoothed(&dens, &p, &pi0);

        // Assert
        assert_eq!(smoothed.row(5), filt.filtered.row(5));
        for t in 0..6 {
            assert_abs_diff_eq!(smoothed.row(t).sum(), 1.0, epsilon = 1e-12);
            for j in 0..2 {
                assert_abs_diff_eq!(smoothed[[t, j]], exact[[t, j]], epsilon = 1e-10);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // A zero predicted probability under positive smoothed mass is a
    // degeneracy, reported at the offending step.
    //
    // Given
    // -----
    // - Hand-built filtered/predicted matrices with predicted[2][1] = 0.
    //
    // Expect
    // ------
    // - NumericalDegeneracy { t: 2, stage: "smoother" }.
    fn zero_predicted_probability_is_degenerate() {
        let filtered = array![[0.5, 0.5], [0.5, 0.5], [0.5, 0.5]];
        let predicted = array![[0.5, 0.5], [0.5, 0.5], [1.0, 0.0]];
        let p = array![[0.9, 0.1], [0.2, 0.8]];
        assert_eq!(
            kim_smoother(filtered.view(), predicted.view(), p.view()),
            Err(MSError::NumericalDegeneracy { t: 2, stage: "smoother" })
        );
    }
}
