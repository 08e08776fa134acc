//! Numerical stability utilities.
//!
//! Provides guarded implementations of the nonlinear maps used to move
//! between the unconstrained optimizer space and Markov-switching parameter
//! space, plus the log-space reductions used by the regime filter.
//!
//! # Provided items
//! - [`TRANSITION_LOGIT_BOUND`]: clamp applied to transition logits before the
//!   softmax, so no finite input produces a probability of exactly 0 or 1.
//! - [`LOG_VARIANCE_BOUND`]: clamp applied to log-variances before `exp`.
//! - [`EIGEN_EPS`]: eigenvalue cutoff for pseudo-inverses.
//! - [`log_sum_exp`]: max-shifted `ln Σ exp(xᵢ)`.
//! - [`safe_softmax`] / [`safe_softmax_inv`]: multinomial logit with the last
//!   category as baseline.
//! - [`safe_variance`] / [`safe_variance_inv`]: log-variance maps.
//! - [`delta_method`]: `G Σ Gᵀ` covariance propagation.
use ndarray::{Array2, ArrayView1, ArrayViewMut1};

/// Largest absolute logit accepted by [`safe_softmax`] (larger values are clamped).
pub const TRANSITION_LOGIT_BOUND: f64 = 30.0;

/// Largest absolute log-variance accepted by [`safe_variance`].
pub const LOG_VARIANCE_BOUND: f64 = 60.0;

/// Eigenvalues at or below this value are dropped from pseudo-inverses.
pub const EIGEN_EPS: f64 = 1e-10;

/// log_sum_exp — stable `ln Σᵢ exp(xᵢ)`.
///
/// Purpose
/// -------
/// Reduce a vector of log-values without overflow by shifting with the
/// maximum element before exponentiating.
///
/// Returns
/// -------
/// - `f64::NEG_INFINITY` when every entry is `-∞` (or the input is empty).
/// - `NaN` when any entry is `NaN`.
/// - `+∞` when any entry is `+∞`.
pub fn log_sum_exp(values: ArrayView1<f64>) -> f64 {
    let mut max = f64::NEG_INFINITY;
    for &v in values.iter() {
        if v.is_nan() {
            return f64::NAN;
        }
        if v > max {
            max = v;
        }
    }
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = values.iter().map(|&v| (v - max).exp()).sum();
    max + sum.ln()
}

/// safe_softmax — map `k − 1` logits onto a probability simplex of size `k`.
///
/// Purpose
/// -------
/// Implements the multinomial-logit parameterization of one transition-matrix
/// row. The last category is the baseline with logit fixed at zero:
///
/// `pᵢ = exp(θᵢ) / (1 + Σₗ exp(θₗ))`, `p_{k−1} = 1 / (1 + Σₗ exp(θₗ))`.
///
/// Parameters
/// ----------
/// - `logits`: `ArrayView1<f64>` of length `k − 1`.
/// - `out`: `ArrayViewMut1<f64>` of length `k`, overwritten with the simplex.
///
/// Notes
/// -----
/// - Logits are clamped to `±TRANSITION_LOGIT_BOUND` and max-shifted, so every
///   output lies in the open interval (0, 1) and the row sums to one up to
///   rounding.
/// - Panics if `out.len() != logits.len() + 1` (programming error).
pub fn safe_softmax(logits: ArrayView1<f64>, mut out: ArrayViewMut1<f64>) {
    let k = out.len();
    assert_eq!(logits.len() + 1, k, "softmax output must have one more entry than logits");

    let mut max = 0.0_f64;
    for &x in logits.iter() {
        let x = x.clamp(-TRANSITION_LOGIT_BOUND, TRANSITION_LOGIT_BOUND);
        if x > max {
            max = x;
        }
    }
    let mut denom = 0.0;
    for (i, &x) in logits.iter().enumerate() {
        let e = (x.clamp(-TRANSITION_LOGIT_BOUND, TRANSITION_LOGIT_BOUND) - max).exp();
        out[i] = e;
        denom += e;
    }
    let base = (-max).exp();
    out[k - 1] = base;
    denom += base;
    out.mapv_inplace(|p| p / denom);
}

/// safe_softmax_inv — recover baseline logits from a strictly interior simplex.
///
/// `θᵢ = ln pᵢ − ln p_{k−1}` for `i < k − 1`. Inputs are assumed validated
/// (every entry in (0, 1)); no clamping is applied.
pub fn safe_softmax_inv(probs: ArrayView1<f64>, mut out: ArrayViewMut1<f64>) {
    let k = probs.len();
    assert_eq!(out.len() + 1, k, "logit output must have one fewer entry than probabilities");
    let ln_base = probs[k - 1].ln();
    for i in 0..k - 1 {
        out[i] = probs[i].ln() - ln_base;
    }
}

/// Map a log-variance to a strictly positive, finite variance.
pub fn safe_variance(log_var: f64) -> f64 {
    log_var.clamp(-LOG_VARIANCE_BOUND, LOG_VARIANCE_BOUND).exp()
}

/// Inverse of [`safe_variance`] for a validated positive variance.
pub fn safe_variance_inv(var: f64) -> f64 {
    var.ln()
}

/// delta_method — propagate a θ-space covariance through a Jacobian.
///
/// Purpose
/// -------
/// Given `Σ_θ` (`n × n`) and the Jacobian `G = ∂g/∂θ` (`m × n`) of a smooth
/// map `g`, return `G Σ_θ Gᵀ`, symmetrized to remove rounding asymmetry.
///
/// Panics
/// ------
/// - If the inner dimensions disagree (programming error).
pub fn delta_method(cov_theta: &Array2<f64>, jacobian: &Array2<f64>) -> Array2<f64> {
    let mut cov = jacobian.dot(cov_theta).dot(&jacobian.t());
    let m = cov.nrows();
    for i in 0..m {
        for j in 0..i {
            let avg = 0.5 * (cov[[i, j]] + cov[[j, i]]);
            cov[[i, j]] = avg;
            cov[[j, i]] = avg;
        }
    }
    cov
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array1, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - log_sum_exp against the naive formula and on degenerate inputs.
    // - Simplex invariants of safe_softmax for moderate and extreme logits.
    // - The softmax / inverse round trip.
    // - Variance map bounds and delta_method against an explicit product.
    //
    // They intentionally DO NOT cover:
    // - Transition-matrix assembly (tested in regime::core::params).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Check log_sum_exp against ln Σ exp on a safe grid.
    //
    // Given
    // -----
    // - Values [-1.0, 0.5, 2.0].
    //
    // Expect
    // ------
    // - Agreement with the naive computation to 1e-12.
    fn log_sum_exp_matches_naive_formula() {
        // Arrange
        let x = array![-1.0_f64, 0.5, 2.0];
        let naive = x.iter().map(|v| v.exp()).sum::<f64>().ln();

        // Act
        let lse = log_sum_exp(x.view());

        // Assert
        assert_relative_eq!(lse, naive, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Ensure log_sum_exp neither overflows nor underflows on extreme values.
    //
    // Given
    // -----
    // - Values around ±1000 and an all `-∞` vector.
    //
    // Expect
    // ------
    // - Finite results for the large values; `-∞` for the all `-∞` input.
    fn log_sum_exp_handles_extremes() {
        // Arrange
        let big = array![1000.0_f64, 1000.0];
        let small = array![-1000.0_f64, -1001.0];
        let empty_mass = array![f64::NEG_INFINITY, f64::NEG_INFINITY];

        // Act
        let lse_big = log_sum_exp(big.view());
        let lse_small = log_sum_exp(small.view());
        let lse_none = log_sum_exp(empty_mass.view());

        // Assert
        assert_relative_eq!(lse_big, 1000.0 + 2.0_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(lse_small, -1000.0 + (1.0 + (-1.0_f64).exp()).ln(), epsilon = 1e-12);
        assert_eq!(lse_none, f64::NEG_INFINITY);
    }

    #[test]
    // Purpose
    // -------
    // Verify that safe_softmax produces a strictly interior simplex even for
    // logits far beyond the clamp.
    //
    // Given
    // -----
    // - Logit vectors with entries ±1e6 for k = 2 and k = 4.
    //
    // Expect
    // ------
    // - Every probability is strictly inside (0, 1).
    // - Rows sum to one within 1e-10.
    fn safe_softmax_never_hits_zero_or_one() {
        for logits in [array![1e6_f64], array![-1e6_f64], array![1e6_f64, -1e6, 0.0]] {
            // Arrange
            let mut out = Array1::<f64>::zeros(logits.len() + 1);

            // Act
            safe_softmax(logits.view(), out.view_mut());

            // Assert
            assert!(out.iter().all(|&p| p > 0.0 && p < 1.0), "probabilities {out:?}");
            assert_relative_eq!(out.sum(), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    // Purpose
    // -------
    // Confirm safe_softmax_inv inverts safe_softmax on an interior simplex.
    //
    // Given
    // -----
    // - Probabilities [0.7, 0.2, 0.1].
    //
    // Expect
    // ------
    // - softmax(inv(p)) == p within 1e-12.
    fn softmax_round_trip_recovers_probabilities() {
        // Arrange
        let p = array![0.7_f64, 0.2, 0.1];
        let mut logits = Array1::<f64>::zeros(2);
        let mut back = Array1::<f64>::zeros(3);

        // Act
        safe_softmax_inv(p.view(), logits.view_mut());
        safe_softmax(logits.view(), back.view_mut());

        // Assert
        for (a, b) in p.iter().zip(back.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Check that the variance map stays positive and finite at the bounds.
    //
    // Given
    // -----
    // - Log-variances of ±1e4 and a regular value.
    //
    // Expect
    // ------
    // - Positive finite variances; exact inverse for the regular value.
    fn safe_variance_is_positive_and_finite() {
        // Arrange / Act
        let hi = safe_variance(1e4);
        let lo = safe_variance(-1e4);
        let mid = safe_variance(safe_variance_inv(2.5));

        // Assert
        assert!(hi.is_finite() && hi > 0.0);
        assert!(lo.is_finite() && lo > 0.0);
        assert_relative_eq!(mid, 2.5, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Compare delta_method with the explicit product G Σ Gᵀ.
    //
    // Given
    // -----
    // - Σ = diag(1, 4) and a 3 × 2 Jacobian.
    //
    // Expect
    // ------
    // - Entry-wise agreement and exact symmetry.
    fn delta_method_matches_explicit_product() {
        // Arrange
        let cov = array![[1.0_f64, 0.0], [0.0, 4.0]];
        let g = array![[1.0_f64, 2.0], [0.5, -1.0], [0.0, 3.0]];
        let expected = g.dot(&cov).dot(&g.t());

        // Act
        let out = delta_method(&cov, &g);

        // Assert
        assert_eq!(out.dim(), (3, 3));
        for ((i, j), v) in out.indexed_iter() {
            assert_relative_eq!(*v, expected[[i, j]], epsilon = 1e-12);
            assert_eq!(out[[i, j]], out[[j, i]]);
        }
    }
}
