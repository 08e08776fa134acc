//! Hamilton filter — forward recursion over regime pairs in log space.
//!
//! Purpose
//! -------
//! Given the log-density tensor from `likelihood`, the transition matrix,
//! and a distribution for the regime before the first effective
//! observation, compute filtered and one-step-ahead predicted regime
//! probabilities together with the log-likelihood.
//!
//! Recursion (effective steps `t = 0..n_eff`)
//! ------------------------------------------
//! 1. Predict: `ln prior(i, j) = ln f_{t−1}(i) + ln P[i][j]`, with
//!    `f_{−1} = π₀`.
//! 2. Weight: `ln joint(i, j) = ln prior(i, j) + ln dens(t, i, j)`.
//! 3. `ℓ_t = logsumexp_{i,j} ln joint(i, j)`; `ℓ += ℓ_t`.
//! 4. Normalize and marginalize: `f_t(j) = Σ_i exp(ln joint(i, j) − ℓ_t)`.
//!
//! If every joint weight at `t` underflows (`ℓ_t = −∞`) or the step produces
//! NaN, the filter fails with [`MSError::NumericalDegeneracy`] carrying `t`.
//!
//! When the density tensor has a single "previous" slice (static models) it
//! is broadcast over `i`.
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2};

use crate::{
    optimization::numerical_stability::transformations::log_sum_exp,
    regime::{
        core::{options::InitialProbs, transition::stationary_distribution},
        errors::{MSError, MSResult},
    },
};

/// Tolerance on `|Σπ − 1|` for known initial probabilities.
const INITIAL_SUM_TOL: f64 = 1e-8;

/// Output of [`hamilton_filter`].
///
/// - `loglik`: total log-likelihood `Σ_t ℓ_t`.
/// - `loglik_obs`: per-step contributions `ℓ_t` (length `n_eff`).
/// - `filtered`: `n_eff × k`, row `t` = `Pr(S_t = j | y_0..y_t)`.
/// - `predicted`: `n_eff × k`, row `t` = `Pr(S_t = j | y_0..y_{t−1})`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutput {
    pub loglik: f64,
    pub loglik_obs: Array1<f64>,
    pub filtered: Array2<f64>,
    pub predicted: Array2<f64>,
}

/// initial_probabilities — resolve [`InitialProbs`] for a transition matrix.
///
/// # Errors
/// - Errors from [`stationary_distribution`] for the stationary choice.
/// - [`MSError::InvalidInitialProbs`] for a known vector of the wrong length,
///   with a negative or non-finite entry, or not summing to one.
pub fn initial_probabilities(
    transition: ArrayView2<f64>, init: &InitialProbs,
) -> MSResult<Array1<f64>> {
    let k = transition.nrows();
    match init {
        InitialProbs::Stationary => Ok(stationary_distribution(transition)?),
        InitialProbs::Uniform => Ok(Array1::from_elem(k, 1.0 / k as f64)),
        InitialProbs::Known(pi) => {
            validate_known(pi.view(), k)?;
            Ok(pi.clone())
        }
    }
}

/// Check a known initial distribution against `k`.
///
/// # Errors
/// - [`MSError::InvalidInitialProbs`] describing the first violation.
pub fn validate_known(pi: ArrayView1<f64>, k: usize) -> MSResult<()> {
    if pi.len() != k {
        return Err(MSError::InvalidInitialProbs { reason: "length must equal k_regimes" });
    }
    if pi.iter().any(|&p| !p.is_finite() || p < 0.0) {
        return Err(MSError::InvalidInitialProbs { reason: "entries must be finite and >= 0" });
    }
    if (pi.sum() - 1.0).abs() > INITIAL_SUM_TOL {
        return Err(MSError::InvalidInitialProbs { reason: "entries must sum to 1" });
    }
    Ok(())
}

/// hamilton_filter — run the forward recursion and keep every intermediate
/// probability.
///
/// Parameters
/// ----------
/// - `log_dens`: `(n_eff, k_prev, k)` tensor with `k_prev ∈ {1, k}`.
/// - `transition`: `k × k` row-stochastic matrix.
/// - `initial`: regime distribution before the first effective observation.
///
/// # Errors
/// - [`MSError::NumericalDegeneracy`] with `stage = "filter"`.
pub fn hamilton_filter(
    log_dens: &Array3<f64>, transition: ArrayView2<f64>, initial: ArrayView1<f64>,
) -> MSResult<FilterOutput> {
    let (n_eff, _, k) = log_dens.dim();
    let mut out = FilterOutput {
        loglik: 0.0,
        loglik_obs: Array1::zeros(n_eff),
        filtered: Array2::zeros((n_eff, k)),
        predicted: Array2::zeros((n_eff, k)),
    };
    out.loglik = forward(log_dens, transition, initial, Some(&mut out))?;
    Ok(out)
}

/// hamilton_loglik — log-likelihood only; no probability matrices are kept.
///
/// # Errors
/// - [`MSError::NumericalDegeneracy`] with `stage = "filter"`.
pub fn hamilton_loglik(
    log_dens: &Array3<f64>, transition: ArrayView2<f64>, initial: ArrayView1<f64>,
) -> MSResult<f64> {
    forward(log_dens, transition, initial, None)
}

// ---- Helper methods ----

fn forward(
    log_dens: &Array3<f64>, transition: ArrayView2<f64>, initial: ArrayView1<f64>,
    mut sink: Option<&mut FilterOutput>,
) -> MSResult<f64> {
    let (n_eff, k_prev, k) = log_dens.dim();
    let log_p = transition.mapv(f64::ln);
    let mut log_prev = initial.mapv(f64::ln);
    let mut log_joint = Array1::<f64>::zeros(k * k);
    let mut log_prior = Array1::<f64>::zeros(k * k);
    let mut loglik = 0.0;

    for t in 0..n_eff {
        for i in 0..k {
            let i_dens = if k_prev == 1 { 0 } else { i };
            for j in 0..k {
                let prior = log_prev[i] + log_p[[i, j]];
                log_prior[i * k + j] = prior;
                log_joint[i * k + j] = prior + log_dens[[t, i_dens, j]];
            }
        }

        let ll_t = log_sum_exp(log_joint.view());
        if !ll_t.is_finite() {
            return Err(MSError::NumericalDegeneracy { t, stage: "filter" });
        }
        loglik += ll_t;

        for j in 0..k {
            let mut filtered = 0.0;
            let mut predicted = 0.0;
            for i in 0..k {
                filtered += (log_joint[i * k + j] - ll_t).exp();
                predicted += log_prior[i * k + j].exp();
            }
            log_prev[j] = filtered.ln();
            if let Some(out) = sink.as_deref_mut() {
                out.filtered[[t, j]] = filtered;
                out.predicted[[t, j]] = predicted;
            }
        }
        if let Some(out) = sink.as_deref_mut() {
            out.loglik_obs[t] = ll_t;
        }
    }
    Ok(loglik)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array3, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Agreement with a direct probability-space Hamilton recursion.
    // - Row sums of filtered and predicted probabilities.
    // - Degeneracy when every density underflows.
    // - Initial-distribution resolution and validation.
    // -------------------------------------------------------------------------

    /// Purpose
    /// -------
    /// Probability-space reference recursion for a static tensor.
    ///
    /// Returns
    /// -------
    /// `(loglik, filtered)`.
    fn naive_filter(dens: &Array2<f64>, p: &Array2<f64>, pi0: &Array1<f64>) -> (f64, Array2<f64>) {
        let (n, k) = dens.dim();
        let mut prev = pi0.clone();
        let mut filtered = Array2::zeros((n, k));
        let mut ll = 0.0;
        for t in 0..n {
            let pred = p.t().dot(&prev);
            let joint = &pred * &dens.row(t);
            let lik = joint.sum();
            ll += lik.ln();
            prev = joint / lik;
            filtered.row_mut(t).assign(&prev);
        }
        (ll, filtered)
    }

    #[test]
    // Purpose
    // -------
    // The log-space filter reproduces the textbook recursion.
    //
    // Given
    // -----
    // - Two regimes, five steps of hand-picked positive densities, uniform π₀.
    //
    // Expect
    // ------
    // - Same log-likelihood and filtered matrix within 1e-12; every filtered
    //   and predicted row sums to one; loglik_obs sums to loglik.
    fn log_space_filter_matches_naive_recursion() {
        // Arrange
        let dens = array![[0.3, 0.01], [0.2, 0.05], [0.001, 0.4], [0.02, 0.3], [0.25, 0.25]];
        let p = array![[0.9, 0.1], [0.2, 0.8]];
        let pi0 = array![0.5, 0.5];
        let mut log_dens = Array3::zeros((5, 1, 2));
        for t in 0..5 {
            for j in 0..2 {
                log_dens[[t, 0, j]] = f64::ln(dens[[t, j]]);
            }
        }

        // Act
        let out = hamilton_filter(&log_dens, p.view(), pi0.view()).expect("finite filter");
        let (ll_ref, filtered_ref) = naive_filter(&dens, &p, &pi0);

        // Assert
        assert_abs_diff_eq!(out.loglik, ll_ref, epsilon = 1e-12);
        assert_abs_diff_eq!(out.loglik_obs.sum(), out.loglik, epsilon = 1e-12);
        for t in 0..5 {
            assert_abs_diff_eq!(out.filtered.row(t).sum(), 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(out.predicted.row(t).sum(), 1.0, epsilon = 1e-12);
            for j in 0..2 {
                assert_abs_diff_eq!(out.filtered[[t, j]], filtered_ref[[t, j]], epsilon = 1e-12);
            }
        }
        let ll_only = hamilton_loglik(&log_dens, p.view(), pi0.view()).expect("finite filter");
        assert_eq!(ll_only, out.loglik);
    }

    #[test]
    // Purpose
    // -------
    // All-underflow steps are reported with their time index.
    //
    // Given
    // -----
    // - A tensor whose third step is −∞ for every regime.
    //
    // Expect
    // ------
    // - NumericalDegeneracy { t: 2, stage: "filter" }.
    fn underflow_reports_degeneracy() {
        let mut log_dens = Array3::from_elem((4, 1, 2), -1.0);
        log_dens[[2, 0, 0]] = f64::NEG_INFINITY;
        log_dens[[2, 0, 1]] = f64::NEG_INFINITY;
        let p = array![[0.9, 0.1], [0.2, 0.8]];
        let err = hamilton_filter(&log_dens, p.view(), array![0.5, 0.5].view())
            .expect_err("underflow must fail");
        assert_eq!(err, MSError::NumericalDegeneracy { t: 2, stage: "filter" });
    }

    #[test]
    // Purpose
    // -------
    // Initial distributions resolve as documented and known vectors are checked.
    //
    // Given
    // -----
    // - P = [[0.9, 0.1], [0.3, 0.7]]; stationary, uniform, and three known
    //   vectors (valid, wrong length, not summing to one).
    //
    // Expect
    // ------
    // - (0.75, 0.25), (0.5, 0.5), the valid vector, then two
    //   InvalidInitialProbs errors.
    fn initial_probabilities_resolve_and_validate() {
        let p = array![[0.9, 0.1], [0.3, 0.7]];
        let stat = initial_probabilities(p.view(), &InitialProbs::Stationary).expect("ergodic");
        assert_abs_diff_eq!(stat[0], 0.75, epsilon = 1e-12);
        let unif = initial_probabilities(p.view(), &InitialProbs::Uniform).expect("uniform");
        assert_eq!(unif, array![0.5, 0.5]);
        let known = InitialProbs::Known(array![1.0, 0.0]);
        assert_eq!(initial_probabilities(p.view(), &known).expect("known"), array![1.0, 0.0]);

        let short = InitialProbs::Known(array![1.0]);
        assert!(matches!(
            initial_probabilities(p.view(), &short),
            Err(MSError::InvalidInitialProbs { .. })
        ));
        let loose = InitialProbs::Known(array![0.6, 0.6]);
        assert!(matches!(
            initial_probabilities(p.view(), &loose),
            Err(MSError::InvalidInitialProbs { .. })
        ));
    }
}
