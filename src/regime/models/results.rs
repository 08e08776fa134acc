//! Fit result for Markov-switching regression.
//!
//! [`MSFitResult`] is an immutable value produced once at the end of a
//! successful fit. It carries the constrained parameters, the optimizer
//! vector θ̂, the final forward/backward pass, transition summaries, and an
//! optional inference table. Derived quantities (information criteria,
//! predictions, test statistics) are computed on demand from these fields.
use ndarray::{Array1, Array2, Array3};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::{
    optimization::loglik_optimizer::Theta,
    regime::{
        core::params::MSParams,
        errors::{MSError, MSResult},
    },
};

/// Which regime probabilities to use for prediction or classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbabilityKind {
    /// `Pr(S_t = j | y_0..y_{t−1})`.
    Predicted,
    /// `Pr(S_t = j | y_0..y_t)`.
    Filtered,
    /// `Pr(S_t = j | y_0..y_{T−1})`.
    Smoothed,
}

/// Standard errors of the constrained flat parameters.
///
/// `Available` holds the delta-method covariance `G Cov_θ Gᵀ` and its
/// diagonal square roots, in the layout of [`MSParams::to_flat`].
/// `Unavailable` records why they could not be computed (disabled, or a
/// non-finite Hessian/Jacobian).
#[derive(Debug, Clone, PartialEq)]
pub enum StdErrors {
    Available { cov: Array2<f64>, se: Array1<f64> },
    Unavailable { reason: String },
}

/// MSFitResult — everything known about a converged fit.
///
/// Per-step arrays index the effective sample: row `t` is observation
/// `t + order`.
#[derive(Debug, Clone, PartialEq)]
pub struct MSFitResult {
    /// Constrained parameters at the optimum.
    pub params: MSParams,
    /// Unconstrained optimizer vector at the optimum.
    pub theta_hat: Theta,
    /// Total log-likelihood `Σ_t ℓ_t`.
    pub loglik: f64,
    /// Per-step contributions `ℓ_t`.
    pub loglik_obs: Array1<f64>,
    /// Filtered probabilities, `n_eff × k`.
    pub filtered: Array2<f64>,
    /// One-step-ahead predicted probabilities, `n_eff × k`.
    pub predicted: Array2<f64>,
    /// Smoothed probabilities, `n_eff × k`.
    pub smoothed: Array2<f64>,
    /// Regime distribution before the first effective observation.
    pub initial: Array1<f64>,
    /// Conditional means `μ_{ij,t}`, `(n_eff, k_prev, k)`.
    pub cond_means: Array3<f64>,
    /// Expected duration of each regime, `1 / (1 − P[j][j])`.
    pub durations: Array1<f64>,
    /// Ergodic distribution of the fitted chain.
    pub stationary: Array1<f64>,
    /// Inference table, if requested and computable.
    pub std_errors: StdErrors,
    /// Optimizer termination status of the selected run.
    pub status: String,
    /// Optimizer iterations of the selected run.
    pub iterations: usize,
    /// Whether the selected run started from the multi-start search's best
    /// candidate rather than from the supplied start.
    pub from_search: bool,
    /// Number of observations supplied.
    pub n_obs: usize,
    /// Effective sample size `n_obs − order`.
    pub n_eff: usize,
}

impl MSFitResult {
    /// Number of free parameters (length of θ).
    pub fn n_params(&self) -> usize {
        self.theta_hat.len()
    }

    /// Akaike information criterion `−2ℓ + 2p`.
    pub fn aic(&self) -> f64 {
        -2.0 * self.loglik + 2.0 * self.n_params() as f64
    }

    /// Bayesian information criterion `−2ℓ + p ln n_eff`.
    pub fn bic(&self) -> f64 {
        -2.0 * self.loglik + self.n_params() as f64 * (self.n_eff as f64).ln()
    }

    /// Hannan–Quinn information criterion `−2ℓ + 2p ln ln n_eff`.
    pub fn hqic(&self) -> f64 {
        -2.0 * self.loglik + 2.0 * self.n_params() as f64 * (self.n_eff as f64).ln().ln()
    }

    /// Names of the constrained flat parameters.
    pub fn param_names(&self) -> Vec<String> {
        self.params.param_names()
    }

    /// Regime probabilities of the requested kind.
    pub fn probabilities(&self, kind: ProbabilityKind) -> &Array2<f64> {
        match kind {
            ProbabilityKind::Predicted => &self.predicted,
            ProbabilityKind::Filtered => &self.filtered,
            ProbabilityKind::Smoothed => &self.smoothed,
        }
    }

    /// Arg-max regime per effective time step.
    pub fn most_likely_regimes(&self, kind: ProbabilityKind) -> Vec<usize> {
        self.probabilities(kind)
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (j, &p)| {
                        if p > best.1 { (j, p) } else { best }
                    })
                    .0
            })
            .collect()
    }

    /// predict — probability-weighted in-sample conditional mean.
    ///
    /// `ŷ_t = Σ_j w_{t,j} Σ_i q_{i|j,t} μ_{ij,t}`, where `w` are the chosen
    /// probabilities. Static models have a single `i`. For AR(1) models the
    /// previous-regime weights are `q_{i|j,t} ∝ w_{t−1,i} P[i][j]`, with the
    /// initial distribution standing in for `w_{−1}`.
    pub fn predict(&self, kind: ProbabilityKind) -> Array1<f64> {
        let probs = self.probabilities(kind);
        let (n_eff, k_prev, k) = self.cond_means.dim();
        let p = &self.params.transition;
        let mut out = Array1::zeros(n_eff);
        let mut q = vec![0.0; k_prev];
        for t in 0..n_eff {
            let mut yhat = 0.0;
            for j in 0..k {
                let mean_j = if k_prev == 1 {
                    self.cond_means[[t, 0, j]]
                } else {
                    let mut total = 0.0;
                    for (i, qi) in q.iter_mut().enumerate() {
                        let prev = if t == 0 { self.initial[i] } else { probs[[t - 1, i]] };
                        *qi = prev * p[[i, j]];
                        total += *qi;
                    }
                    if total > 0.0 {
                        q.iter()
                            .enumerate()
                            .map(|(i, qi)| qi / total * self.cond_means[[t, i, j]])
                            .sum()
                    } else {
                        self.cond_means.slice(ndarray::s![t, .., j]).mean().unwrap_or(0.0)
                    }
                };
                yhat += probs[[t, j]] * mean_j;
            }
            out[t] = yhat;
        }
        out
    }

    /// Standard errors, when available.
    pub fn standard_errors(&self) -> Option<&Array1<f64>> {
        match &self.std_errors {
            StdErrors::Available { se, .. } => Some(se),
            StdErrors::Unavailable { .. } => None,
        }
    }

    /// Delta-method covariance of the flat parameters, when available.
    pub fn covariance(&self) -> Option<&Array2<f64>> {
        match &self.std_errors {
            StdErrors::Available { cov, .. } => Some(cov),
            StdErrors::Unavailable { .. } => None,
        }
    }

    /// z-statistics `estimate / se` against zero.
    pub fn z_values(&self) -> Option<Array1<f64>> {
        let se = self.standard_errors()?;
        Some(&self.params.to_flat() / se)
    }

    /// Two-sided normal p-values `2(1 − Φ(|z|))`.
    pub fn p_values(&self) -> Option<Array1<f64>> {
        let normal = Normal::standard();
        Some(self.z_values()?.mapv(|z| 2.0 * (1.0 - normal.cdf(z.abs()))))
    }

    /// Normal confidence intervals at level `1 − alpha`, one `[lower, upper]`
    /// row per flat parameter. `Ok(None)` when standard errors are
    /// unavailable.
    ///
    /// # Errors
    /// - [`MSError::InvalidAlpha`] unless `0 < alpha < 1`.
    pub fn conf_int(&self, alpha: f64) -> MSResult<Option<Array2<f64>>> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(MSError::InvalidAlpha { alpha });
        }
        let Some(se) = self.standard_errors() else {
            return Ok(None);
        };
        let crit = Normal::standard().inverse_cdf(1.0 - alpha / 2.0);
        let est = self.params.to_flat();
        let mut out = Array2::zeros((est.len(), 2));
        for (r, (&e, &s)) in est.iter().zip(se.iter()).enumerate() {
            out[[r, 0]] = e - crit * s;
            out[[r, 1]] = e + crit * s;
        }
        Ok(Some(out))
    }
}
