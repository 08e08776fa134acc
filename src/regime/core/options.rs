//! Markov-switching options — configuration for estimation and simulation.
//!
//! Purpose
//! -------
//! Replace loose keyword flags with explicit, validated structures:
//!
//! - [`InitialProbs`] chooses the regime distribution that seeds the filter.
//! - [`SearchOptions`] configures the multi-start search (number of random
//!   starts, seed, perturbation scale, partial iterations per candidate).
//! - [`MSOptions`] bundles the above with the optimizer options and the
//!   standard-error switch.
//! - [`SimOpts`] configures the simulator.
//!
//! Invariants & assumptions
//! ------------------------
//! - `SearchOptions::scale` is finite and > 0 (checked in
//!   [`SearchOptions::new`]).
//! - `InitialProbs::Known` is checked against `k` when the filter is seeded
//!   (`filter::initial_probabilities`) and when a model is constructed.
//! - `MLEOptions` arrives already validated by its own constructor.
use ndarray::Array1;

use crate::{
    optimization::loglik_optimizer::MLEOptions,
    regime::errors::{MSError, MSResult},
};

/// Distribution of the regime *before* the first effective observation.
///
/// The first filter step predicts `Pr(S_0 = j) = Σ_i π_i P[i][j]`; with the
/// stationary choice this equals `π_j`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InitialProbs {
    /// Ergodic distribution of the current transition matrix.
    #[default]
    Stationary,
    /// `1/k` for every regime.
    Uniform,
    /// Fixed probability vector of length `k` summing to one.
    Known(Array1<f64>),
}

/// Default number of L-BFGS iterations applied to each search candidate.
pub const DEFAULT_PARTIAL_ITER: usize = 5;

/// Multi-start search configuration.
///
/// Fields
/// ------
/// - `reps`: number of random starts in addition to the default start.
/// - `seed`: RNG seed; `None` seeds from OS entropy.
/// - `scale`: standard deviation multiplier of the θ perturbations.
/// - `partial_iter`: L-BFGS iterations per candidate before ranking
///   (0 ranks candidates by their raw log-likelihood).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub reps: usize,
    pub seed: Option<u64>,
    pub scale: f64,
    pub partial_iter: usize,
}

impl SearchOptions {
    /// Construct validated search options.
    ///
    /// # Errors
    /// - [`MSError::InvalidSearchScale`] if `scale` is not finite and > 0.
    pub fn new(reps: usize, seed: Option<u64>, scale: f64, partial_iter: usize) -> MSResult<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(MSError::InvalidSearchScale { value: scale });
        }
        Ok(Self { reps, seed, scale, partial_iter })
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { reps: 0, seed: None, scale: 1.0, partial_iter: DEFAULT_PARTIAL_ITER }
    }
}

/// MSOptions — estimation-time configuration for Markov-switching models.
///
/// Fields
/// ------
/// - `initial_probs`: [`InitialProbs`] seeding the Hamilton filter.
/// - `search`: [`SearchOptions`] for the multi-start heuristic.
/// - `mle_opts`: [`MLEOptions`] for every L-BFGS run (partial and full).
/// - `std_errors`: compute the observed-information covariance after a
///   successful fit.
///
/// Default: stationary initial distribution, no search, default
/// `MLEOptions` (gradient tolerance 1e-6, cost tolerance 1e-12, 500
/// iterations, More–Thuente), standard errors on.
#[derive(Debug, Clone, PartialEq)]
pub struct MSOptions {
    pub initial_probs: InitialProbs,
    pub search: SearchOptions,
    pub mle_opts: MLEOptions,
    pub std_errors: bool,
}

impl MSOptions {
    /// Bundle already-validated components.
    pub fn new(
        initial_probs: InitialProbs, search: SearchOptions, mle_opts: MLEOptions, std_errors: bool,
    ) -> Self {
        Self { initial_probs, search, mle_opts, std_errors }
    }
}

impl Default for MSOptions {
    fn default() -> Self {
        Self {
            initial_probs: InitialProbs::default(),
            search: SearchOptions::default(),
            mle_opts: MLEOptions::default(),
            std_errors: true,
        }
    }
}

/// Simulation configuration.
///
/// - `seed`: RNG seed; `None` seeds from OS entropy.
/// - `burn_in`: number of leading draws discarded.
/// - `initial_regime`: regime of the first draw; `None` samples it from the
///   stationary distribution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimOpts {
    pub seed: Option<u64>,
    pub burn_in: usize,
    pub initial_regime: Option<usize>,
}

impl SimOpts {
    pub fn new(seed: Option<u64>, burn_in: usize, initial_regime: Option<usize>) -> Self {
        Self { seed, burn_in, initial_regime }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Documented defaults.
    // - Search-scale validation.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Defaults match the documented configuration.
    //
    // Given
    // -----
    // - MSOptions::default().
    //
    // Expect
    // ------
    // - Stationary start, zero reps, scale 1, five partial iterations,
    //   500 iterations, standard errors on.
    fn defaults_are_documented_values() {
        let opts = MSOptions::default();
        assert_eq!(opts.initial_probs, InitialProbs::Stationary);
        assert_eq!(opts.search.reps, 0);
        assert_eq!(opts.search.seed, None);
        assert_eq!(opts.search.scale, 1.0);
        assert_eq!(opts.search.partial_iter, DEFAULT_PARTIAL_ITER);
        assert_eq!(opts.mle_opts.tols.max_iter, Some(500));
        assert!(opts.std_errors);
    }

    #[test]
    // Purpose
    // -------
    // Non-positive or non-finite scales are rejected.
    //
    // Given
    // -----
    // - scale = 0, -1, NaN, and 0.5.
    //
    // Expect
    // ------
    // - Errors for the first three, Ok for 0.5.
    fn search_scale_is_validated() {
        assert_eq!(
            SearchOptions::new(5, Some(1), 0.0, 5),
            Err(MSError::InvalidSearchScale { value: 0.0 })
        );
        assert!(SearchOptions::new(5, Some(1), -1.0, 5).is_err());
        assert!(SearchOptions::new(5, Some(1), f64::NAN, 5).is_err());
        let ok = SearchOptions::new(5, Some(1), 0.5, 0).expect("valid scale");
        assert_eq!(ok.partial_iter, 0);
    }
}
