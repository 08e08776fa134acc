//! core — data, parameters, and recursions for Markov-switching regression.
//!
//! Purpose
//! -------
//! Collect the numerical building blocks of a Markov-switching dynamic
//! regression: validated data containers, model shapes and θ layouts, the
//! constrained ↔ unconstrained parameter transform, the Gaussian
//! regime-pair likelihood, the Hamilton filter, the Kim smoother, transition
//! matrix utilities (stationary distribution, expected durations), start
//! values, and a simulator. The estimator in `regime::models` builds on
//! these primitives.
//!
//! Key behaviors
//! -------------
//! - [`MSData`] and [`MSShape`] validate inputs and fix the θ layout
//!   ([`ThetaLayout`]).
//! - [`MSParams`] maps θ to transition probabilities (row softmax, last
//!   column baseline), coefficients, and variances (`exp` of log-variance)
//!   and back.
//! - [`log_densities`] builds the `(n_eff, k_prev, k)` log-density tensor;
//!   [`hamilton_filter`] / [`hamilton_loglik`] run the forward recursion in
//!   log space and [`kim_smoother`] runs the backward pass.
//! - [`expected_durations`] and [`stationary_distribution`] summarize the
//!   transition matrix.
//! - [`default_start`] and [`search_candidates`] provide start values for
//!   the multi-start estimator; [`simulate`] draws synthetic paths.
//!
//! Invariants & assumptions
//! ------------------------
//! - Transition matrices are row-stochastic with
//!   `P[i][j] = Pr(S_t = j | S_{t−1} = i)`.
//! - Every θ maps to a valid parameter set: logits are clamped to
//!   `±TRANSITION_LOGIT_BOUND` and log-variances to `±LOG_VARIANCE_BOUND`
//!   before exponentiation.
//! - Effective row `t` of every per-step array is observation `t + order`.
//!
//! Conventions
//! -----------
//! - Indexing is 0-based; regimes are labelled `0..k`.
//! - This module performs no logging. Errors are [`MSResult`] /
//!   [`ParamResult`]; panics are reserved for internal shape mismatches.
//!
//! Testing notes
//! -------------
//! - Filter and smoother are checked against brute-force enumeration of
//!   regime paths on small problems.
//! - Transform round trips, duration closed forms, and log-density values
//!   (against `statrs`) are unit-tested in their submodules.
//!
//! [`MSResult`]: crate::regime::errors::MSResult
//! [`ParamResult`]: crate::regime::errors::ParamResult

pub mod data;
pub mod filter;
pub mod init;
pub mod likelihood;
pub mod options;
pub mod params;
pub mod shape;
pub mod simulate;
pub mod smoother;
pub mod transition;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::data::MSData;
pub use self::filter::{FilterOutput, hamilton_filter, hamilton_loglik, initial_probabilities};
pub use self::init::{default_start, perturbation_scales, search_candidates};
pub use self::likelihood::{conditional_means, log_densities};
pub use self::options::{InitialProbs, MSOptions, SearchOptions, SimOpts};
pub use self::params::{MSParams, flat_from_theta};
pub use self::shape::{MSShape, ThetaLayout};
pub use self::simulate::{SimulatedPath, simulate};
pub use self::smoother::kim_smoother;
pub use self::transition::{expected_durations, stationary_distribution};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::data::MSData;
    pub use super::filter::hamilton_filter;
    pub use super::options::{InitialProbs, MSOptions, SearchOptions, SimOpts};
    pub use super::params::MSParams;
    pub use super::shape::MSShape;
    pub use super::simulate::simulate;
    pub use super::smoother::kim_smoother;
    pub use super::transition::expected_durations;
}
