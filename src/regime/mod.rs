//! regime — Markov-switching dynamic regression: core numerics, models, errors.
//!
//! Purpose
//! -------
//! Provide a complete Markov-switching regression layer: validated data and
//! shapes, the θ ↔ parameter transform, the regime-pair likelihood, the
//! Hamilton filter and Kim smoother, transition summaries, start values,
//! simulation, and the multi-start maximum-likelihood estimator.
//!
//! Key behaviors
//! -------------
//! - [`core`] holds the numerical building blocks.
//! - [`models`] holds [`MarkovRegression`], the one-call [`fit`], and the
//!   immutable [`MSFitResult`].
//! - [`errors`] centralizes [`MSError`] / [`ParamError`] and their result
//!   aliases.
//!
//! Conventions
//! -----------
//! - `P[i][j] = Pr(S_t = j | S_{t−1} = i)`; rows sum to one.
//! - θ layout: transition logits (row-major, last column baseline),
//!   intercepts, exogenous coefficients, AR coefficients, log-variances.
//! - Per-step outputs index the effective sample `t = 0..n_obs − order`.
//! - Indexing is 0-based throughout; regimes are labelled `0..k`.
//!
//! Downstream usage
//! ----------------
//! 1. Build [`MSData`] from `endog` (and optional `exog`).
//! 2. Build an [`MSShape`] and [`MSOptions`].
//! 3. `MarkovRegression::new(shape, options)?.fit(&data)?`, or call [`fit`]
//!    directly for the static case.
//! 4. Read probabilities, durations, and the inference table from the
//!    returned [`MSFitResult`].

pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    InitialProbs, MSData, MSOptions, MSParams, MSShape, SearchOptions, SimOpts, SimulatedPath,
    expected_durations, simulate,
};
pub use self::errors::{MSError, MSResult, ParamError, ParamResult};
pub use self::models::{MSFitResult, MarkovRegression, ProbabilityKind, StdErrors, fit};

pub mod prelude {
    pub use super::{
        InitialProbs, MSData, MSError, MSFitResult, MSOptions, MSParams, MSResult, MSShape,
        MarkovRegression, ParamError, ProbabilityKind, SearchOptions, SimOpts, StdErrors,
        expected_durations, fit, simulate,
    };
}
