//! models — user-facing Markov-switching estimators and fit results.
//!
//! Purpose
//! -------
//! Sit on top of `regime::core` and the generic log-likelihood optimizer to
//! provide maximum-likelihood estimation of Markov-switching dynamic
//! regressions.
//!
//! Key behaviors
//! -------------
//! - [`MarkovRegression`] implements [`LogLikelihood`] (average
//!   log-likelihood in θ-space) and exposes `fit`, `fit_from`, `loglik`,
//!   `filter`, and `smooth`.
//! - [`fit`] is the one-call entry point for static regressions with an
//!   optional seeded multi-start search.
//! - [`MSFitResult`] is the immutable outcome of a fit: parameters, regime
//!   probabilities, durations, information criteria, predictions, and the
//!   delta-method inference table ([`StdErrors`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - θ always has length `shape.theta_len()` and finite entries; enforced
//!   by `LogLikelihood::check`.
//! - A returned fit is always a converged one; non-convergence is an error
//!   carrying the best point found.
//!
//! [`LogLikelihood`]: crate::optimization::loglik_optimizer::LogLikelihood

pub mod markov_regression;
pub mod results;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::markov_regression::{MarkovRegression, fit};
pub use self::results::{MSFitResult, ProbabilityKind, StdErrors};

pub mod prelude {
    pub use super::markov_regression::{MarkovRegression, fit};
    pub use super::results::{MSFitResult, ProbabilityKind};
}
