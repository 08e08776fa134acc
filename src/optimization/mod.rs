//! optimization — MLE stack, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimizer collaborator used by the regime models: an
//! Argmin-backed log-likelihood maximizer, numerically stable parameter
//! transforms, and a single error/result surface. Callers implement a
//! log-likelihood, choose tolerances, and obtain fitted parameters and
//! diagnostics without touching backend solver details.
//!
//! Key behaviors
//! -------------
//! - Expose a high-level API for **maximizing log-likelihoods** `ℓ(θ)`
//!   (`loglik_optimizer`), including configuration of solvers and stopping
//!   criteria.
//! - Supply shared numerical primitives (`numerical_stability`) for mapping
//!   unconstrained parameters into model space (softmax transition rows,
//!   log-variances), log-space reductions, and delta-method covariance
//!   propagation.
//! - Normalize configuration issues, numerical failures, model failures, and
//!   backend solver errors into a single enum (`errors::OptError`) with a
//!   common result alias (`OptResult<T>`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Optimizers operate in an unconstrained parameter space `θ` and assume
//!   that inputs are finite once validation has passed; invalid states are
//!   reported as `OptError`, not panics.
//! - Log-likelihood implementations treat domain violations (degenerate
//!   filter steps, malformed θ) as recoverable errors surfaced through the
//!   optimization layer.
//!
//! Conventions
//! -----------
//! - All solvers conceptually maximize a log-likelihood `ℓ(θ)` by minimizing
//!   an internal cost `c(θ) = -ℓ(θ)`; user-facing APIs and outcomes are
//!   expressed in terms of `ℓ`.
//! - Parameters, gradients, and Hessians are represented using `ndarray`-
//!   based aliases (`Theta`, `Grad`, `Hessian`).
//! - Public optimization entrypoints that can fail return `OptResult<T>`;
//!   callers never see raw Argmin errors.
//! - This module and its submodules avoid I/O; the only diagnostics are the
//!   optional `obs_slog` observer attached when `MLEOptions::verbose` is set.
//!
//! Downstream usage
//! ----------------
//! - `regime::models::MarkovRegression` implements `LogLikelihood` and calls
//!   `maximize` for both the multi-start partial runs and the final fit.
//! - `inference::hessian` uses `loglik_optimizer::finite_diff` for observed
//!   information and `numerical_stability::delta_method` for reporting.
//! - Front-ends import the curated surface via `optimization::prelude::*`.
//!
//! Testing notes
//! -------------
//! - Unit tests in the submodules focus on local concerns:
//!   - `loglik_optimizer`: solver wiring, tolerance handling, adapter sign
//!     conventions, and MLE on toy concave objectives.
//!   - `numerical_stability`: simplex invariants, tails, and delta-method
//!     consistency.
//!   - `errors`: conversions from backend/model errors into `OptError`.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use markov_switching::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
