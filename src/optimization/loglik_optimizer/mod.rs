//! loglik_optimizer — MLE-friendly, argmin-powered log-likelihood optimizer.
//!
//! Purpose
//! -------
//! Provide a high-level, Argmin-backed optimization layer for **maximizing
//! log-likelihoods** `ℓ(θ)`. Callers implement a single trait,
//! [`LogLikelihood`], and invoke [`maximize`] to run L-BFGS with a
//! configurable line search, tolerances, and finite-difference fallbacks.
//!
//! Key behaviors
//! -------------
//! - Convert user-supplied log-likelihoods `ℓ(θ)` into Argmin-compatible
//!   cost functions `c(θ) = -ℓ(θ)` via [`adapter::ArgMinAdapter`].
//! - Expose a single, user-facing entrypoint [`maximize`] that:
//!   - validates the initial guess with [`LogLikelihood::check`],
//!   - selects an L-BFGS solver via [`builders`] based on [`LineSearcher`],
//!   - executes the solver via [`run::run_lbfgs`], and
//!   - normalizes results into an [`OptimOutcome`].
//! - Provide finite-difference helpers in [`finite_diff`] for gradients and
//!   Hessians when analytic derivatives are missing, with post-hoc
//!   validation and error capture.
//! - Centralize optimizer configuration ([`Tolerances`], [`MLEOptions`]) and
//!   validation logic ([`validation`]) so downstream code can assume sane,
//!   finite inputs.
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer **always maximizes** a log-likelihood `ℓ(θ)` by minimizing
//!   a cost `c(θ) = -ℓ(θ)`; user code implements `ℓ(θ)` and `∇ℓ(θ)`
//!   (when available), **never** the cost directly.
//! - [`LogLikelihood::value`] and [`LogLikelihood::grad`] must treat invalid
//!   inputs as recoverable [`OptError`](crate::optimization::errors::OptError)
//!   values, not panics.
//! - Configuration types are validated on construction and are treated as
//!   internally consistent by the solver layer.
//!
//! Conventions
//! -----------
//! - Parameters live in an unconstrained optimizer space as [`Theta`]
//!   (`Array1<f64>`). Any mapping from constrained → unconstrained space
//!   happens in the model layer.
//! - [`OptimOutcome::converged`] is `false` both when the solver never
//!   terminated and when it stopped on the iteration budget; callers decide
//!   how to surface that.
//! - Errors bubble up as `OptResult<T>`; this module never intentionally
//!   panics or uses `unsafe`.
//!
//! Downstream usage
//! ----------------
//! - `MarkovRegression` implements [`LogLikelihood`] (no analytic gradient,
//!   so the adapter's finite-difference path is used) and calls [`maximize`].
//! - `inference::hessian` calls [`finite_diff::compute_hessian`] with a
//!   gradient built by [`finite_diff::central_gradient`].
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover sign conventions in [`adapter`], solver
//!   construction in [`builders`], finite-difference and validation behavior,
//!   configuration invariants in [`traits`], and an end-to-end [`maximize`]
//!   run on a concave quadratic in [`api`].

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Hessian, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use markov_switching::optimization::loglik_optimizer::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
