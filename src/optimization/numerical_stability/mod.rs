//! numerical_stability — numerically robust transformations and covariance tools.
//!
//! Purpose
//! -------
//! Collect the guarded scalar and vector maps used to move between the
//! unconstrained optimizer space and Markov-switching parameter space, the
//! log-space reductions used by the regime filter, and the delta-method
//! helper used to report covariances on the parameter scale.
//!
//! Key behaviors
//! -------------
//! - Provide a baseline multinomial logit (`safe_softmax`) and its inverse
//!   for transition-matrix rows, with logits clamped so probabilities stay
//!   in the open interval (0, 1).
//! - Provide log-variance maps (`safe_variance`, `safe_variance_inv`) with a
//!   clamp that keeps variances positive and finite.
//! - Provide `log_sum_exp` for filter recursions carried out in log space.
//! - Expose `delta_method` to map θ-space covariance through a Jacobian.
//! - Centralize the bounds `TRANSITION_LOGIT_BOUND` and `LOG_VARIANCE_BOUND`
//!   and the `EIGEN_EPS` cutoff shared by the model and inference layers.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inverse maps assume validated inputs (probabilities in (0, 1), positive
//!   variances); validation lives in `regime::core::params`.
//! - `delta_method` assumes a symmetric θ-space covariance.
//!
//! Conventions
//! -----------
//! - All routines operate on `ndarray` types and write into caller-provided
//!   views where a vector output is produced.
//! - No logging, I/O, or global state.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`transformations`] cover simplex invariants under extreme
//!   logits, log-sum-exp tails, round trips, and `delta_method` against an
//!   explicit product.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    EIGEN_EPS, LOG_VARIANCE_BOUND, TRANSITION_LOGIT_BOUND, delta_method, log_sum_exp, safe_softmax,
    safe_softmax_inv, safe_variance, safe_variance_inv,
};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use markov_switching::optimization::numerical_stability::prelude::*;
//
// to import the main numerical-stability surface in a single line.

pub mod prelude {
    pub use super::transformations::{
        EIGEN_EPS, delta_method, log_sum_exp, safe_softmax, safe_softmax_inv, safe_variance,
        safe_variance_inv,
    };
}
