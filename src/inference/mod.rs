//! inference — post-estimation uncertainty for fitted models.
//!
//! Purpose
//! -------
//! Compute the observed-information covariance of the unconstrained
//! estimates θ̂ from finite-difference Hessians. Model layers map this
//! covariance into their constrained parameter space (e.g. by the delta
//! method) and derive standard errors and test statistics from it.
//!
//! Key behaviors
//! -------------
//! - [`calc_covariance`] returns the eigen pseudoinverse `J⁺` of the
//!   observed information on the average log-likelihood scale.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are gradients of the **negative average** log-likelihood.
//! - Eigenvalues at or below `EIGEN_EPS` are truncated; no explicit inverse
//!   is formed.
//! - Failures are reported as `OptError` and never panic.
pub mod hessian;

pub use self::hessian::calc_covariance;
