//! loglik_optimizer::finite_diff — finite-difference gradient, Hessian, and
//! Jacobian helpers.
//!
//! Purpose
//! -------
//! Provide finite-difference derivatives around a parameter vector, together
//! with validation and symmetry cleanup, so the rest of the crate can request
//! derivatives without depending directly on the `finitediff` API.
//!
//! Key behaviors
//! -------------
//! - Forward-difference gradients with error capture and post-hoc validation
//!   via [`run_fd_diff`] (the fallback path of the Argmin adapter).
//! - Central-difference gradients of fallible objectives with a step sized
//!   for nesting inside a Hessian via [`central_gradient`].
//! - Central-difference Hessians of a gradient map, falling back to forward
//!   differences when validation fails, via [`compute_hessian`].
//! - Central-difference Jacobians of vector maps via [`compute_jacobian`],
//!   used for delta-method reporting.
//!
//! Invariants & assumptions
//! ------------------------
//! - Errors raised by the objective during differencing are treated as hard
//!   failures for the derivative being computed.
//! - Gradients, Hessians, and Jacobians returned from this module are finite
//!   and of the expected shape.
//!
//! Conventions
//! -----------
//! - Derivatives are taken with respect to the unconstrained vector `Theta`.
//! - Hessians are symmetrized in place before being returned.
//! - Jacobians are `m × n` with rows indexing outputs and columns indexing
//!   parameters.
//!
//! Testing notes
//! -------------
//! - Unit tests cover success and failure paths of every helper, including
//!   the central→forward Hessian fallback and error propagation from
//!   fallible objectives.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Grad, Theta,
        types::{Hessian, Jacobian},
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Relative step for [`central_gradient`]: `ε^{1/4}`, so rounding noise stays
/// small after a second differencing pass.
pub const NESTED_GRAD_STEP: f64 = 1.220_703_125e-4;

/// Relative step for [`compute_jacobian`]: `ε^{1/3}`.
pub const JACOBIAN_STEP: f64 = 6.055_454_452_393_343e-6;

/// run_fd_diff — forward-difference gradient of `func` with error capture.
///
/// The FD closure cannot return `Result`, so any error raised by `func` is
/// stored into `closure_err` and the closure returns `NaN`. This helper
/// clears the slot, runs `forward_diff`, returns the captured error if any,
/// and otherwise validates the gradient.
///
/// # Errors
/// - Any error captured during evaluation of `func`.
/// - `OptError::InvalidGradient` / `GradientDimMismatch` from validation.
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    let dim = theta.len();
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, dim)?;
    Ok(fd_grad)
}

/// central_gradient — central differences of a fallible scalar objective.
///
/// Purpose
/// -------
/// Differentiate `f` with per-coordinate step `h_i = NESTED_GRAD_STEP ·
/// max(1, |θ_i|)`. The larger-than-usual step keeps the gradient smooth
/// enough to be differenced a second time by [`compute_hessian`].
///
/// Errors
/// ------
/// - The first error returned by `f`.
/// - Validation errors if the result is not finite.
pub fn central_gradient<F: Fn(&Theta) -> OptResult<f64>>(f: &F, theta: &Theta) -> OptResult<Grad> {
    let n = theta.len();
    let mut grad = Grad::zeros(n);
    let mut x = theta.clone();
    for i in 0..n {
        let h = NESTED_GRAD_STEP * theta[i].abs().max(1.0);
        x[i] = theta[i] + h;
        let up = f(&x)?;
        x[i] = theta[i] - h;
        let down = f(&x)?;
        x[i] = theta[i];
        grad[i] = (up - down) / (2.0 * h);
    }
    validate_grad(&grad, n)?;
    Ok(grad)
}

/// compute_hessian — validated, symmetrized Hessian from a gradient map.
///
/// Central differences of `f` are tried first; if the result fails
/// validation the forward-difference Hessian is used instead.
///
/// # Errors
/// - `OptError::InvalidHessian` / `HessianDimMismatch` if neither
///   approximation is finite and square.
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let mut cent_hess = theta.central_hessian(f);
    match validate_hessian(&cent_hess, dim) {
        Ok(_) => {
            symmetrize_hess(&mut cent_hess);
            Ok(cent_hess)
        }
        Err(_) => {
            let mut forward_hess = theta.forward_hessian(f);
            validate_hessian(&forward_hess, dim)?;
            symmetrize_hess(&mut forward_hess);
            Ok(forward_hess)
        }
    }
}

/// compute_jacobian — central-difference Jacobian of a fallible vector map.
///
/// Returns the `m × n` matrix `J[r, i] = ∂g_r/∂θ_i`, where `m` is the output
/// length of `g` at `theta`.
///
/// # Errors
/// - The first error returned by `g`.
/// - `OptError::InvalidHessian` if an entry is not finite (the Jacobian shares
///   the Hessian's finiteness check).
/// - `OptError::GradientDimMismatch` if `g` changes output length.
pub fn compute_jacobian<G: Fn(&Theta) -> OptResult<Grad>>(
    g: &G, theta: &Theta,
) -> OptResult<Jacobian> {
    let n = theta.len();
    let m = g(theta)?.len();
    let mut jac = Jacobian::zeros((m, n));
    let mut x = theta.clone();
    for i in 0..n {
        let h = JACOBIAN_STEP * theta[i].abs().max(1.0);
        x[i] = theta[i] + h;
        let up = g(&x)?;
        x[i] = theta[i] - h;
        let down = g(&x)?;
        x[i] = theta[i];
        if up.len() != m || down.len() != m {
            return Err(OptError::GradientDimMismatch { expected: m, found: up.len() });
        }
        for r in 0..m {
            let value = (up[r] - down[r]) / (2.0 * h);
            if !value.is_finite() {
                return Err(OptError::InvalidHessian { row: r, col: i, value });
            }
            jac[[r, i]] = value;
        }
    }
    Ok(jac)
}

// ---- Helper methods ----

fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}
