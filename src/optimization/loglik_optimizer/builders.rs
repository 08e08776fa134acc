//! loglik_optimizer::builders — L-BFGS solver construction helpers.
//!
//! Purpose
//! -------
//! Build L-BFGS solvers for the log-likelihood optimizer with the crate's
//! numeric types and the tolerances carried by [`MLEOptions`], so callers can
//! request a configured solver without touching Argmin generics.
//!
//! Conventions
//! -----------
//! - The L-BFGS memory is `opts.lbfgs_mem` or [`DEFAULT_LBFGS_MEM`].
//! - Builders never set `θ₀` or `max_iters`; the runner (`run_lbfgs`) applies
//!   those at execution time.
//! - Argmin rejections of a tolerance surface as [`OptResult`] errors.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        traits::MLEOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, Theta,
        },
    },
};

/// build_optimizer_hager_zhang — L-BFGS with the Hager–Zhang line search.
///
/// Errors
/// ------
/// - `OptError` (via `From<argmin::core::Error>`) when Argmin rejects a
///   tolerance from `opts.tols`.
pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsHagerZhang::new(HagerZhangLS::new(), mem), opts)
}

/// build_optimizer_more_thuente — L-BFGS with the More–Thuente line search.
///
/// This is the default solver of the regime models.
///
/// Errors
/// ------
/// - `OptError` (via `From<argmin::core::Error>`) when Argmin rejects a
///   tolerance from `opts.tols`.
pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsMoreThuente::new(MoreThuenteLS::new(), mem), opts)
}

/// configure_lbfgs — apply the optional gradient and cost-change tolerances.
///
/// A `None` tolerance leaves Argmin's default in place. Generic over the
/// line-search type so both builders share it.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MLEOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}
