//! High-level entry point for maximizing a user-provided `LogLikelihood`.
//!
//! Picks an L-BFGS solver for the configured line search, wraps the model in
//! an `ArgMinAdapter` (which *minimizes* `-ℓ(θ)`) that tracks its best
//! evaluation, and hands both to `run_lbfgs`.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::{ArgMinAdapter, BestPoint},
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, LogLikelihood, MLEOptions},
    },
};

/// Maximize a log-likelihood `ℓ(θ)` with L-BFGS.
///
/// # Behavior
/// - Validates the initial guess via `f.check(&theta0, data)`.
/// - Builds an L-BFGS solver with the **More–Thuente** or **Hager–Zhang**
///   line search according to `opts.line_searcher`.
/// - Runs the solver through `run_lbfgs` and returns its [`OptimOutcome`].
/// - If the solver aborts after at least one finite evaluation, returns a
///   not-converged outcome at the best point evaluated, with a status starting
///   with `"Aborted: "` that carries the error.
///
/// # Errors
/// - Propagates any error from `f.check`.
/// - Propagates builder errors (tolerances rejected by argmin).
/// - Propagates runtime errors raised before any finite evaluation, including
///   model errors from `value`, which keep their `OptError` identity.
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use markov_switching::optimization::errors::OptResult;
/// use markov_switching::optimization::loglik_optimizer::{
///     LogLikelihood, MLEOptions, Theta, maximize,
/// };
///
/// struct Quadratic;
/// impl LogLikelihood for Quadratic {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(-theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = maximize(&Quadratic, array![0.1, -0.2, 0.3], &(), &MLEOptions::default())?;
/// println!("θ̂ = {:?}", out.theta_hat);
/// # Ok::<(), markov_switching::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let best = BestPoint::default();
    let problem = ArgMinAdapter::with_tracker(f, data, &best);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}
