//! Executor wiring shared by both L-BFGS flavors.
//!
//! `run_lbfgs` sets `θ₀` and the iteration budget on an argmin executor,
//! optionally attaches the slog observer, runs it, and converts the final
//! state into an [`OptimOutcome`]. A run argmin aborts becomes a
//! not-converged outcome at the adapter's best recorded point.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Grad, LogLikelihood, MLEOptions, OptimOutcome, Theta,
        adapter::{ArgMinAdapter, BestPoint},
    },
};
#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
use argmin::core::{Executor, IterState, Solver, State};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

/// Argmin state type shared by every solver run here.
type LbfgsState = IterState<Theta, Grad, (), (), (), f64>;

/// Run an argmin solver on a log-likelihood problem.
///
/// # Type Parameters
/// - `F`: the model implementing [`LogLikelihood`].
/// - `S`: any argmin solver over `ArgMinAdapter<'a, F>` with the
///   `(Theta, Grad, f64)` iteration state, in practice one of the L-BFGS
///   builders in `builders`.
///
/// # Feature flags
/// With `obs_slog` enabled and `opts.verbose == true`, `ℓ(θ₀)` and the initial
/// gradient norm are printed once to stderr and a terminal slog observer logs
/// every iteration.
///
/// # Aborted runs
/// When argmin stops with an error (a line search rejecting a
/// finite-difference direction, a model error raised in `cost`) and the
/// adapter carries a tracker holding at least one finite evaluation, the run
/// is returned as [`OptimOutcome::aborted`] at that point.
///
/// # Errors
/// - Argmin runtime errors, converted through
///   `From<argmin::core::Error> for OptError`, when nothing was recorded.
/// - `MissingThetaHat` / `InvalidThetaHat` / `NonFiniteCost` when the final
///   state cannot be turned into a valid [`OptimOutcome`].
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: Solver<ArgMinAdapter<'a, F>, LbfgsState> + Send + 'static,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let best = problem.best;
    let max_iter = opts.tols.max_iter;
    #[cfg_attr(not(feature = "obs_slog"), allow(unused_mut))]
    let mut executor = Executor::new(problem, solver).configure(|state| {
        let state = state.param(theta0);
        match max_iter {
            Some(n) => state.max_iters(n as u64),
            None => state,
        }
    });
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        executor = executor.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }

    let mut state = match executor.run() {
        Ok(result) => result.state().clone(),
        Err(err) => return aborted_outcome(OptError::from(err), best),
    };
    outcome_from_state(&mut state)
}

fn aborted_outcome(err: OptError, best: Option<&BestPoint>) -> OptResult<OptimOutcome> {
    match best.and_then(|b| b.borrow_mut().take()) {
        Some((theta, value)) => OptimOutcome::aborted(theta, value, &err),
        None => Err(err),
    }
}

/// Convert the final argmin state into an [`OptimOutcome`] in log-likelihood
/// units (the best cost is negated).
fn outcome_from_state(state: &mut LbfgsState) -> OptResult<OptimOutcome> {
    let iterations = state.get_iter();
    let fn_evals = state.get_func_counts().clone();
    let termination = state.get_termination_status().clone();
    let grad = state.take_gradient();
    let value = -state.get_best_cost();
    OptimOutcome::new(state.take_best_param(), value, termination, iterations, fn_evals, grad)
}

#[cfg(feature = "obs_slog")]
fn log_initial_state<F>(theta0: &Theta, problem: &ArgMinAdapter<'_, F>) -> OptResult<()>
where
    F: LogLikelihood,
{
    let ll0 = -problem.cost(theta0)?;
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());
    eprintln!(
        "init: ell(theta0) = {:.6}{}",
        ll0,
        g0n.map(|n| format!(", ||grad|| = {n:.6}")).unwrap_or_default()
    );
    Ok(())
}
