//! Public API surface for log-likelihood maximization.
//!
//! - [`LogLikelihood`]: trait users implement for their model.
//! - [`MLEOptions`] and [`Tolerances`]: configuration for the optimizer.
//! - [`LineSearcher`]: choice of line search used by L-BFGS.
//! - [`OptimOutcome`]: normalized result returned by the high-level `maximize` API.
//!
//! Convention: we *maximize* a user log-likelihood `ℓ(θ)` by minimizing the cost
//! `c(θ) = -ℓ(θ)`. If an analytic gradient is provided, it should be the gradient
//! of the log-likelihood (`∇ℓ(θ)`); the adapter flips the sign as needed.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Cost, FnEvalMap, Grad, Theta,
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// User-implemented log-likelihood interface.
///
/// You maximize `ℓ(θ)`; internally we minimize the cost `c(θ) = -ℓ(θ)`.
/// If you provide an analytic gradient, return the gradient of the
/// log-likelihood `∇ℓ(θ)` (the adapter flips the sign to match the cost).
///
/// - `type Data`: per-model data carried into `value`/`grad`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `ℓ(θ)`.
///   - Errors: return a descriptive `OptError` for invalid inputs or model failures.
/// - `check(&Theta, &Data) -> OptResult<()>`: validation hook to reject
///   obviously invalid `θ`/`data` pairs. Called once before optimization.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic gradient `∇ℓ(θ)`.
///   If not implemented, robust finite differences are used automatically.
pub trait LogLikelihood {
    type Data: 'static;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Variants:
/// - `MoreThuente`: More–Thuente line search.
/// - `HagerZhang`: Hager–Zhang line search.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"MoreThuente"`, `"HagerZhang"`). Unknown names return
/// `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    /// Parse a line-search choice from a string (case-insensitive).
    ///
    /// Accepts:
    /// - `"MoreThuente"`
    /// - `"HagerZhang"`
    /// - Any case variant (e.g., `"morethuente"`, `"HAGERZHANG"`).
    ///
    /// Any other value returns `OptError::InvalidLineSearch` with a helpful message.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols: Tolerances` — numerical tolerances and iteration limits.
/// - `line_searcher: LineSearcher` — line-search algorithm used by L-BFGS.
/// - `verbose: bool` — if `true`, attaches an observer (behind the `obs_slog`
///   feature) and prints progress.
///
/// - `lbfgs_mem: Option<usize>` — L-BFGS history size; `None` uses
///   [`DEFAULT_LBFGS_MEM`](crate::optimization::loglik_optimizer::DEFAULT_LBFGS_MEM).
///
/// Constructor:
/// - `new(tols, line_searcher, verbose, lbfgs_mem) -> OptResult<Self>` — rejects
///   a zero L-BFGS memory; numeric tolerances are validated in `Tolerances::new`.
///
/// Default:
/// - `tols`: `tol_grad = 1e-6`, `tol_cost = 1e-12`, `max_iter = 500`
/// - `line_searcher`: `MoreThuente`
/// - `verbose`: `false`
/// - `lbfgs_mem`: `None`
#[derive(Debug, Clone, PartialEq)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl MLEOptions {
    /// Create a new set of optimizer options.
    ///
    /// This constructor does not mutate values; validation of numeric fields is
    /// performed inside [`Tolerances::new`].
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, line_searcher, verbose, lbfgs_mem })
    }

    /// Copy of these options with the iteration budget replaced.
    ///
    /// Used for short exploratory runs (e.g. ranking multi-start candidates)
    /// that share every other setting with the main fit.
    ///
    /// # Errors
    /// - `OptError::InvalidMaxIter` if `max_iter == 0`.
    pub fn with_max_iter(&self, max_iter: usize) -> OptResult<Self> {
        let tols = Tolerances::new(self.tols.tol_grad, self.tols.tol_cost, Some(max_iter))?;
        Ok(Self { tols, ..self.clone() })
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances {
                tol_grad: Some(DEFAULT_TOL_GRAD),
                tol_cost: Some(DEFAULT_TOL_COST),
                max_iter: Some(DEFAULT_MAX_ITER),
            },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in cost falls below this threshold.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** of the three must be provided
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - `OptError::InvalidMaxIter` if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Default gradient-norm tolerance for [`MLEOptions::default`].
pub const DEFAULT_TOL_GRAD: f64 = 1e-6;

/// Default cost-change tolerance for [`MLEOptions::default`].
pub const DEFAULT_TOL_COST: f64 = 1e-12;

/// Default iteration budget for [`MLEOptions::default`].
pub const DEFAULT_MAX_ITER: usize = 500;

/// Canonical result returned by `maximize`.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: best **log-likelihood** value `ℓ(θ)` (not the cost).
/// - `converged`: `true` if the solver terminated for a reason other than
///   exhausting its iteration budget (`NotTerminated` and `MaxItersReached`
///   both count as non-convergence).
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`.
/// - Keys follow argmin’s counters, e.g., cost_count, gradient_count, etc.
/// - `grad_norm`: norm of the last available gradient, if present.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// Performs:
    /// - `theta_hat` check via `validate_theta_hat` (present and all finite).
    /// - `value` check via `validate_value` (finite).
    /// - Maps `TerminationStatus` into `(converged, status)`; the iteration
    ///   budget running out is reported as not converged.
    /// - Computes `grad_norm` if a gradient was provided.
    ///
    /// # Errors
    /// - Propagates any validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, converged: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = match converged {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            TerminationStatus::Terminated(TerminationReason::MaxItersReached) => {
                (false, "Maximum number of iterations reached".to_string())
            }
            TerminationStatus::Terminated(reason) => (true, format!("{reason:?}")),
        };
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { theta_hat, value, converged, status, iterations, fn_evals, grad_norm })
    }

    /// Not-converged outcome for a run the solver aborted with `reason`.
    ///
    /// `theta_hat`/`value` are the best evaluation recorded before the abort.
    /// The solver state is gone, so `iterations` is 0 and `fn_evals` is empty.
    ///
    /// # Errors
    /// - Validation errors for a non-finite `theta_hat` or `value`.
    pub fn aborted(theta_hat: Theta, value: f64, reason: &OptError) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(Some(theta_hat))?;
        validate_value(value)?;
        Ok(Self {
            theta_hat,
            value,
            converged: false,
            status: format!("Aborted: {reason}"),
            iterations: 0,
            fn_evals: FnEvalMap::new(),
            grad_norm: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Tolerance validation and option construction.
    // - Line-search parsing.
    // - The mapping from argmin termination status to `converged`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Reject configurations that cannot terminate or are malformed.
    //
    // Given
    // -----
    // - No tolerances at all, a negative gradient tolerance, zero iterations,
    //   and zero L-BFGS memory.
    //
    // Expect
    // ------
    // - The matching OptError for each case.
    fn invalid_configurations_are_rejected() {
        // Arrange / Act
        let none = Tolerances::new(None, None, None);
        let neg = Tolerances::new(Some(-1.0), None, None);
        let zero_iter = Tolerances::new(None, None, Some(0));
        let tols = Tolerances::new(Some(1e-6), None, Some(10)).expect("valid tolerances");
        let zero_mem = MLEOptions::new(tols, LineSearcher::MoreThuente, false, Some(0));

        // Assert
        assert_eq!(none, Err(OptError::NoTolerancesProvided));
        assert!(matches!(neg, Err(OptError::InvalidTolGrad { .. })));
        assert!(matches!(zero_iter, Err(OptError::InvalidMaxIter { .. })));
        assert!(matches!(zero_mem, Err(OptError::InvalidLBFGSMem { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Line-search names parse case-insensitively and unknown names fail.
    //
    // Given
    // -----
    // - "hagerzhang", "MORETHUENTE", and "backtracking".
    //
    // Expect
    // ------
    // - The two known variants and an InvalidLineSearch error.
    fn line_searcher_parses_case_insensitively() {
        assert_eq!("hagerzhang".parse::<LineSearcher>(), Ok(LineSearcher::HagerZhang));
        assert_eq!("MORETHUENTE".parse::<LineSearcher>(), Ok(LineSearcher::MoreThuente));
        assert!(matches!(
            "backtracking".parse::<LineSearcher>(),
            Err(OptError::InvalidLineSearch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // `with_max_iter` only swaps the iteration budget.
    //
    // Given
    // -----
    // - Default options.
    //
    // Expect
    // ------
    // - max_iter replaced; tolerances and line search unchanged.
    fn with_max_iter_replaces_only_budget() {
        // Arrange
        let opts = MLEOptions::default();

        // Act
        let short = opts.with_max_iter(5).expect("positive budget");

        // Assert
        assert_eq!(short.tols.max_iter, Some(5));
        assert_eq!(short.tols.tol_grad, opts.tols.tol_grad);
        assert_eq!(short.tols.tol_cost, opts.tols.tol_cost);
        assert_eq!(short.line_searcher, opts.line_searcher);
    }

    #[test]
    // Purpose
    // -------
    // Exhausting the iteration budget must not count as convergence.
    //
    // Given
    // -----
    // - The same θ̂ reported with MaxItersReached and with SolverConverged.
    //
    // Expect
    // ------
    // - converged == false and true respectively.
    fn max_iters_reached_is_not_converged() {
        // Arrange
        let theta = Theta::from(vec![0.5, -0.5]);

        // Act
        let capped = OptimOutcome::new(
            Some(theta.clone()),
            -1.0,
            TerminationStatus::Terminated(TerminationReason::MaxItersReached),
            10,
            FnEvalMap::new(),
            None,
        )
        .expect("valid outcome");
        let done = OptimOutcome::new(
            Some(theta),
            -1.0,
            TerminationStatus::Terminated(TerminationReason::SolverConverged),
            10,
            FnEvalMap::new(),
            None,
        )
        .expect("valid outcome");

        // Assert
        assert!(!capped.converged);
        assert!(done.converged);
    }
}
