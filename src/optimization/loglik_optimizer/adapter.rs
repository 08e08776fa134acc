//! Adapter that exposes a user `LogLikelihood` as an `argmin` problem.
//!
//! A *maximization* of `ℓ(θ)` becomes a *minimization* of the cost
//! `c(θ) = -ℓ(θ)`. Analytic gradients (if provided) are negated. Without one,
//! the **cost** closure is finite-differenced, so that branch needs no sign flip.
//! Regime models never provide an analytic gradient, so the finite-difference
//! branch is the one exercised in practice.
//!
//! An adapter built with [`ArgMinAdapter::with_tracker`] also records the best
//! finite `ℓ(θ)` it has evaluated, so a run that argmin aborts can still
//! report where it got to.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        finite_diff::run_fd_diff,
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Best finite log-likelihood evaluated so far and the θ that produced it.
pub type BestPoint = RefCell<Option<(Theta, f64)>>;

/// Bridges a user `LogLikelihood` to `argmin`'s `CostFunction` and `Gradient`.
///
/// - `CostFunction::cost` returns `-ℓ(θ)`.
/// - `Gradient::gradient` returns `-∇ℓ(θ)` for analytic gradients, or a
///   finite-difference gradient of the cost otherwise.
/// - `best`, when present, is updated on every finite cost evaluation,
///   including the ones made while finite-differencing.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
    pub best: Option<&'a BestPoint>,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    /// Construct a new adapter over a user `LogLikelihood` and its data.
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data, best: None }
    }

    /// Construct an adapter that records its best evaluation in `best`.
    pub fn with_tracker(f: &'a F, data: &'a F::Data, best: &'a BestPoint) -> Self {
        Self { f, data, best: Some(best) }
    }

    fn record(&self, theta: &Theta, value: f64) {
        let Some(best) = self.best else {
            return;
        };
        let mut slot = best.borrow_mut();
        if slot.as_ref().is_none_or(|(_, v)| value > *v) {
            *slot = Some((theta.clone(), value));
        }
    }

    /// Finite-difference gradient of the cost with error capture.
    ///
    /// Central differences first. If any cost evaluation failed, or the
    /// central gradient is not finite, one forward-difference retry is made
    /// through [`run_fd_diff`], which reports the captured error if the retry
    /// fails as well.
    fn fd_gradient(&self, theta: &Theta) -> Result<Grad, Error> {
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let cost_func = |theta: &Theta| -> f64 {
            match self.cost(theta) {
                Ok(val) => val,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    f64::NAN
                }
            }
        };
        let central = theta.central_diff(&cost_func);
        if closure_err.borrow().is_none() && validate_grad(&central, theta.len()).is_ok() {
            return Ok(central);
        }
        Ok(run_fd_diff(theta, &cost_func, &closure_err)?)
    }
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the cost `c(θ) = -ℓ(θ)`.
    ///
    /// # Errors
    /// - Propagates any `OptError` from the user's `value`.
    /// - `OptError::NonFiniteCost` if `ℓ(θ)` is not finite.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        self.record(theta, output);
        Ok(-output)
    }
}

impl<'a, F: LogLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate the gradient of the cost at `θ`.
    ///
    /// # Errors
    /// - Propagates user errors from `grad` other than `GradientNotImplemented`.
    /// - Propagates cost-evaluation errors raised during finite differencing.
    /// - Returns validation errors for wrong dimensions or non-finite entries.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, theta.len())?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => self.fd_gradient(theta),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Sign conventions of the cost and of analytic / FD gradients.
    // - Rejection of non-finite log-likelihood values.
    // - Best-point tracking across cost evaluations.
    //
    // They intentionally DO NOT cover:
    // - Solver execution (see `api` tests).
    // -------------------------------------------------------------------------

    struct Concave {
        analytic: bool,
    }

    impl LogLikelihood for Concave {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
            Ok(-(theta[0] - 1.0).powi(2) - 2.0 * theta[1].powi(2))
        }

        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }

        fn grad(&self, theta: &Theta, _: &()) -> OptResult<Grad> {
            if self.analytic {
                Ok(array![-2.0 * (theta[0] - 1.0), -4.0 * theta[1]])
            } else {
                Err(OptError::GradientNotImplemented)
            }
        }
    }

    struct Broken;

    impl LogLikelihood for Broken {
        type Data = ();

        fn value(&self, _: &Theta, _: &()) -> OptResult<f64> {
            Ok(f64::NAN)
        }

        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // Cost is the negated log-likelihood and both gradient paths agree on the
    // cost gradient.
    //
    // Given
    // -----
    // - ℓ(θ) = -(θ₀ - 1)² - 2θ₁² at θ = (0, 1).
    //
    // Expect
    // ------
    // - cost = 3; ∇c = (-2, 4) from both the analytic and FD paths.
    fn cost_and_gradients_follow_sign_convention() {
        // Arrange
        let theta = array![0.0_f64, 1.0];
        let data = ();
        let analytic = Concave { analytic: true };
        let numeric = Concave { analytic: false };

        // Act
        let cost = ArgMinAdapter::new(&analytic, &data).cost(&theta).expect("finite cost");
        let g_a = ArgMinAdapter::new(&analytic, &data).gradient(&theta).expect("analytic grad");
        let g_n = ArgMinAdapter::new(&numeric, &data).gradient(&theta).expect("fd grad");

        // Assert
        assert_relative_eq!(cost, 3.0, epsilon = 1e-12);
        assert_relative_eq!(g_a[0], -2.0, epsilon = 1e-12);
        assert_relative_eq!(g_a[1], 4.0, epsilon = 1e-12);
        assert_relative_eq!(g_n[0], -2.0, epsilon = 1e-5);
        assert_relative_eq!(g_n[1], 4.0, epsilon = 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // A NaN log-likelihood must surface as NonFiniteCost.
    //
    // Given
    // -----
    // - A model whose value is always NaN.
    //
    // Expect
    // ------
    // - cost() fails and converts back to OptError::NonFiniteCost.
    fn non_finite_value_is_rejected() {
        // Arrange
        let data = ();
        let adapter = ArgMinAdapter::new(&Broken, &data);

        // Act
        let err = adapter.cost(&array![0.0_f64]).expect_err("NaN must be rejected");

        // Assert
        assert!(matches!(OptError::from(err), OptError::NonFiniteCost { .. }));
    }

    #[test]
    // Purpose
    // -------
    // A tracking adapter keeps the highest finite log-likelihood it has
    // evaluated and ignores failed evaluations.
    //
    // Given
    // -----
    // - ℓ(θ) = -(θ₀ - 1)² - 2θ₁² evaluated at (0, 1), (1, 0), (3, 3).
    // - A NaN model evaluated through a second tracker.
    //
    // Expect
    // ------
    // - The tracker holds ((1, 0), 0.0); the NaN tracker stays empty.
    fn tracker_keeps_best_finite_evaluation() {
        // Arrange
        let data = ();
        let model = Concave { analytic: false };
        let best = BestPoint::default();
        let empty = BestPoint::default();
        let adapter = ArgMinAdapter::with_tracker(&model, &data, &best);
        let broken = ArgMinAdapter::with_tracker(&Broken, &data, &empty);

        // Act
        for theta in [array![0.0, 1.0], array![1.0, 0.0], array![3.0, 3.0]] {
            adapter.cost(&theta).expect("finite cost");
        }
        let _ = broken.cost(&array![0.0]);

        // Assert
        let (theta, value) = best.borrow().clone().expect("a point was recorded");
        assert_eq!(theta, array![1.0, 0.0]);
        assert_relative_eq!(value, 0.0, epsilon = 1e-12);
        assert!(empty.borrow().is_none());
    }
}
