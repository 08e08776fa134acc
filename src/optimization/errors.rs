//! Unified error surface for the optimization layer.
//!
//! [`OptError`] normalizes optimizer configuration mistakes, finite-difference
//! failures, argmin backend errors, and model-side failures raised from inside
//! a [`LogLikelihood`](crate::optimization::loglik_optimizer::LogLikelihood)
//! evaluation. Model errors keep enough structure to be mapped back at the
//! estimator boundary (see `From<OptError> for MSError`).
use argmin::core::{ArgminError, Error};

use crate::regime::errors::{MSError, ParamError};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// Implies that FD should be used
    GradientNotImplemented,

    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch { expected: usize, found: usize },

    /// Gradient elements need to be finite
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    // ---- MLEOptions ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad { tol: f64, reason: &'static str },
    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost { tol: f64, reason: &'static str },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter { max_iter: usize, reason: &'static str },
    /// At least one tolerance must be provided.
    NoTolerancesProvided,

    /// Invalid line searcher name.
    InvalidLineSearch { name: String, reason: &'static str },

    /// lbfgs_mem needs to be at least 1.
    InvalidLBFGSMem { mem: usize, reason: &'static str },

    // ---- Cost function ----
    /// Cost function returned a non-finite value.
    NonFiniteCost { value: f64 },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    InvalidThetaHat { index: usize, value: f64, reason: &'static str },

    /// Theta hat is missing
    MissingThetaHat,

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter { text: String },
    /// Wrapper for argmin::NotImplemented
    NotImplemented { text: String },
    /// Wrapper for argmin::NotInitialized
    NotInitialized { text: String },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated { text: String },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound { text: String },
    /// Wrapper for argmin::PotentialBug
    PotentialBug { text: String },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError { text: String },
    /// Wrapper for other argmin::Error types
    BackendError { text: String },

    // ---- Finite Diffs ----
    /// Hessian matrix dimensions do not match parameter dimensions.
    HessianDimMismatch { expected: usize, found: (usize, usize) },

    /// Hessian values need to be finite.
    InvalidHessian { row: usize, col: usize, value: f64 },

    // ---- Model ----
    /// Filter or smoother hit a zero-probability observation at effective index `t`.
    NumericalDegeneracy { t: usize },

    /// Theta length does not match the model layout.
    ThetaLengthMismatch { expected: usize, actual: usize },

    /// Unconstrained optimization input must have finite values.
    InvalidThetaInput { index: usize, value: f64 },

    /// Any other model-side failure, carried as its display text.
    ModelError { text: String },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientNotImplemented => {
                write!(f, "Gradient optimization not implemented")
            }
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- MLEOptions ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost function change tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "No tolerances provided")
            }
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => {
                write!(f, "Missing estimated parameters (theta hat)")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            OptError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            OptError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            OptError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            OptError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            OptError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            OptError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Finite Diffs ----
            OptError::HessianDimMismatch { expected, found } => {
                write!(
                    f,
                    "Hessian dimension mismatch: expected ({expected}, {expected}), found {found:?}"
                )
            }
            OptError::InvalidHessian { row, col, value } => {
                write!(f, "Invalid Hessian at ({row}, {col}): {value}, must be finite")
            }

            // ---- Model ----
            OptError::NumericalDegeneracy { t } => {
                write!(f, "Numerical degeneracy at observation {t}: likelihood underflowed to zero")
            }
            OptError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Theta length mismatch: expected {expected}, actual {actual}")
            }
            OptError::InvalidThetaInput { index, value } => {
                write!(f, "Invalid theta input at index {index}: {value}, must be finite")
            }
            OptError::ModelError { text } => {
                write!(f, "Model error: {text}")
            }

            // ---- Fallback ----
            OptError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

impl From<MSError> for OptError {
    fn from(err: MSError) -> Self {
        match err {
            MSError::NumericalDegeneracy { t, .. } => OptError::NumericalDegeneracy { t },
            MSError::Param(param_err) => param_err.into(),
            other => OptError::ModelError { text: other.to_string() },
        }
    }
}

impl From<ParamError> for OptError {
    fn from(err: ParamError) -> Self {
        match err {
            ParamError::ThetaLengthMismatch { expected, actual } => {
                OptError::ThetaLengthMismatch { expected, actual }
            }
            ParamError::InvalidThetaInput { index, value } => {
                OptError::InvalidThetaInput { index, value }
            }
            other => OptError::ModelError { text: other.to_string() },
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<OptError> for pyo3::PyErr {
    fn from(err: OptError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Round-tripping an OptError through argmin's boxed error type.
    // - Mapping of argmin's own error variants.
    // - Conversions from model errors (MSError / ParamError).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // An OptError raised inside a cost function must survive the trip through
    // argmin::core::Error unchanged.
    //
    // Given
    // -----
    // - OptError::NumericalDegeneracy { t: 7 } boxed into argmin's Error.
    //
    // Expect
    // ------
    // - Conversion back yields the identical variant.
    fn opt_error_survives_argmin_boxing() {
        // Arrange
        let boxed: Error = OptError::NumericalDegeneracy { t: 7 }.into();

        // Act
        let back = OptError::from(boxed);

        // Assert
        assert_eq!(back, OptError::NumericalDegeneracy { t: 7 });
    }

    #[test]
    // Purpose
    // -------
    // Verify argmin's error variants map onto the matching wrappers.
    //
    // Given
    // -----
    // - ArgminError::ConditionViolated with a message.
    //
    // Expect
    // ------
    // - OptError::ConditionViolated carrying the same text.
    fn argmin_error_variants_are_mapped() {
        // Arrange
        let boxed: Error = ArgminError::ConditionViolated { text: "wolfe".to_string() }.into();

        // Act
        let mapped = OptError::from(boxed);

        // Assert
        assert_eq!(mapped, OptError::ConditionViolated { text: "wolfe".to_string() });
    }

    #[test]
    // Purpose
    // -------
    // Check that model errors keep their identity where the optimizer layer
    // has a dedicated variant and fall back to ModelError otherwise.
    //
    // Given
    // -----
    // - A degeneracy error, a θ-length ParamError, and an absorbing-regime error.
    //
    // Expect
    // ------
    // - NumericalDegeneracy, ThetaLengthMismatch, and ModelError respectively.
    fn model_errors_map_into_opt_errors() {
        // Arrange
        let degenerate = MSError::NumericalDegeneracy { t: 3, stage: "filter" };
        let length = MSError::Param(ParamError::ThetaLengthMismatch { expected: 5, actual: 4 });
        let absorbing = MSError::AbsorbingRegime { regime: 1, prob: 1.0 };

        // Act
        let a = OptError::from(degenerate);
        let b = OptError::from(length);
        let c = OptError::from(absorbing);

        // Assert
        assert_eq!(a, OptError::NumericalDegeneracy { t: 3 });
        assert_eq!(b, OptError::ThetaLengthMismatch { expected: 5, actual: 4 });
        assert!(matches!(c, OptError::ModelError { .. }));
    }
}
