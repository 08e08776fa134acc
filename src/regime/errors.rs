//! Errors for Markov-switching regression models (data validation,
//! configuration checks, filter/smoother degeneracy, duration domain errors,
//! and optimizer failures).
//!
//! This module defines a model error type, [`MSError`], and a parameter error
//! type, [`ParamError`], shared by the estimator and the numerical core. Both
//! implement `Display`/`Error`; with the `python-bindings` feature they also
//! convert into `PyErr`.
//!
//! ## Conventions
//! - **Indices are 0-based** (match Rust/NumPy).
//! - Time indices reported by the filter and smoother are positions in the
//!   *effective* sample, which starts at observation `order`.
//! - Optimizer/backend errors are normalized to
//!   [`MSError::OptimizationFailed`] except for numerical degeneracy, which
//!   keeps its own variant.
use ndarray::Array1;

use crate::optimization::{
    errors::OptError, numerical_stability::transformations::LOG_VARIANCE_BOUND,
};
use crate::regime::core::params::MSParams;

/// Crate-wide result alias for regime-model operations that may produce [`MSError`].
pub type MSResult<T> = Result<T, MSError>;

/// Result alias for the parameter transform and transition-matrix checks.
pub type ParamResult<T> = Result<T, ParamError>;

/// Unified error type for Markov-switching regression.
///
/// Covers input/data validation, configuration checks, numerical degeneracy
/// of the forward/backward recursions, the duration domain error, and
/// estimation failures.
#[derive(Debug, Clone, PartialEq)]
pub enum MSError {
    // ---- Input/data validation ----
    /// Series is empty.
    EmptySeries,

    /// An observation is NaN/±inf.
    NonFiniteData { index: usize, value: f64 },

    /// Exogenous matrix was supplied with zero columns.
    EmptyExog,

    /// Exogenous matrix rows do not match the number of observations.
    ExogLengthMismatch { endog: usize, exog: usize },

    /// An exogenous regressor is NaN/±inf.
    NonFiniteExog { row: usize, col: usize, value: f64 },

    // ---- Configuration ----
    /// At least two regimes are required.
    InvalidRegimeCount { k_regimes: usize },

    /// Only autoregressive orders 0 and 1 are supported.
    InvalidOrder { order: usize },

    /// Exogenous column count differs from the model shape.
    ExogDimMismatch { expected: usize, actual: usize },

    /// Too few observations for the requested regimes and order.
    InsufficientData { n_obs: usize, required: usize },

    /// Parameters were built for a different model shape.
    ShapeMismatch,

    /// Known initial probabilities are malformed.
    InvalidInitialProbs { reason: &'static str },

    /// Multi-start perturbation scale must be finite and > 0.
    InvalidSearchScale { value: f64 },

    // ---- Recursions ----
    /// Every joint posterior weight underflowed, or a predicted probability
    /// vanished, at effective-sample index `t`.
    NumericalDegeneracy { t: usize, stage: &'static str },

    // ---- Durations ----
    /// Regime with self-transition probability one has no finite duration.
    AbsorbingRegime { regime: usize, prob: f64 },

    // ---- Estimation / optimizer ----
    /// Optimizer stopped without meeting its tolerances; best point attached.
    NonConvergence { status: String, loglik: f64, theta_hat: Array1<f64>, params: Box<MSParams> },

    /// Optimizer failed; include a human-readable status/reason.
    OptimizationFailed { status: String },

    /// Confidence-interval level must lie strictly inside (0, 1).
    InvalidAlpha { alpha: f64 },

    // ---- Simulation ----
    /// Simulation inputs are inconsistent.
    InvalidSimulation { reason: String },

    // ---- Parameters ----
    /// Wrapped parameter-transform failure.
    Param(ParamError),
}

impl std::error::Error for MSError {}

impl std::fmt::Display for MSError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Input/data validation ----
            MSError::EmptySeries => write!(f, "Input series is empty."),
            MSError::NonFiniteData { index, value } => {
                write!(f, "Observation at index {index} is non-finite: {value}")
            }
            MSError::EmptyExog => write!(f, "Exogenous matrix has no columns."),
            MSError::ExogLengthMismatch { endog, exog } => {
                write!(
                    f,
                    "Exogenous matrix has {exog} rows but the series has {endog} observations."
                )
            }
            MSError::NonFiniteExog { row, col, value } => {
                write!(f, "Exogenous regressor at ({row}, {col}) is non-finite: {value}")
            }
            // ---- Configuration ----
            MSError::InvalidRegimeCount { k_regimes } => {
                write!(f, "k_regimes must be at least 2; got {k_regimes}")
            }
            MSError::InvalidOrder { order } => {
                write!(f, "Autoregressive order must be 0 or 1; got {order}")
            }
            MSError::ExogDimMismatch { expected, actual } => {
                write!(f, "Exogenous column count mismatch: expected {expected}, got {actual}")
            }
            MSError::InsufficientData { n_obs, required } => {
                write!(f, "At least {required} observations are required; got {n_obs}")
            }
            MSError::ShapeMismatch => {
                write!(f, "Parameters were built for a different model shape.")
            }
            MSError::InvalidInitialProbs { reason } => {
                write!(f, "Invalid initial regime probabilities: {reason}")
            }
            MSError::InvalidSearchScale { value } => {
                write!(f, "Search perturbation scale must be finite and > 0; got {value}")
            }
            // ---- Recursions ----
            MSError::NumericalDegeneracy { t, stage } => {
                write!(f, "Numerical degeneracy in the {stage} at time index {t}.")
            }
            // ---- Durations ----
            MSError::AbsorbingRegime { regime, prob } => {
                write!(
                    f,
                    "Regime {regime} is absorbing (self-transition probability {prob}); \
                     expected duration is undefined."
                )
            }
            // ---- Estimation / optimizer ----
            MSError::NonConvergence { status, loglik, .. } => {
                write!(
                    f,
                    "Optimizer did not converge ({status}); best log-likelihood found: {loglik}"
                )
            }
            MSError::OptimizationFailed { status } => {
                write!(f, "Optimizer failed with status: {status}")
            }
            MSError::InvalidAlpha { alpha } => {
                write!(f, "alpha must lie strictly between 0 and 1; got {alpha}")
            }
            // ---- Simulation ----
            MSError::InvalidSimulation { reason } => {
                write!(f, "Invalid simulation input: {reason}")
            }
            // ---- Parameters ----
            MSError::Param(err) => write!(f, "{err}"),
        }
    }
}

impl From<ParamError> for MSError {
    fn from(err: ParamError) -> MSError {
        MSError::Param(err)
    }
}

/// Map optimizer errors back into the model error space at the estimator
/// boundary. Degeneracy raised by the filter inside an objective evaluation
/// keeps its identity.
impl From<OptError> for MSError {
    fn from(err: OptError) -> MSError {
        match err {
            OptError::NumericalDegeneracy { t } => {
                MSError::NumericalDegeneracy { t, stage: "filter" }
            }
            other => MSError::OptimizationFailed { status: other.to_string() },
        }
    }
}

/// Convert an [`MSError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl From<MSError> for pyo3::PyErr {
    fn from(err: MSError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

/// Errors specific to parameter construction and the θ ↔ constrained transform.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    /// Transition matrix must be k × k.
    TransitionShape { rows: usize, cols: usize, expected: usize },

    /// Transition entries must lie strictly inside (0, 1) for the transform,
    /// and inside [0, 1] for the duration calculator.
    InvalidTransitionProb { row: usize, col: usize, value: f64 },

    /// Transition rows must sum to one.
    TransitionRowSum { row: usize, sum: f64 },

    /// A coefficient block has the wrong length.
    LengthMismatch { name: &'static str, expected: usize, actual: usize },

    /// Coefficients must be finite.
    NonFiniteCoef { name: &'static str, index: usize, value: f64 },

    /// Variances must be finite and > 0; mapping to θ also requires
    /// `|ln σ²| ≤ LOG_VARIANCE_BOUND`.
    InvalidVariance { index: usize, value: f64 },

    /// Theta length mismatch for MSParams.
    ThetaLengthMismatch { expected: usize, actual: usize },

    /// Unconstrained optimization input must have finite values.
    InvalidThetaInput { index: usize, value: f64 },

    /// The stationary-distribution system `(I − Pᵀ + 𝟙𝟙ᵀ)π = 𝟙` is singular.
    SingularTransition,
}

impl std::error::Error for ParamError {}

impl std::fmt::Display for ParamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamError::TransitionShape { rows, cols, expected } => {
                write!(f, "Transition matrix must be {expected}x{expected}; got {rows}x{cols}")
            }
            ParamError::InvalidTransitionProb { row, col, value } => {
                write!(f, "Transition probability at ({row}, {col}) is out of range: {value}")
            }
            ParamError::TransitionRowSum { row, sum } => {
                write!(f, "Transition row {row} must sum to 1; got {sum}")
            }
            ParamError::LengthMismatch { name, expected, actual } => {
                write!(f, "{name} length mismatch: expected {expected}, got {actual}")
            }
            ParamError::NonFiniteCoef { name, index, value } => {
                write!(f, "{name} coefficient at index {index} must be finite, got {value}")
            }
            ParamError::InvalidVariance { index, value } => write!(
                f,
                "Variance at index {index} must be finite, > 0, \
                 and within exp(±{LOG_VARIANCE_BOUND}); got {value}"
            ),
            ParamError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Theta length mismatch: expected {expected}, got {actual}")
            }
            ParamError::InvalidThetaInput { index, value } => {
                write!(f, "Theta input at index {index} must be finite, got {value}")
            }
            ParamError::SingularTransition => {
                write!(f, "Transition matrix has no unique stationary distribution.")
            }
        }
    }
}

/// Convert a [`ParamError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl From<ParamError> for pyo3::PyErr {
    fn from(err: ParamError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
