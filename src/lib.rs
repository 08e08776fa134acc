//! markov_switching — Markov-switching dynamic regression with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the Markov-switching estimator to Python via the `_markov_switching`
//! extension module. When the `python-bindings` feature is enabled, this module
//! defines the Python-facing classes and the `regime_models` submodule.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`regime`, `optimization`, `inference`)
//!   as the public crate surface.
//! - Define `#[pyclass]` wrappers for [`MarkovRegression`] and
//!   [`MSFitResult`] plus the `#[pymodule]` initializer.
//! - Register the `regime_models` submodule in `sys.modules` so that
//!   dot-notation imports work from Python.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner Rust modules; this file performs
//!   only FFI glue, input conversion, and error mapping.
//! - Python-visible types mirror the invariants of their Rust counterparts.
//!
//! Conventions
//! -----------
//! - Python-exposed classes live under `_markov_switching.regime_models`.
//! - Matrices cross the boundary as row-major `list[list[float]]`.
//! - Errors from core Rust code are converted to `PyErr` at the boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend on [`regime`] directly and can ignore the
//!   items guarded by the `python-bindings` feature.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in the inner modules and by
//!   the integration tests under `tests/`.
//!
//! [`MarkovRegression`]: crate::regime::models::markov_regression::MarkovRegression
//! [`MSFitResult`]: crate::regime::models::results::MSFitResult

pub mod inference;
pub mod optimization;
pub mod regime;
pub mod utils;

#[cfg(feature = "python-bindings")]
use ndarray::Array2;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    regime::{
        core::transition::expected_durations,
        models::{
            markov_regression::MarkovRegression,
            results::{MSFitResult, StdErrors},
        },
    },
    utils::{
        build_ms_model, extract_f64_matrix, extract_ms_data, extract_probability_kind,
        matrix_to_rows,
    },
};

/// PyMarkovRegression — Python-facing wrapper for [`MarkovRegression`].
///
/// Purpose
/// -------
/// Build a Markov-switching regression from Python keyword arguments and run
/// the multi-start estimator on array-like inputs.
///
/// Parameters
/// ----------
/// Constructed from Python via `MarkovRegression(k_regimes, ...)`:
/// - `k_regimes`: number of regimes (≥ 2).
/// - `n_exog`, `order`: number of exogenous regressors and AR order (0 or 1).
/// - `switching_exog`, `switching_ar`, `switching_variance`: which
///   coefficient blocks vary by regime.
/// - `search_reps`, `seed`, `search_scale`, `partial_iter`: multi-start
///   search configuration.
/// - `initial_probs`: `"stationary"`, `"uniform"`, or a probability vector.
/// - `std_errors`: compute standard errors after fitting.
/// - `tol_grad`, `tol_cost`, `max_iter`, `line_searcher`, `lbfgs_mem`,
///   `verbose`: optimizer configuration.
///
/// Notes
/// -----
/// - The model is stateless; `fit` returns a fresh results object.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "MarkovRegression", module = "markov_switching.regime_models")]
pub struct PyMarkovRegression {
    pub inner: MarkovRegression,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyMarkovRegression {
    #[new]
    #[pyo3(
        signature = (
            k_regimes,
            n_exog = 0,
            order = 0,
            switching_exog = true,
            switching_ar = true,
            switching_variance = false,
            search_reps = 0,
            seed = None,
            search_scale = 1.0,
            partial_iter = 5,
            initial_probs = None,
            std_errors = true,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            line_searcher = None,
            lbfgs_mem = None,
            verbose = false,
        ),
        text_signature = "(k_regimes, /, n_exog=0, order=0, switching_exog=True, \
                          switching_ar=True, switching_variance=False, search_reps=0, \
                          seed=None, search_scale=1.0, partial_iter=5, initial_probs=None, \
                          std_errors=True, tol_grad=None, tol_cost=None, max_iter=None, \
                          line_searcher=None, lbfgs_mem=None, verbose=False)"
    )]
    pub fn new<'py>(
        py: Python<'py>, k_regimes: usize, n_exog: usize, order: usize, switching_exog: bool,
        switching_ar: bool, switching_variance: bool, search_reps: usize, seed: Option<u64>,
        search_scale: f64, partial_iter: usize, initial_probs: Option<&Bound<'py, PyAny>>,
        std_errors: bool, tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
        line_searcher: Option<&str>, lbfgs_mem: Option<usize>, verbose: bool,
    ) -> PyResult<Self> {
        let inner = build_ms_model(
            py,
            k_regimes,
            n_exog,
            order,
            switching_exog,
            switching_ar,
            switching_variance,
            search_reps,
            seed,
            search_scale,
            partial_iter,
            initial_probs,
            std_errors,
            tol_grad,
            tol_cost,
            max_iter,
            line_searcher,
            lbfgs_mem,
            verbose,
        )?;
        Ok(PyMarkovRegression { inner })
    }

    #[pyo3(signature = (endog, exog = None), text_signature = "(self, endog, /, exog=None)")]
    pub fn fit<'py>(
        &self, py: Python<'py>, endog: &Bound<'py, PyAny>, exog: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<MarkovRegressionResults> {
        let data = extract_ms_data(py, endog, exog)?;
        let inner = self.inner.fit(&data)?;
        Ok(MarkovRegressionResults { inner })
    }

    #[getter]
    pub fn k_regimes(&self) -> usize {
        self.inner.shape.k_regimes
    }

    #[getter]
    pub fn order(&self) -> usize {
        self.inner.shape.order
    }
}

/// MarkovRegressionResults — read-only view of a fitted model for Python.
///
/// Instances are returned by `MarkovRegression.fit` and are not created
/// directly by user code. Probability and mean arrays are indexed by
/// effective time step.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "markov_switching.regime_models")]
pub struct MarkovRegressionResults {
    pub inner: MSFitResult,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl MarkovRegressionResults {
    #[getter]
    pub fn loglik(&self) -> f64 {
        self.inner.loglik
    }

    #[getter]
    pub fn loglik_obs(&self) -> Vec<f64> {
        self.inner.loglik_obs.to_vec()
    }

    #[getter]
    pub fn status(&self) -> String {
        self.inner.status.clone()
    }

    #[getter]
    pub fn iterations(&self) -> usize {
        self.inner.iterations
    }

    #[getter]
    pub fn from_search(&self) -> bool {
        self.inner.from_search
    }

    #[getter]
    pub fn n_obs(&self) -> usize {
        self.inner.n_obs
    }

    #[getter]
    pub fn n_eff(&self) -> usize {
        self.inner.n_eff
    }

    #[getter]
    pub fn theta_hat(&self) -> Vec<f64> {
        self.inner.theta_hat.to_vec()
    }

    #[getter]
    pub fn params(&self) -> Vec<f64> {
        self.inner.params.to_flat().to_vec()
    }

    #[getter]
    pub fn param_names(&self) -> Vec<String> {
        self.inner.param_names()
    }

    #[getter]
    pub fn transition(&self) -> Vec<Vec<f64>> {
        matrix_to_rows(&self.inner.params.transition)
    }

    #[getter]
    pub fn intercepts(&self) -> Vec<f64> {
        self.inner.params.intercepts.to_vec()
    }

    #[getter]
    pub fn exog_coefs(&self) -> Vec<Vec<f64>> {
        matrix_to_rows(&self.inner.params.exog)
    }

    #[getter]
    pub fn ar_coefs(&self) -> Vec<f64> {
        self.inner.params.ar.to_vec()
    }

    #[getter]
    pub fn variances(&self) -> Vec<f64> {
        self.inner.params.variances.to_vec()
    }

    #[getter]
    pub fn filtered_probabilities(&self) -> Vec<Vec<f64>> {
        matrix_to_rows(&self.inner.filtered)
    }

    #[getter]
    pub fn predicted_probabilities(&self) -> Vec<Vec<f64>> {
        matrix_to_rows(&self.inner.predicted)
    }

    #[getter]
    pub fn smoothed_probabilities(&self) -> Vec<Vec<f64>> {
        matrix_to_rows(&self.inner.smoothed)
    }

    #[getter]
    pub fn expected_durations(&self) -> Vec<f64> {
        self.inner.durations.to_vec()
    }

    #[getter]
    pub fn stationary(&self) -> Vec<f64> {
        self.inner.stationary.to_vec()
    }

    #[getter]
    pub fn aic(&self) -> f64 {
        self.inner.aic()
    }

    #[getter]
    pub fn bic(&self) -> f64 {
        self.inner.bic()
    }

    #[getter]
    pub fn hqic(&self) -> f64 {
        self.inner.hqic()
    }

    #[getter]
    pub fn bse(&self) -> Option<Vec<f64>> {
        self.inner.standard_errors().map(|se| se.to_vec())
    }

    #[getter]
    pub fn cov_params(&self) -> Option<Vec<Vec<f64>>> {
        self.inner.covariance().map(matrix_to_rows)
    }

    /// Reason standard errors could not be computed, if any.
    #[getter]
    pub fn std_errors_note(&self) -> Option<String> {
        match &self.inner.std_errors {
            StdErrors::Available { .. } => None,
            StdErrors::Unavailable { reason } => Some(reason.clone()),
        }
    }

    #[getter]
    pub fn pvalues(&self) -> Option<Vec<f64>> {
        self.inner.p_values().map(|p| p.to_vec())
    }

    #[pyo3(signature = (alpha = 0.05), text_signature = "(self, /, alpha=0.05)")]
    pub fn conf_int(&self, alpha: f64) -> PyResult<Option<Vec<Vec<f64>>>> {
        Ok(self.inner.conf_int(alpha)?.as_ref().map(matrix_to_rows))
    }

    #[pyo3(signature = (kind = None), text_signature = "(self, /, kind='smoothed')")]
    pub fn predict(&self, kind: Option<&str>) -> PyResult<Vec<f64>> {
        Ok(self.inner.predict(extract_probability_kind(kind)?).to_vec())
    }

    #[pyo3(signature = (kind = None), text_signature = "(self, /, kind='smoothed')")]
    pub fn most_likely_regimes(&self, kind: Option<&str>) -> PyResult<Vec<usize>> {
        Ok(self.inner.most_likely_regimes(extract_probability_kind(kind)?))
    }
}

/// Expected regime durations `1 / (1 − P[j][j])` of a row-stochastic matrix.
#[cfg(feature = "python-bindings")]
#[pyfunction(name = "expected_durations")]
#[pyo3(text_signature = "(transition, /)")]
fn py_expected_durations<'py>(transition: &Bound<'py, PyAny>) -> PyResult<Vec<f64>> {
    let p: Array2<f64> = extract_f64_matrix(transition)?;
    if p.nrows() != p.ncols() {
        return Err(PyValueError::new_err("transition must be a square matrix"));
    }
    Ok(expected_durations(p.view())?.to_vec())
}

/// _markov_switching — PyO3 module initializer for the Python extension.
///
/// Creates the `regime_models` submodule, attaches it to the parent, and
/// registers it in `sys.modules` so it is importable via a dotted path.
///
/// # Errors
/// - `PyErr` if creating the submodule or updating `sys.modules` fails.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _markov_switching<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let regime_models_mod = PyModule::new(_py, "regime_models")?;
    regime_models(_py, m, &regime_models_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("markov_switching.regime_models", regime_models_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn regime_models<'py>(
    _py: Python, markov_switching: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<PyMarkovRegression>()?;
    m.add_class::<MarkovRegressionResults>()?;
    m.add_function(wrap_pyfunction!(py_expected_durations, m)?)?;
    markov_switching.add_submodule(m)?;
    Ok(())
}
