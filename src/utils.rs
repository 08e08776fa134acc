#[cfg(feature = "python-bindings")]
use ndarray::{Array1, Array2};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    optimization::loglik_optimizer::traits::{LineSearcher, MLEOptions, Tolerances},
    regime::{
        core::{
            data::MSData,
            options::{InitialProbs, MSOptions, SearchOptions},
            shape::MSShape,
        },
        models::{markov_regression::MarkovRegression, results::ProbabilityKind},
    },
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
    PyReadonlyArray2,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Copy a 2-D numpy array, pandas DataFrame, or nested sequence into an
/// owned `T × m` matrix.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix<'py>(raw_data: &Bound<'py, PyAny>) -> PyResult<Array2<f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro.as_array().to_owned());
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (), None) {
        if let Ok(frame_ro) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(frame_ro.as_array().to_owned());
        }
    }

    let rows: Vec<Vec<f64>> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 2-D numpy.ndarray, pandas.DataFrame, or nested sequence of float64",
        )
    })?;
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != n_cols) {
        return Err(PyValueError::new_err("exog rows must all have the same length"));
    }
    Array2::from_shape_vec((n_rows, n_cols), rows.into_iter().flatten().collect())
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Build validated [`MSData`] from Python `endog` and optional `exog`.
#[cfg(feature = "python-bindings")]
pub fn extract_ms_data<'py>(
    py: Python<'py>, endog: &Bound<'py, PyAny>, exog: Option<&Bound<'py, PyAny>>,
) -> PyResult<MSData> {
    let endog_arr = extract_f64_array(py, endog)?;
    let endog_slice = endog_arr.as_slice().map_err(|_| {
        PyValueError::new_err("endog must be a 1-D contiguous float64 array or sequence")
    })?;
    let endog_vec = Array1::from(endog_slice.to_vec());
    let exog_mat = exog.map(extract_f64_matrix).transpose()?;
    Ok(MSData::new(endog_vec, exog_mat)?)
}

#[cfg(feature = "python-bindings")]
pub fn build_ms_model<'py>(
    py: Python<'py>, k_regimes: usize, n_exog: usize, order: usize, switching_exog: bool,
    switching_ar: bool, switching_variance: bool, search_reps: usize, seed: Option<u64>,
    search_scale: f64, partial_iter: usize, initial_probs: Option<&Bound<'py, PyAny>>,
    std_errors: bool, tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>, verbose: bool,
) -> PyResult<MarkovRegression> {
    let shape =
        MSShape::new(k_regimes, n_exog, order, switching_exog, switching_ar, switching_variance)?;
    let search = SearchOptions::new(search_reps, seed, search_scale, partial_iter)?;
    let init = extract_initial_probs(py, initial_probs)?;
    let mle_opts =
        extract_mle_opts(tol_grad, tol_cost, max_iter, line_searcher, lbfgs_mem, verbose)?;
    let options = MSOptions::new(init, search, mle_opts, std_errors);
    Ok(MarkovRegression::new(shape, options)?)
}

/// `"stationary"`, `"uniform"`, or an array-like of known probabilities.
#[cfg(feature = "python-bindings")]
fn extract_initial_probs<'py>(
    py: Python<'py>, raw: Option<&Bound<'py, PyAny>>,
) -> PyResult<InitialProbs> {
    let Some(raw) = raw else {
        return Ok(InitialProbs::Stationary);
    };
    if let Ok(name) = raw.extract::<String>() {
        return match name.to_lowercase().as_str() {
            "stationary" => Ok(InitialProbs::Stationary),
            "uniform" => Ok(InitialProbs::Uniform),
            other => Err(PyValueError::new_err(format!(
                "invalid initial_probs {other:?} (expected 'stationary', 'uniform', or an array)"
            ))),
        };
    }
    let arr = extract_f64_array(py, raw)?;
    let slice = arr.as_slice().map_err(|_| {
        PyValueError::new_err("initial_probs must be a 1-D contiguous float64 array or sequence")
    })?;
    Ok(InitialProbs::Known(Array1::from(slice.to_vec())))
}

#[cfg(feature = "python-bindings")]
fn extract_mle_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>, verbose: bool,
) -> PyResult<MLEOptions> {
    use std::str::FromStr;

    let defaults = MLEOptions::default();
    let tols = match (tol_grad, tol_cost, max_iter) {
        (None, None, None) => defaults.tols,
        _ => Tolerances::new(tol_grad, tol_cost, max_iter)?,
    };

    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name)?,
        None => defaults.line_searcher,
    };

    Ok(MLEOptions::new(tols, ls, verbose, lbfgs_mem)?)
}

/// Parse `"predicted"`, `"filtered"`, or `"smoothed"` (case-insensitive).
#[cfg(feature = "python-bindings")]
pub fn extract_probability_kind(kind: Option<&str>) -> PyResult<ProbabilityKind> {
    match kind.map(str::to_lowercase).as_deref() {
        None | Some("smoothed") => Ok(ProbabilityKind::Smoothed),
        Some("filtered") => Ok(ProbabilityKind::Filtered),
        Some("predicted") => Ok(ProbabilityKind::Predicted),
        Some(other) => Err(PyValueError::new_err(format!(
            "invalid kind {other:?} (expected 'predicted', 'filtered', or 'smoothed')"
        ))),
    }
}

/// Convert an `n × m` matrix into row-major nested vectors.
#[cfg(feature = "python-bindings")]
pub fn matrix_to_rows(mat: &Array2<f64>) -> Vec<Vec<f64>> {
    mat.rows().into_iter().map(|row| row.to_vec()).collect()
}
