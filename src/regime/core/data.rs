//! Observation containers for Markov-switching regressions.
//!
//! Purpose
//! -------
//! Hold a validated response series `y_t` and an optional exogenous regressor
//! matrix `X` (one row per observation). Validation happens once, at the
//! boundary where raw data enters the model stack, so the likelihood engine
//! and the filter can index without re-checking.
//!
//! Invariants & assumptions
//! ------------------------
//! - `endog` is non-empty and every value is finite.
//! - When present, `exog` has `endog.len()` rows, at least one column, and
//!   only finite entries.
//! - No intercept column is expected in `exog`; regime intercepts are
//!   separate parameters.
//!
//! Conventions
//! -----------
//! - Indexing is 0-based; row `t` of `exog` is aligned with `endog[t]`.
//! - Any lagging of regressors happens caller-side. The autoregressive
//!   lag of `y` is handled by the model (`order = 1`), not by `exog`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the happy path and each rejection branch of
//!   [`MSData::new`].
use crate::regime::errors::{MSError, MSResult};
use ndarray::{Array1, Array2, ArrayView1};

/// `MSData` — validated response series plus optional exogenous regressors.
///
/// Fields
/// ------
/// - `endog`: `Array1<f64>`
///   Observed responses `y_0, …, y_{T−1}`.
/// - `exog`: `Option<Array2<f64>>`
///   Optional `T × m` regressor matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct MSData {
    /// Observed responses (finite).
    pub endog: Array1<f64>,
    /// Optional `T × m` exogenous regressors (finite, `m ≥ 1`).
    pub exog: Option<Array2<f64>>,
}

impl MSData {
    /// Construct a validated [`MSData`].
    ///
    /// Errors
    /// ------
    /// - `MSError::EmptySeries` when `endog` is empty.
    /// - `MSError::NonFiniteData { index, value }` for the first NaN/±∞ response.
    /// - `MSError::EmptyExog` when `exog` has zero columns.
    /// - `MSError::ExogLengthMismatch { endog, exog }` when row counts differ.
    /// - `MSError::NonFiniteExog { row, col, value }` for the first NaN/±∞
    ///   regressor, scanning row by row.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use ndarray::array;
    /// # use markov_switching::regime::core::data::MSData;
    /// let data = MSData::new(array![1.0, 2.0, 0.5], None).unwrap();
    /// assert_eq!(data.n_obs(), 3);
    /// assert_eq!(data.n_exog(), 0);
    /// ```
    pub fn new(endog: Array1<f64>, exog: Option<Array2<f64>>) -> MSResult<Self> {
        if endog.is_empty() {
            return Err(MSError::EmptySeries);
        }
        for (index, &value) in endog.iter().enumerate() {
            if !value.is_finite() {
                return Err(MSError::NonFiniteData { index, value });
            }
        }

        if let Some(x) = &exog {
            if x.ncols() == 0 {
                return Err(MSError::EmptyExog);
            }
            if x.nrows() != endog.len() {
                return Err(MSError::ExogLengthMismatch { endog: endog.len(), exog: x.nrows() });
            }
            for ((row, col), &value) in x.indexed_iter() {
                if !value.is_finite() {
                    return Err(MSError::NonFiniteExog { row, col, value });
                }
            }
        }

        Ok(MSData { endog, exog })
    }

    /// Number of observations `T`.
    pub fn n_obs(&self) -> usize {
        self.endog.len()
    }

    /// Number of exogenous columns (0 without regressors).
    pub fn n_exog(&self) -> usize {
        self.exog.as_ref().map_or(0, |x| x.ncols())
    }

    /// Regressor row `t`, or `None` without regressors.
    pub fn exog_row(&self, t: usize) -> Option<ArrayView1<'_, f64>> {
        self.exog.as_ref().map(|x| x.row(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction with and without regressors.
    // - Each validation branch of `MSData::new`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Valid responses and regressors are stored unchanged.
    //
    // Given
    // -----
    // - y = [1, 2, 3] and a 3×2 regressor matrix.
    //
    // Expect
    // ------
    // - Ok; n_obs == 3, n_exog == 2, exog_row(1) == [0.5, 1].
    fn new_accepts_aligned_finite_inputs() {
        // Arrange
        let y = array![1.0, 2.0, 3.0];
        let x = array![[0.0, 1.0], [0.5, 1.0], [1.0, 1.0]];

        // Act
        let data = MSData::new(y.clone(), Some(x)).expect("valid data");

        // Assert
        assert_eq!(data.endog, y);
        assert_eq!(data.n_obs(), 3);
        assert_eq!(data.n_exog(), 2);
        assert_eq!(data.exog_row(1).expect("row").to_vec(), vec![0.5, 1.0]);
    }

    #[test]
    // Purpose
    // -------
    // Each malformed input is rejected with its own error.
    //
    // Given
    // -----
    // - Empty y, y with NaN, zero-column X, misaligned X, X with +∞.
    //
    // Expect
    // ------
    // - EmptySeries, NonFiniteData, EmptyExog, ExogLengthMismatch,
    //   NonFiniteExog respectively.
    fn new_rejects_malformed_inputs() {
        assert_eq!(MSData::new(Array1::zeros(0), None), Err(MSError::EmptySeries));

        let nan = MSData::new(array![1.0, f64::NAN], None);
        assert!(matches!(nan, Err(MSError::NonFiniteData { index: 1, .. })));

        let empty_x = MSData::new(array![1.0, 2.0], Some(Array2::zeros((2, 0))));
        assert_eq!(empty_x, Err(MSError::EmptyExog));

        let short_x = MSData::new(array![1.0, 2.0, 3.0], Some(array![[1.0], [2.0]]));
        assert_eq!(short_x, Err(MSError::ExogLengthMismatch { endog: 3, exog: 2 }));

        let inf_x = MSData::new(array![1.0, 2.0], Some(array![[1.0], [f64::INFINITY]]));
        assert!(matches!(inf_x, Err(MSError::NonFiniteExog { row: 1, col: 0, .. })));
    }
}
