//! Model shape for Markov-switching regressions.
//!
//! [`MSShape`] fixes everything about a model that does not change during
//! estimation: the number of regimes, the number of exogenous regressors, the
//! autoregressive order, and which coefficient blocks switch with the regime.
//! It also owns the θ layout ([`ThetaLayout`]) shared by the parameter
//! transform, the standard-error table, and the parameter names.
use std::ops::Range;

use crate::regime::{
    core::data::MSData,
    errors::{MSError, MSResult},
};

/// Shape of a Markov-switching regression.
///
/// - `k_regimes`: number of regimes (≥ 2).
/// - `n_exog`: number of exogenous regressors (may be 0).
/// - `order`: autoregressive order, 0 or 1.
/// - `switching_exog`: exogenous coefficients differ by regime.
/// - `switching_ar`: AR coefficient differs by regime (only meaningful when
///   `order = 1`; stored as `false` otherwise).
/// - `switching_variance`: error variance differs by regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MSShape {
    pub k_regimes: usize,
    pub n_exog: usize,
    pub order: usize,
    pub switching_exog: bool,
    pub switching_ar: bool,
    pub switching_variance: bool,
}

/// Index ranges of each parameter block inside θ (and inside the constrained
/// flat vector, which shares the layout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThetaLayout {
    pub transition: Range<usize>,
    pub intercept: Range<usize>,
    pub exog: Range<usize>,
    pub ar: Range<usize>,
    pub variance: Range<usize>,
}

impl ThetaLayout {
    /// Total number of free parameters.
    pub fn len(&self) -> usize {
        self.variance.end
    }
}

impl MSShape {
    /// Construct a validated [`MSShape`].
    ///
    /// # Errors
    /// - [`MSError::InvalidRegimeCount`] if `k_regimes < 2`.
    /// - [`MSError::InvalidOrder`] if `order > 1`.
    pub fn new(
        k_regimes: usize, n_exog: usize, order: usize, switching_exog: bool, switching_ar: bool,
        switching_variance: bool,
    ) -> MSResult<Self> {
        if k_regimes < 2 {
            return Err(MSError::InvalidRegimeCount { k_regimes });
        }
        if order > 1 {
            return Err(MSError::InvalidOrder { order });
        }
        Ok(MSShape {
            k_regimes,
            n_exog,
            order,
            switching_exog,
            switching_ar: switching_ar && order == 1,
            switching_variance,
        })
    }

    /// Static regression: no AR term, regime-specific intercepts and
    /// exogenous coefficients.
    pub fn regression(k_regimes: usize, n_exog: usize, switching_variance: bool) -> MSResult<Self> {
        Self::new(k_regimes, n_exog, 0, true, false, switching_variance)
    }

    /// Minimum sample size `k + 1 + order`.
    pub fn min_obs(&self) -> usize {
        self.k_regimes + 1 + self.order
    }

    /// Reject samples too short to identify `k` regimes.
    ///
    /// # Errors
    /// - [`MSError::InsufficientData`] if `n_obs < k + 1 + order`.
    pub fn check_sample(&self, n_obs: usize) -> MSResult<()> {
        let required = self.min_obs();
        if n_obs < required {
            return Err(MSError::InsufficientData { n_obs, required });
        }
        Ok(())
    }

    /// Check that `data` matches this shape (regressor count and sample size).
    ///
    /// # Errors
    /// - [`MSError::ExogDimMismatch`] if the regressor count differs.
    /// - [`MSError::InsufficientData`] via [`MSShape::check_sample`].
    pub fn check_data(&self, data: &MSData) -> MSResult<()> {
        if data.n_exog() != self.n_exog {
            return Err(MSError::ExogDimMismatch { expected: self.n_exog, actual: data.n_exog() });
        }
        self.check_sample(data.n_obs())
    }

    /// Effective sample size `T − order`.
    pub fn n_eff(&self, n_obs: usize) -> usize {
        n_obs.saturating_sub(self.order)
    }

    /// Number of coefficient rows for the exogenous block (k or 1).
    pub fn exog_rows(&self) -> usize {
        if self.switching_exog { self.k_regimes } else { 1 }
    }

    /// Number of AR coefficients (0, 1 or k).
    pub fn n_ar(&self) -> usize {
        match (self.order, self.switching_ar) {
            (0, _) => 0,
            (_, true) => self.k_regimes,
            (_, false) => 1,
        }
    }

    /// Number of variances (k or 1).
    pub fn n_variances(&self) -> usize {
        if self.switching_variance { self.k_regimes } else { 1 }
    }

    /// Index ranges of the θ blocks, in layout order.
    pub fn layout(&self) -> ThetaLayout {
        let k = self.k_regimes;
        let transition = 0..k * (k - 1);
        let intercept = transition.end..transition.end + k;
        let exog = intercept.end..intercept.end + self.exog_rows() * self.n_exog;
        let ar = exog.end..exog.end + self.n_ar();
        let variance = ar.end..ar.end + self.n_variances();
        ThetaLayout { transition, intercept, exog, ar, variance }
    }

    /// Length of θ.
    pub fn theta_len(&self) -> usize {
        self.layout().len()
    }

    /// Names of the constrained flat parameters, in layout order.
    ///
    /// `p[i->j]`, `const[j]`, `x{m}[j]` / `x{m}`, `ar.L1[j]` / `ar.L1`,
    /// `sigma2[j]` / `sigma2`.
    pub fn param_names(&self) -> Vec<String> {
        let k = self.k_regimes;
        let mut names = Vec::with_capacity(self.theta_len());
        for i in 0..k {
            for j in 0..k - 1 {
                names.push(format!("p[{i}->{j}]"));
            }
        }
        names.extend((0..k).map(|j| format!("const[{j}]")));
        if self.switching_exog {
            for j in 0..k {
                names.extend((0..self.n_exog).map(|m| format!("x{m}[{j}]")));
            }
        } else {
            names.extend((0..self.n_exog).map(|m| format!("x{m}")));
        }
        match self.n_ar() {
            0 => {}
            1 => names.push("ar.L1".to_string()),
            _ => names.extend((0..k).map(|j| format!("ar.L1[{j}]"))),
        }
        if self.switching_variance {
            names.extend((0..k).map(|j| format!("sigma2[{j}]")));
        } else {
            names.push("sigma2".to_string());
        }
        names
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
    // - Shape validation and the sample-size rule.
    // - θ layout arithmetic for static and AR shapes.
    // - Parameter names in layout order.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Reject unsupported configurations before any fit starts.
    //
    // Given
    // -----
    // - k = 1, order = 2, and a 3-observation sample for k = 2.
    //
    // Expect
    // ------
    // - InvalidRegimeCount, InvalidOrder, and InsufficientData { 3, 4 }
    //   (k + 1 + order = 4 with order 1).
    fn invalid_shapes_and_samples_are_rejected() {
        assert_eq!(
            MSShape::regression(1, 0, false),
            Err(MSError::InvalidRegimeCount { k_regimes: 1 })
        );
        assert_eq!(
            MSShape::new(2, 0, 2, true, true, false),
            Err(MSError::InvalidOrder { order: 2 })
        );
        let ar = MSShape::new(2, 0, 1, true, true, false).expect("valid AR shape");
        assert_eq!(ar.check_sample(3), Err(MSError::InsufficientData { n_obs: 3, required: 4 }));
        assert!(ar.check_sample(4).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Block ranges follow the documented order and sizes.
    //
    // Given
    // -----
    // - k = 3, two regressors, switching exog, order 1 with shared AR,
    //   shared variance.
    //
    // Expect
    // ------
    // - transition 0..6, intercept 6..9, exog 9..15, ar 15..16,
    //   variance 16..17.
    fn layout_orders_blocks() {
        // Arrange
        let shape = MSShape::new(3, 2, 1, true, false, false).expect("valid shape");

        // Act
        let layout = shape.layout();

        // Assert
        assert_eq!(layout.transition, 0..6);
        assert_eq!(layout.intercept, 6..9);
        assert_eq!(layout.exog, 9..15);
        assert_eq!(layout.ar, 15..16);
        assert_eq!(layout.variance, 16..17);
        assert_eq!(shape.theta_len(), 17);
    }

    #[test]
    // Purpose
    // -------
    // `switching_ar` is dropped for static models and names track switching
    // flags.
    //
    // Given
    // -----
    // - k = 2, one shared regressor, order 0 with switching_ar requested,
    //   switching variance.
    //
    // Expect
    // ------
    // - switching_ar == false and the expected seven names.
    fn names_follow_switching_flags() {
        let shape = MSShape::new(2, 1, 0, false, true, true).expect("valid shape");
        assert!(!shape.switching_ar);
        assert_eq!(
            shape.param_names(),
            vec!["p[0->0]", "p[1->0]", "const[0]", "const[1]", "x0", "sigma2[0]", "sigma2[1]"]
        );
    }

    #[test]
    // Purpose
    // -------
    // `check_data` compares the regressor count with the shape.
    //
    // Given
    // -----
    // - A shape with one regressor and data with none.
    //
    // Expect
    // ------
    // - ExogDimMismatch { expected: 1, actual: 0 }.
    fn check_data_detects_regressor_mismatch() {
        let shape = MSShape::regression(2, 1, false).expect("valid shape");
        let data = MSData::new(array![1.0, 2.0, 3.0, 4.0], None).expect("valid data");
        assert_eq!(
            shape.check_data(&data),
            Err(MSError::ExogDimMismatch { expected: 1, actual: 0 })
        );
    }
}
