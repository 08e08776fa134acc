//! Markov-switching parameters and the θ ↔ model-space transform.
//!
//! This module provides the **model-space** container [`MSParams`] and the
//! mapping to and from the **optimizer-space** vector θ.
//!
//! ## Mapping conventions
//! - Each transition row `P[i][·]` is a softmax of `k − 1` free logits with
//!   the last column as baseline (logit 0). Logits are clamped to
//!   `±TRANSITION_LOGIT_BOUND`, so every probability stays strictly inside
//!   (0, 1) for any finite θ.
//! - Variances are `exp` of an unconstrained log-variance clamped to
//!   `±LOG_VARIANCE_BOUND`.
//! - Intercepts, exogenous coefficients, and AR coefficients are used as-is.
//!
//! ## Layout
//! θ and the constrained flat vector ([`MSParams::to_flat`]) share the block
//! order of [`MSShape::layout`]: transition, intercepts, exogenous
//! coefficients (regime-major when switching), AR coefficients, variances.
//! In the flat vector the transition block holds `P[i][0..k−1]` and the
//! variance block holds σ².
//!
//! ## Invariants validated by constructors
//! - `P` is `k × k`, row-stochastic, entries in [0, 1]
//! - `intercepts.len() == k`
//! - `exog` is `exog_rows × n_exog`, `ar.len() == n_ar`
//! - all coefficients finite, all variances finite and > 0
//!
//! [`MSParams::to_theta`] is stricter: it rejects transition entries of
//! exactly 0 or 1, which have no finite logit, and variances whose log lies
//! outside `±LOG_VARIANCE_BOUND`, which `from_theta` could not reproduce.
use ndarray::{Array1, Array2, ArrayView1, s};

use crate::{
    optimization::{
        loglik_optimizer::Theta,
        numerical_stability::transformations::{
            LOG_VARIANCE_BOUND, safe_softmax, safe_softmax_inv, safe_variance,
            safe_variance_inv,
        },
    },
    regime::{
        core::{shape::MSShape, transition::validate_transition},
        errors::{ParamError, ParamResult},
    },
};

/// Constrained **model-space** parameters of a Markov-switching regression.
#[derive(Debug, Clone, PartialEq)]
pub struct MSParams {
    /// Shape these parameters were built for.
    pub shape: MSShape,
    /// `k × k` row-stochastic transition matrix, `P[i][j] = Pr(S_t=j | S_{t−1}=i)`.
    pub transition: Array2<f64>,
    /// Regime intercepts `a_j`, length `k`.
    pub intercepts: Array1<f64>,
    /// Exogenous coefficients, `exog_rows × n_exog` (row `j` is regime `j`
    /// when switching, a single shared row otherwise).
    pub exog: Array2<f64>,
    /// AR(1) coefficients, length 0, 1 or `k`.
    pub ar: Array1<f64>,
    /// Error variances, length 1 or `k`.
    pub variances: Array1<f64>,
}

impl MSParams {
    /// Construct validated parameters for `shape`.
    ///
    /// # Errors
    /// - Transition errors from [`validate_transition`] (entries may touch
    ///   0 or 1 here).
    /// - [`ParamError::LengthMismatch`] when a block has the wrong size.
    /// - [`ParamError::NonFiniteCoef`] for a NaN/±∞ coefficient.
    /// - [`ParamError::InvalidVariance`] for a non-finite or non-positive variance.
    pub fn new(
        shape: MSShape, transition: Array2<f64>, intercepts: Array1<f64>, exog: Array2<f64>,
        ar: Array1<f64>, variances: Array1<f64>,
    ) -> ParamResult<Self> {
        let k = shape.k_regimes;
        validate_transition(transition.view(), k, false)?;
        check_block("intercepts", intercepts.view(), k)?;

        let (rows, cols) = exog.dim();
        let expected = shape.exog_rows() * shape.n_exog;
        if cols != shape.n_exog || rows * cols != expected {
            return Err(ParamError::LengthMismatch {
                name: "exog",
                expected,
                actual: rows * cols,
            });
        }
        for (index, &value) in exog.iter().enumerate() {
            if !value.is_finite() {
                return Err(ParamError::NonFiniteCoef { name: "exog", index, value });
            }
        }

        check_block("ar", ar.view(), shape.n_ar())?;

        if variances.len() != shape.n_variances() {
            return Err(ParamError::LengthMismatch {
                name: "variances",
                expected: shape.n_variances(),
                actual: variances.len(),
            });
        }
        for (index, &value) in variances.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(ParamError::InvalidVariance { index, value });
            }
        }

        Ok(MSParams { shape, transition, intercepts, exog, ar, variances })
    }

    /// Map an unconstrained θ into model space.
    ///
    /// # Errors
    /// - [`ParamError::ThetaLengthMismatch`] if `theta.len() != shape.theta_len()`.
    /// - [`ParamError::InvalidThetaInput`] for the first non-finite entry.
    pub fn from_theta(theta: ArrayView1<f64>, shape: &MSShape) -> ParamResult<Self> {
        let layout = shape.layout();
        if theta.len() != layout.len() {
            return Err(ParamError::ThetaLengthMismatch {
                expected: layout.len(),
                actual: theta.len(),
            });
        }
        for (index, &value) in theta.iter().enumerate() {
            if !value.is_finite() {
                return Err(ParamError::InvalidThetaInput { index, value });
            }
        }

        let k = shape.k_regimes;
        let logits = theta.slice(s![layout.transition.clone()]);
        let mut transition = Array2::zeros((k, k));
        for i in 0..k {
            safe_softmax(logits.slice(s![i * (k - 1)..(i + 1) * (k - 1)]), transition.row_mut(i));
        }

        let intercepts = theta.slice(s![layout.intercept.clone()]).to_owned();
        let exog = theta
            .slice(s![layout.exog.clone()])
            .to_owned()
            .into_shape((shape.exog_rows(), shape.n_exog))
            .map_err(|_| ParamError::LengthMismatch {
                name: "exog",
                expected: shape.exog_rows() * shape.n_exog,
                actual: layout.exog.len(),
            })?;
        let ar = theta.slice(s![layout.ar.clone()]).to_owned();
        let variances = theta.slice(s![layout.variance.clone()]).mapv(safe_variance);

        Ok(MSParams { shape: *shape, transition, intercepts, exog, ar, variances })
    }

    /// Map model-space parameters to the unconstrained θ.
    ///
    /// # Errors
    /// - [`ParamError::InvalidTransitionProb`] when a transition entry is
    ///   exactly 0 or 1 (no finite logit exists).
    /// - [`ParamError::InvalidVariance`] when `|ln σ²| > LOG_VARIANCE_BOUND`.
    pub fn to_theta(&self) -> ParamResult<Theta> {
        let k = self.shape.k_regimes;
        let layout = self.shape.layout();
        validate_transition(self.transition.view(), k, true)?;

        let mut theta = Theta::zeros(layout.len());
        for i in 0..k {
            let start = layout.transition.start + i * (k - 1);
            safe_softmax_inv(self.transition.row(i), theta.slice_mut(s![start..start + k - 1]));
        }
        theta.slice_mut(s![layout.intercept.clone()]).assign(&self.intercepts);
        for (dst, &src) in theta.slice_mut(s![layout.exog.clone()]).iter_mut().zip(self.exog.iter())
        {
            *dst = src;
        }
        theta.slice_mut(s![layout.ar.clone()]).assign(&self.ar);
        for (index, &value) in self.variances.iter().enumerate() {
            let log_var = safe_variance_inv(value);
            if log_var.is_nan() || log_var.abs() > LOG_VARIANCE_BOUND {
                return Err(ParamError::InvalidVariance { index, value });
            }
            theta[layout.variance.start + index] = log_var;
        }
        Ok(theta)
    }

    /// Constrained flat vector in θ layout (free transition probabilities
    /// and σ² in place of logits and log-variances).
    pub fn to_flat(&self) -> Array1<f64> {
        let k = self.shape.k_regimes;
        let mut flat = Vec::with_capacity(self.shape.theta_len());
        for i in 0..k {
            flat.extend(self.transition.row(i).iter().take(k - 1));
        }
        flat.extend(self.intercepts.iter());
        flat.extend(self.exog.iter());
        flat.extend(self.ar.iter());
        flat.extend(self.variances.iter());
        Array1::from(flat)
    }

    /// Parameter names matching [`MSParams::to_flat`].
    pub fn param_names(&self) -> Vec<String> {
        self.shape.param_names()
    }

    /// Exogenous coefficients `β_j` for regime `j`.
    pub fn exog_coefs(&self, j: usize) -> ArrayView1<'_, f64> {
        let row = if self.shape.switching_exog { j } else { 0 };
        self.exog.row(row)
    }

    /// AR(1) coefficient `φ_j`; zero for static models.
    pub fn ar_coef(&self, j: usize) -> f64 {
        match self.ar.len() {
            0 => 0.0,
            1 => self.ar[0],
            _ => self.ar[j],
        }
    }

    /// Error variance `σ²_j`.
    pub fn variance(&self, j: usize) -> f64 {
        if self.shape.switching_variance { self.variances[j] } else { self.variances[0] }
    }

    /// Regression part of the mean for regime `j` at regressor row `x`:
    /// `a_j + x'β_j`.
    pub fn regression_mean(&self, j: usize, x: Option<ArrayView1<f64>>) -> f64 {
        let exog = x.map_or(0.0, |row| row.dot(&self.exog_coefs(j)));
        self.intercepts[j] + exog
    }
}

/// Map θ straight to the constrained flat vector (used for delta-method
/// Jacobians).
pub fn flat_from_theta(theta: ArrayView1<f64>, shape: &MSShape) -> ParamResult<Array1<f64>> {
    MSParams::from_theta(theta, shape).map(|p| p.to_flat())
}

fn check_block(name: &'static str, block: ArrayView1<f64>, expected: usize) -> ParamResult<()> {
    if block.len() != expected {
        return Err(ParamError::LengthMismatch { name, expected, actual: block.len() });
    }
    for (index, &value) in block.iter().enumerate() {
        if !value.is_finite() {
            return Err(ParamError::NonFiniteCoef { name, index, value });
        }
    }
    Ok(())
}
