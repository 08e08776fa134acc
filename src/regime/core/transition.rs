//! Transition-matrix utilities: validation, stationary distribution, and
//! expected regime durations.
//!
//! Convention: `P[i][j] = Pr(S_t = j | S_{t−1} = i)`; every row sums to one.
//!
//! The duration of regime `j` is geometric with success probability
//! `1 − P[j][j]`, so `E[D_j] = 1 / (1 − P[j][j])`. For a row-stochastic
//! matrix `1 − P[j][j]` equals the off-diagonal row mass, which is what is
//! divided by: it is exact for the common decimal inputs (0.9 → 10, 0.5 → 2)
//! where `1.0 − 0.9` is not.
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, ArrayView2};

use crate::regime::errors::{MSError, MSResult, ParamError, ParamResult};

/// Tolerance on `|Σ_j P[i][j] − 1|`.
pub const ROW_SUM_TOL: f64 = 1e-8;

/// Validate that `p` is a `k × k` row-stochastic matrix.
///
/// With `strict = true` every entry must lie in the open interval (0, 1),
/// which is what the logit transform requires. Otherwise entries may touch
/// 0 or 1.
///
/// # Errors
/// - [`ParamError::TransitionShape`] for a non-square or wrong-size matrix.
/// - [`ParamError::InvalidTransitionProb`] for a non-finite or out-of-range entry.
/// - [`ParamError::TransitionRowSum`] when a row misses 1 by more than
///   [`ROW_SUM_TOL`].
pub fn validate_transition(p: ArrayView2<f64>, k: usize, strict: bool) -> ParamResult<()> {
    let (rows, cols) = p.dim();
    if rows != k || cols != k {
        return Err(ParamError::TransitionShape { rows, cols, expected: k });
    }
    for (row, r) in p.outer_iter().enumerate() {
        let mut sum = 0.0;
        for (col, &value) in r.iter().enumerate() {
            let in_range =
                if strict { value > 0.0 && value < 1.0 } else { (0.0..=1.0).contains(&value) };
            if !value.is_finite() || !in_range {
                return Err(ParamError::InvalidTransitionProb { row, col, value });
            }
            sum += value;
        }
        if (sum - 1.0).abs() > ROW_SUM_TOL {
            return Err(ParamError::TransitionRowSum { row, sum });
        }
    }
    Ok(())
}

/// stationary_distribution — ergodic probabilities `π` with `πᵀP = πᵀ`.
///
/// Solves `(I − Pᵀ + 𝟙𝟙ᵀ) π = 𝟙` by LU factorization. The rank-one term
/// replaces the redundant balance equation with `Σπ = 1`.
///
/// # Errors
/// - Validation errors from [`validate_transition`] (non-strict).
/// - [`ParamError::SingularTransition`] when the chain has no unique
///   stationary distribution (e.g. two absorbing regimes).
pub fn stationary_distribution(p: ArrayView2<f64>) -> ParamResult<Array1<f64>> {
    let k = p.nrows();
    validate_transition(p, k, false)?;
    let a = DMatrix::from_fn(k, k, |r, c| {
        let identity = if r == c { 1.0 } else { 0.0 };
        identity - p[[c, r]] + 1.0
    });
    let ones = DVector::from_element(k, 1.0);
    let pi = a.lu().solve(&ones).ok_or(ParamError::SingularTransition)?;
    if pi.iter().any(|v| !v.is_finite()) {
        return Err(ParamError::SingularTransition);
    }
    // Clip round-off below zero and renormalize.
    let mut out = Array1::from_iter(pi.iter().map(|&v| v.max(0.0)));
    let total = out.sum();
    if total <= 0.0 {
        return Err(ParamError::SingularTransition);
    }
    out /= total;
    Ok(out)
}

/// expected_durations — mean sojourn time of every regime.
///
/// Returns `E[D_j] = 1 / (1 − P[j][j])` for `j = 0..k`.
///
/// # Errors
/// - Validation errors from [`validate_transition`] (non-strict), wrapped
///   in [`MSError::Param`].
/// - [`MSError::AbsorbingRegime`] when `P[j][j] = 1`, or equivalently the
///   row has no off-diagonal mass.
///
/// # Examples
/// ```rust
/// # use ndarray::array;
/// # use markov_switching::regime::core::transition::expected_durations;
/// let p = array![[0.9, 0.1], [0.5, 0.5]];
/// let d = expected_durations(p.view()).unwrap();
/// assert_eq!(d[0], 10.0);
/// assert_eq!(d[1], 2.0);
/// ```
pub fn expected_durations(p: ArrayView2<f64>) -> MSResult<Array1<f64>> {
    let k = p.nrows();
    validate_transition(p, k, false)?;
    let mut out = Array1::zeros(k);
    for j in 0..k {
        let stay = p[[j, j]];
        let leave: f64 = (0..k).filter(|&c| c != j).map(|c| p[[j, c]]).sum();
        if stay >= 1.0 || leave <= 0.0 {
            return Err(MSError::AbsorbingRegime { regime: j, prob: stay });
        }
        out[j] = 1.0 / leave;
    }
    Ok(out)
}
