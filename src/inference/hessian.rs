//! inference::hessian — observed-information covariance.
//!
//! Purpose
//! -------
//! Turn a finite-difference Hessian of the negative average log-likelihood
//! into a numerically stable covariance of the unconstrained estimates θ̂.
//! This module handles conversion between `ndarray` and `nalgebra` types and
//! forms the Moore–Penrose pseudoinverse by symmetric eigendecomposition.
//!
//! Key behaviors
//! -------------
//! - Call [`compute_hessian`] on the gradient of the negative average
//!   log-likelihood to obtain the observed information `J(θ̂)`.
//! - Copy `J(θ̂)` into a `nalgebra::DMatrix` ([`fill_dmatrix`]) and build
//!   `J⁺ = Σ_{λ_k > EIGEN_EPS} q_k q_kᵀ / λ_k` ([`pseudo_inverse`]).
//! - [`calc_covariance`] returns `J⁺` on the average scale; callers divide
//!   by the effective sample size to obtain `Var(θ̂)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - [`compute_hessian`] returns a finite, symmetrized `n×n` matrix with
//!   `n = θ̂.len()`; this module does not re-symmetrize.
//! - Eigenvalues at or below [`EIGEN_EPS`] are treated as numerically
//!   nonpositive; their directions contribute nothing to the covariance.
//!
//! Conventions
//! -----------
//! - Hessians are on the **average log-likelihood** scale.
//! - No explicit matrix inverse is formed.
//! - Errors are reported via [`OptResult<T>`].
use crate::optimization::{
    errors::OptResult, loglik_optimizer::finite_diff::compute_hessian,
    numerical_stability::transformations::EIGEN_EPS,
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// calc_covariance — pseudoinverse of the observed information at θ̂.
///
/// Parameters
/// ----------
/// - `f`: gradient map of the **negative average** log-likelihood,
///   `θ ↦ ∇(−ℓ̄)(θ)`. A closure that cannot evaluate the gradient should
///   return a non-finite vector, which fails Hessian validation.
/// - `theta_hat`: point at which `J(θ̂)` is evaluated.
///
/// Returns
/// -------
/// The symmetric `n×n` matrix `J⁺` on the average-log-likelihood scale.
///
/// Errors
/// ------
/// - Any error from [`compute_hessian`] (non-finite or misshaped Hessian).
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use markov_switching::inference::hessian::calc_covariance;
/// // Quadratic with diagonal information diag(4, 1).
/// let a = array![[4.0, 0.0], [0.0, 1.0]];
/// let f = |theta: &ndarray::Array1<f64>| -> ndarray::Array1<f64> { a.dot(theta) };
/// let cov = calc_covariance(&f, &array![1.0, -1.0]).unwrap();
/// assert!((cov[[0, 0]] - 0.25).abs() < 1e-6);
/// assert!((cov[[1, 1]] - 1.0).abs() < 1e-6);
/// ```
pub fn calc_covariance<F: Fn(&Array1<f64>) -> Array1<f64>>(
    f: &F, theta_hat: &Array1<f64>,
) -> OptResult<Array2<f64>> {
    let obs_info = compute_hessian(f, theta_hat)?;
    let mut obs_info_nalg = DMatrix::<f64>::zeros(obs_info.nrows(), obs_info.ncols());
    fill_dmatrix(&obs_info, &mut obs_info_nalg);
    Ok(pseudo_inverse(obs_info_nalg))
}

// ---- Helper methods ----

/// fill_dmatrix — copy an `ndarray` matrix into a `nalgebra::DMatrix`.
///
/// Column-by-column writes match the column-major storage of `DMatrix`.
/// Symmetry is preserved as given.
///
/// Panics
/// ------
/// - If the two matrices have different shapes (programming error).
fn fill_dmatrix(obs_info: &Array2<f64>, obs_info_nalg: &mut DMatrix<f64>) {
    let n = obs_info.ncols();
    for j in 0..n {
        for i in j..n {
            if j == i {
                obs_info_nalg[(i, i)] = obs_info[[i, i]];
            } else {
                obs_info_nalg[(i, j)] = obs_info[[i, j]];
                obs_info_nalg[(j, i)] = obs_info[[j, i]];
            }
        }
    }
}

/// pseudo_inverse — `Σ_{λ_k > EIGEN_EPS} q_k q_kᵀ / λ_k` for symmetric input.
///
/// Here `Q Λ Qᵀ` is the symmetric eigendecomposition of `obs_info_nalg`.
fn pseudo_inverse(obs_info_nalg: DMatrix<f64>) -> Array2<f64> {
    let n = obs_info_nalg.nrows();
    let eigen_decomp = obs_info_nalg.symmetric_eigen();
    let q = eigen_decomp.eigenvectors;
    let mut pinv = Array2::<f64>::zeros((n, n));
    for (k, &lambda) in eigen_decomp.eigenvalues.iter().enumerate() {
        if lambda <= EIGEN_EPS {
            continue;
        }
        for i in 0..n {
            let coeff = q[(i, k)] / lambda;
            for j in 0..n {
                pinv[[i, j]] += coeff * q[(j, k)];
            }
        }
    }
    pinv
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Correct copying of matrices from `ndarray` into `DMatrix`.
    // - Covariance for quadratic objectives with known information
    //   matrices, including a rank-deficient one.
    // - Propagation of Hessian validation failures.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // `fill_dmatrix` copies every entry unchanged.
    //
    // Given
    // -----
    // - A 2×2 symmetric matrix with distinct entries.
    //
    // Expect
    // ------
    // - Identical entries in the DMatrix.
    fn fill_dmatrix_copies_entries() {
        let a = array![[2.0, 0.5], [0.5, 3.0]];
        let mut m = DMatrix::<f64>::zeros(2, 2);
        fill_dmatrix(&a, &mut m);
        for i in 0..2 {
            for j in 0..2 {
                assert_eq!(m[(i, j)], a[[i, j]]);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // For a full-rank quadratic the covariance equals the inverse
    // information matrix.
    //
    // Given
    // -----
    // - Gradient map θ ↦ Aθ with A = [[2, 1], [1, 2]].
    //
    // Expect
    // ------
    // - J⁺ ≈ A⁻¹ = [[2, −1], [−1, 2]] / 3, symmetric.
    fn covariance_inverts_full_rank_information() {
        // Arrange
        let a = array![[2.0, 1.0], [1.0, 2.0]];
        let f = |theta: &Array1<f64>| a.dot(theta);
        let theta_hat = array![0.3, -0.2];

        // Act
        let cov = calc_covariance(&f, &theta_hat).expect("finite Hessian");

        // Assert
        assert_abs_diff_eq!(cov[[0, 0]], 2.0 / 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cov[[0, 1]], -1.0 / 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cov[[1, 0]], cov[[0, 1]], epsilon = 1e-12);
        assert_abs_diff_eq!(cov[[1, 1]], 2.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // Flat directions are dropped from the pseudoinverse.
    //
    // Given
    // -----
    // - Gradient map θ ↦ (4θ₀, 0): the second direction carries no
    //   information.
    //
    // Expect
    // ------
    // - J⁺ = diag(0.25, 0): nothing is attributed to the flat direction.
    fn flat_directions_are_truncated() {
        let f = |theta: &Array1<f64>| array![4.0 * theta[0], 0.0];
        let cov = calc_covariance(&f, &array![1.0, 1.0]).expect("finite Hessian");
        assert_abs_diff_eq!(cov[[0, 0]], 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(cov[[1, 1]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cov[[0, 1]], 0.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Non-finite gradients surface as an error rather than a covariance.
    //
    // Given
    // -----
    // - A gradient map that always returns NaN.
    //
    // Expect
    // ------
    // - calc_covariance returns Err.
    fn non_finite_gradient_is_an_error() {
        let f = |_: &Array1<f64>| array![f64::NAN, f64::NAN];
        assert!(calc_covariance(&f, &array![0.0, 0.0]).is_err());
    }
}
