//! Least squares solver.
//!
//! Every ARIMA candidate is estimated by one or two small regressions of the form:
//!
//! ```text
//! minimize Σ (y_t - x_t^T β)^2
//! ```
//!
//! where `x_t` holds an intercept, lagged values and (for MA terms) lagged
//! innovation estimates.
//!
//! Implementation choices:
//! - We use SVD so tall design matrices (more rows than columns) and nearly
//!   collinear lag columns (e.g. on flat series) are still solvable.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Parameter dimension is tiny (at most `1 + max_p + max_q` columns).

use nalgebra::{DMatrix, DVector};

const SVD_MAX_NITER: usize = 1_000;

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly or
/// the SVD does not converge.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() != y.len() || x.nrows() == 0 {
        return None;
    }
    if x.ncols() == 0 {
        return Some(DVector::zeros(0));
    }

    let svd = x
        .clone()
        .try_svd(true, true, f64::EPSILON, SVD_MAX_NITER)?;

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn collinear_columns_still_solve() {
        // Second column duplicates the intercept (flat series lag).
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let y = DVector::from_row_slice(&[4.0, 4.0, 4.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] + beta[1] - 4.0).abs() < 1e-8);
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let x = DMatrix::from_row_slice(2, 1, &[1.0, 1.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }
}
