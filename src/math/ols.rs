//! Least squares solver.
//!
//! The linear trend model solves a tiny regression of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! with a two-column design (intercept, day index).
//!
//! Implementation choices:
//! - SVD handles the tall design matrix robustly (nalgebra's `QR::solve` is
//!   meant for square systems).
//! - Day indices grow large relative to the intercept column, so we retry with
//!   looser singular-value tolerances before giving up.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
