//! Least squares solvers.
//!
//! The forecast model is linear in its coefficients, so fitting reduces to:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2 + Σ_j (λ_j β_j)^2
//! ```
//!
//! The penalty term is a Gaussian prior on each coefficient (MAP estimate).
//! We fold it into an ordinary least squares problem by appending one row per
//! penalised coefficient, then solve with SVD. SVD handles the tall and
//! rank-deficient designs that show up with short histories and high Fourier
//! orders (it returns the minimum-norm solution).

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

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

/// Solve a ridge-style least squares problem with per-coefficient penalties.
///
/// `penalties[j]` is the row weight `λ_j` applied to coefficient `j`; zero means
/// unpenalised.
///
/// # Panics
/// Panics if `penalties.len() != x.ncols()`.
pub fn solve_penalized(x: &DMatrix<f64>, y: &DVector<f64>, penalties: &[f64]) -> Option<DVector<f64>> {
    assert_eq!(penalties.len(), x.ncols(), "one penalty per column");

    let active: Vec<(usize, f64)> = penalties
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, l)| *l > 0.0 && l.is_finite())
        .collect();
    if active.is_empty() {
        return solve_least_squares(x, y);
    }

    let n = x.nrows();
    let p = x.ncols();
    let mut xa = DMatrix::<f64>::zeros(n + active.len(), p);
    let mut ya = DVector::<f64>::zeros(n + active.len());
    xa.rows_mut(0, n).copy_from(x);
    ya.rows_mut(0, n).copy_from(y);
    for (row, (col, lambda)) in active.into_iter().enumerate() {
        xa[(n + row, col)] = lambda;
    }

    solve_least_squares(&xa, &ya)
}
