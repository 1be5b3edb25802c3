// src/motion/least_squares.rs - Rank-tolerant solve for small symmetric systems
//! Minimum-norm least-squares solve of `A x = b` for symmetric positive
//! semi-definite `A` (the `g gᵗ` normal matrices built by the planner).
//!
//! The system is diagonalized with a symmetric eigendecomposition and
//! eigenvalues below a relative threshold are dropped, so duplicate or nearly
//! proportional constraint gradients degrade to the pseudo-inverse solution
//! instead of blowing up.

use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// Eigenvalues at or below `RANK_TOLERANCE * max |λ|` count as zero.
pub const RANK_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresSolution {
    /// Minimum-norm solution.
    pub x: DVector<f64>,
    /// Number of eigenvalues kept.
    pub rank: usize,
    /// All eigenvalues of `A`, unsorted.
    pub eigenvalues: DVector<f64>,
}

impl LeastSquaresSolution {
    pub fn is_rank_deficient(&self) -> bool {
        self.rank < self.x.len()
    }
}

pub fn solve_symmetric(a: &DMatrix<f64>, b: &DVector<f64>) -> LeastSquaresSolution {
    assert!(a.is_square(), "least-squares system must be square, got {:?}", a.shape());
    assert_eq!(a.nrows(), b.len(), "right-hand side length does not match system size");

    let n = b.len();
    if n == 0 {
        return LeastSquaresSolution {
            x: DVector::zeros(0),
            rank: 0,
            eigenvalues: DVector::zeros(0),
        };
    }

    let eigen = SymmetricEigen::new(a.clone());
    let largest = eigen.eigenvalues.amax();
    let threshold = largest * RANK_TOLERANCE;

    let mut x = DVector::zeros(n);
    let mut rank = 0;
    for (i, &lambda) in eigen.eigenvalues.iter().enumerate() {
        if largest == 0.0 || lambda.abs() <= threshold {
            continue;
        }
        let q = eigen.eigenvectors.column(i);
        x += q * (q.dot(b) / lambda);
        rank += 1;
    }

    if rank < n {
        tracing::debug!("Rank-deficient solve: rank {} of {}", rank, n);
    }

    LeastSquaresSolution {
        x,
        rank,
        eigenvalues: eigen.eigenvalues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_full_rank_matches_direct_solve() {
        let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        let b = DVector::from_vec(vec![1.0, 2.0]);
        let solution = solve_symmetric(&a, &b);
        assert_eq!(solution.rank, 2);
        assert!(!solution.is_rank_deficient());
        assert_relative_eq!(solution.x[0], 1.0 / 11.0, epsilon = 1e-12);
        assert_relative_eq!(solution.x[1], 7.0 / 11.0, epsilon = 1e-12);
    }

    #[test]
    fn test_duplicate_rows_give_minimum_norm_solution() {
        // g has two identical rows, so g gᵗ is singular
        let g = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 2.0, 1.0, 2.0, 2.0]);
        let a = &g * g.transpose();
        let b = DVector::from_vec(vec![9.0, 9.0]);
        let solution = solve_symmetric(&a, &b);
        assert_eq!(solution.rank, 1);
        assert!(solution.is_rank_deficient());
        // minimum norm splits the multiplier evenly between the duplicates
        assert_relative_eq!(solution.x[0], 0.5, epsilon = 1e-9);
        assert_relative_eq!(solution.x[1], 0.5, epsilon = 1e-9);
        let residual = &a * &solution.x - &b;
        assert!(residual.norm() < 1e-9);
    }

    #[test]
    fn test_zero_matrix_yields_zero() {
        let a = DMatrix::zeros(3, 3);
        let b = DVector::from_vec(vec![1.0, -1.0, 2.0]);
        let solution = solve_symmetric(&a, &b);
        assert_eq!(solution.rank, 0);
        assert_eq!(solution.x, DVector::zeros(3));
    }

    #[test]
    fn test_empty_system() {
        let solution = solve_symmetric(&DMatrix::zeros(0, 0), &DVector::zeros(0));
        assert_eq!(solution.x.len(), 0);
        assert_eq!(solution.rank, 0);
    }
}
