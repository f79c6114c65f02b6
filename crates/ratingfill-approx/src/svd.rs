//! Truncated and iterated singular value decomposition.
//!
//! # Algorithm Overview
//!
//! **SVD1** keeps the `r` largest singular triplets of the input:
//!
//! ```text
//! Z_r = Σ_{k < r} σ_k · u_k · v_kᵀ
//! ```
//!
//! **SVD2** repeats the truncation `i` times. Between rounds the observed
//! training cells are written back into the approximation, so every round
//! fits the known ratings again while the unknown cells drift toward a
//! rank-`r` structure. The final round is returned without reinjection.
//!
//! Singular values are ordered explicitly before truncation; ties keep the
//! decomposition's own order.

use nalgebra::SVD;
use ratingfill_core::{
    context::EvaluationContext,
    error::{CompletionError, Result},
    matrix::ObservedMask,
    types::DMatrix,
};
use tracing::{debug, instrument};

use crate::result::{check_input, check_iterations, check_rank, ApproximationResult, Approximator};

/// Default rank of [`SvdTruncate`].
pub const DEFAULT_SVD1_RANK: usize = 5;
/// Default rank of [`SvdIterate`].
pub const DEFAULT_SVD2_RANK: usize = 3;
/// Default round count of [`SvdIterate`].
pub const DEFAULT_SVD2_ITERATIONS: usize = 10;

/// Best rank-`rank` approximation of `matrix` in the Frobenius norm.
///
/// # Errors
///
/// - `InvalidParameter` unless `1 <= rank <= min(n, d)`.
/// - `NumericalError` when `matrix` has non-finite entries.
pub fn truncated_svd(matrix: &DMatrix, rank: usize) -> Result<DMatrix> {
    let (n_rows, n_cols) = matrix.shape();
    check_rank(rank, n_rows.min(n_cols))?;
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(CompletionError::numerical_error(
            "SVD input contains non-finite entries",
        ));
    }

    let svd = SVD::new(matrix.clone(), true, true);
    let u = svd
        .u
        .ok_or_else(|| CompletionError::numerical_error("SVD failed to compute U"))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| CompletionError::numerical_error("SVD failed to compute V^T"))?;
    let sigma = &svd.singular_values;

    let mut order: Vec<usize> = (0..sigma.len()).collect();
    order.sort_by(|&a, &b| sigma[b].total_cmp(&sigma[a]));

    let mut approx = DMatrix::zeros(n_rows, n_cols);
    for &k in order.iter().take(rank) {
        approx += (u.column(k) * sigma[k]) * v_t.row(k);
    }
    Ok(approx)
}

/// `iterations` rounds of truncation with reinjection of the observed cells
/// between rounds.
pub fn iterated_svd(
    matrix: &DMatrix,
    mask: &ObservedMask,
    rank: usize,
    iterations: usize,
) -> Result<DMatrix> {
    check_iterations(iterations)?;
    let mut current = matrix.clone();
    for round in 1..=iterations {
        current = truncated_svd(&current, rank)?;
        if round < iterations {
            mask.reinject(&mut current)?;
        }
        debug!(round, rank, "SVD round finished");
    }
    Ok(current)
}

/// Single truncated SVD (`SVD1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SvdTruncate {
    /// Number of singular triplets kept
    pub rank: usize,
}

impl Default for SvdTruncate {
    fn default() -> Self {
        Self {
            rank: DEFAULT_SVD1_RANK,
        }
    }
}

impl SvdTruncate {
    /// Creates the approximator with the given rank.
    pub fn new(rank: usize) -> Self {
        Self { rank }
    }

    fn description(&self) -> String {
        format!("SVD1 with r = {}", self.rank)
    }
}

impl Approximator for SvdTruncate {
    fn name(&self) -> &'static str {
        "SVD1"
    }

    #[instrument(skip_all, fields(rank = self.rank))]
    fn approximate(&self, ctx: &EvaluationContext, input: &DMatrix) -> Result<ApproximationResult> {
        check_input(ctx, input)?;
        let before = ctx.training_rmse(input)?;
        let approx = truncated_svd(input, self.rank)?;
        let after = ctx.training_rmse(&approx)?;
        Ok(ApproximationResult::new(approx, &self.description(), before, after))
    }
}

/// Iterated truncated SVD with reinjection (`SVD2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SvdIterate {
    /// Number of singular triplets kept per round
    pub rank: usize,
    /// Number of rounds
    pub iterations: usize,
}

impl Default for SvdIterate {
    fn default() -> Self {
        Self {
            rank: DEFAULT_SVD2_RANK,
            iterations: DEFAULT_SVD2_ITERATIONS,
        }
    }
}

impl SvdIterate {
    /// Creates the approximator.
    pub fn new(rank: usize, iterations: usize) -> Self {
        Self { rank, iterations }
    }

    pub(crate) fn description(&self) -> String {
        format!("SVD2 with i = {}, r = {}", self.iterations, self.rank)
    }
}

impl Approximator for SvdIterate {
    fn name(&self) -> &'static str {
        "SVD2"
    }

    #[instrument(skip_all, fields(rank = self.rank, iterations = self.iterations))]
    fn approximate(&self, ctx: &EvaluationContext, input: &DMatrix) -> Result<ApproximationResult> {
        check_input(ctx, input)?;
        let before = ctx.training_rmse(input)?;
        let approx = iterated_svd(input, ctx.mask(), self.rank, self.iterations)?;
        let after = ctx.training_rmse(&approx)?;
        Ok(ApproximationResult::new(approx, &self.description(), before, after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rank_one_matrix_is_reproduced() {
        let u = DMatrix::from_column_slice(3, 1, &[1.0, 2.0, 3.0]);
        let v = DMatrix::from_row_slice(1, 4, &[1.0, -1.0, 0.5, 2.0]);
        let m = &u * &v;

        let approx = truncated_svd(&m, 1).unwrap();
        assert_relative_eq!(approx, m, epsilon = 1e-10);
    }

    #[test]
    fn test_truncation_keeps_largest_component() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 3.0]);
        let approx = truncated_svd(&m, 1).unwrap();
        assert_relative_eq!(approx[(1, 1)], 3.0, epsilon = 1e-12);
        assert_relative_eq!(approx[(0, 0)], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_full_rank_is_exact() {
        let m = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 7.0]);
        let approx = truncated_svd(&m, 2).unwrap();
        assert_relative_eq!(approx, m, epsilon = 1e-10);
    }

    #[test]
    fn test_invalid_rank() {
        let m = DMatrix::from_element(2, 3, 1.0);
        assert!(matches!(
            truncated_svd(&m, 0),
            Err(CompletionError::InvalidParameter { .. })
        ));
        assert!(matches!(
            truncated_svd(&m, 3),
            Err(CompletionError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_single_iteration_equals_truncation() {
        let m = DMatrix::from_row_slice(3, 2, &[5.0, 4.0, 1.0, 3.0, 4.0, 2.0]);
        let mask = ObservedMask::from_matrix(&DMatrix::from_row_slice(
            3,
            2,
            &[5.0, 0.0, 0.0, 3.0, 4.0, 0.0],
        ));
        let once = iterated_svd(&m, &mask, 1, 1).unwrap();
        assert_relative_eq!(once, truncated_svd(&m, 1).unwrap(), epsilon = 1e-12);
        assert!(iterated_svd(&m, &mask, 1, 0).is_err());
    }

    #[test]
    fn test_two_rounds_reinject_between_truncations() {
        let m = DMatrix::from_row_slice(3, 2, &[5.0, 4.0, 1.0, 3.0, 4.0, 2.0]);
        let mask = ObservedMask::from_matrix(&DMatrix::from_row_slice(
            3,
            2,
            &[5.0, 0.0, 0.0, 3.0, 4.0, 0.0],
        ));

        let mut first = truncated_svd(&m, 1).unwrap();
        mask.reinject(&mut first).unwrap();
        let expected = truncated_svd(&first, 1).unwrap();

        let twice = iterated_svd(&m, &mask, 1, 2).unwrap();
        assert_relative_eq!(twice, expected, epsilon = 1e-12);
        assert!(mask.max_residual(&truncated_svd(&m, 1).unwrap()).unwrap() > 0.0);
    }

    #[test]
    fn test_leading_singular_value_of_rank_one_matrix() {
        // ||u|| * ||v|| = sqrt(14) * 2.5
        let u = DMatrix::from_column_slice(3, 1, &[1.0, 2.0, 3.0]);
        let v = DMatrix::from_row_slice(1, 4, &[1.0, -1.0, 0.5, 2.0]);
        let approx = truncated_svd(&(&u * &v), 1).unwrap();
        assert_relative_eq!(approx.norm(), 87.5_f64.sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, f64::NAN, 0.0, 3.0]);
        assert!(matches!(
            truncated_svd(&m, 1),
            Err(CompletionError::NumericalError { .. })
        ));
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(SvdTruncate::default().description(), "SVD1 with r = 5");
        assert_eq!(SvdIterate::default().description(), "SVD2 with i = 10, r = 3");
    }
}
