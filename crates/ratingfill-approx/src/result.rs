//! Approximation results and the approximator trait.

use std::fmt::Debug;

use ratingfill_core::{
    context::EvaluationContext,
    error::{CompletionError, Result},
    evaluation::{format_improvement, improvement_percent},
    types::DMatrix,
};

/// Whether an approximation can be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResultStatus {
    /// Every entry of the approximated matrix is finite.
    Valid,
    /// The approximation contains NaN/infinite values or the solver diverged.
    Degenerate {
        /// What went wrong
        reason: String,
    },
}

/// Approximated matrix plus the human-readable run summary.
///
/// Produced once per approximator invocation and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ApproximationResult {
    matrix: DMatrix,
    summary: String,
    rmse_before: f64,
    rmse_after: f64,
    status: ResultStatus,
}

impl ApproximationResult {
    /// Builds a result from the approximated matrix.
    ///
    /// `description` names the algorithm and its hyperparameters; the RMSE
    /// figures are training-reconstruction RMSEs before and after.
    pub fn new(matrix: DMatrix, description: &str, rmse_before: f64, rmse_after: f64) -> Self {
        let improvement = format_improvement(improvement_percent(rmse_before, rmse_after));
        let summary = format!(
            "{description} reduced RMSE by {improvement} from {rmse_before:0.3} to {rmse_after:0.3}"
        );
        let status = if matrix.iter().all(|v| v.is_finite()) {
            ResultStatus::Valid
        } else {
            ResultStatus::Degenerate {
                reason: "approximation contains non-finite values".to_string(),
            }
        };
        Self {
            matrix,
            summary,
            rmse_before,
            rmse_after,
            status,
        }
    }

    /// Marks the result as degenerate.
    pub fn with_degenerate<S: Into<String>>(mut self, reason: S) -> Self {
        let reason = reason.into();
        self.summary = format!("{} [degenerate: {reason}]", self.summary);
        self.status = ResultStatus::Degenerate { reason };
        self
    }

    /// The approximated dense matrix.
    pub fn matrix(&self) -> &DMatrix {
        &self.matrix
    }

    /// Consumes the result and returns the matrix.
    pub fn into_matrix(self) -> DMatrix {
        self.matrix
    }

    /// Summary line: algorithm, hyperparameters, RMSE before/after, improvement.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Training RMSE of the input.
    pub fn rmse_before(&self) -> f64 {
        self.rmse_before
    }

    /// Training RMSE of the approximation.
    pub fn rmse_after(&self) -> f64 {
        self.rmse_after
    }

    /// Improvement percentage, `None` if undefined.
    pub fn improvement(&self) -> Option<f64> {
        improvement_percent(self.rmse_before, self.rmse_after)
    }

    /// Validity of the approximation.
    pub fn status(&self) -> &ResultStatus {
        &self.status
    }

    /// Returns `true` unless the result is degenerate.
    pub fn is_valid(&self) -> bool {
        self.status == ResultStatus::Valid
    }
}

/// A completion algorithm: dense input matrix in, approximated matrix out.
pub trait Approximator: Debug {
    /// Algorithm name as accepted on the command line.
    fn name(&self) -> &'static str;

    /// Approximates `input` using the shared evaluation context.
    fn approximate(&self, ctx: &EvaluationContext, input: &DMatrix) -> Result<ApproximationResult>;
}

/// Checks that `input` has the context's shape.
pub(crate) fn check_input(ctx: &EvaluationContext, input: &DMatrix) -> Result<()> {
    if input.shape() == ctx.shape() {
        Ok(())
    } else {
        Err(CompletionError::dimension_mismatch(
            format!("{:?}", ctx.shape()),
            format!("{:?}", input.shape()),
        ))
    }
}

/// Checks `1 <= rank <= limit`.
pub(crate) fn check_rank(rank: usize, limit: usize) -> Result<()> {
    if rank == 0 {
        return Err(CompletionError::invalid_parameter(
            "rank",
            rank,
            "must be at least 1",
        ));
    }
    if rank > limit {
        return Err(CompletionError::invalid_parameter(
            "rank",
            rank,
            format!("must not exceed {limit}"),
        ));
    }
    Ok(())
}

/// Checks `iterations >= 1`.
pub(crate) fn check_iterations(iterations: usize) -> Result<()> {
    if iterations == 0 {
        Err(CompletionError::invalid_parameter(
            "iterations",
            iterations,
            "must be at least 1",
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_and_status() {
        let result = ApproximationResult::new(DMatrix::from_element(2, 2, 1.0), "SVD1 with r = 1", 2.0, 1.0);
        assert!(result.is_valid());
        assert_eq!(
            result.summary(),
            "SVD1 with r = 1 reduced RMSE by 50.000% from 2.000 to 1.000"
        );
        assert_eq!(result.improvement(), Some(50.0));
    }

    #[test]
    fn test_zero_baseline_reports_na() {
        let result = ApproximationResult::new(DMatrix::zeros(1, 1), "NMF with r = 2", 0.0, 0.4);
        assert!(result.summary().contains("by n/a from 0.000 to 0.400"));
        assert!(result.improvement().is_none());
    }

    #[test]
    fn test_non_finite_is_degenerate() {
        let mut matrix = DMatrix::zeros(2, 2);
        matrix[(1, 0)] = f64::NAN;
        let result = ApproximationResult::new(matrix, "SGD", 1.0, f64::NAN);
        assert!(!result.is_valid());

        let flagged = ApproximationResult::new(DMatrix::zeros(1, 1), "SGD", 1.0, 1.0)
            .with_degenerate("diverged at epoch 3");
        assert!(matches!(flagged.status(), ResultStatus::Degenerate { .. }));
        assert!(flagged.summary().ends_with("[degenerate: diverged at epoch 3]"));
    }

    #[test]
    fn test_parameter_checks() {
        assert!(check_rank(0, 3).is_err());
        assert!(check_rank(4, 3).is_err());
        assert!(check_rank(3, 3).is_ok());
        assert!(check_iterations(0).is_err());
        assert!(check_iterations(1).is_ok());
    }
}
