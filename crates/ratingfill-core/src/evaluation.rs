//! RMSE evaluation.
//!
//! The same pure evaluator serves two purposes:
//!
//! - **Test RMSE**: an approximated matrix against the held-out test ratings,
//!   computed by the runner once per run.
//! - **Reconstruction RMSE**: a matrix against the observed training cells,
//!   reported by every approximator before and after approximation.
//!
//! ```text
//! RMSE = sqrt( Σ (approx[row, col] - actual)² / count )
//! ```

use crate::{
    error::{CompletionError, Result},
    index::IdentifierIndex,
    matrix::ObservedCell,
    ratings::RatingRecord,
    types::DMatrix,
};

/// Root-mean-square error of `approx` over `cells`.
///
/// The input matrix is only read, so repeated calls return identical values.
///
/// # Errors
///
/// - `EmptyDataset` when `cells` is empty.
/// - `DimensionMismatch` when a cell lies outside `approx`.
pub fn rmse(approx: &DMatrix, cells: &[ObservedCell]) -> Result<f64> {
    if cells.is_empty() {
        return Err(CompletionError::empty_dataset("no cells to evaluate RMSE on"));
    }

    let mut sum = 0.0;
    for cell in cells {
        let predicted = approx.get((cell.row, cell.col)).ok_or_else(|| {
            CompletionError::dimension_mismatch(
                format!("cell ({}, {}) inside matrix", cell.row, cell.col),
                format!("{:?}", approx.shape()),
            )
        })?;
        let diff = predicted - cell.value;
        sum += diff * diff;
    }
    Ok((sum / cells.len() as f64).sqrt())
}

/// Percentage by which `after` improves on `before`.
///
/// Returns `None` when the percentage is undefined: a zero baseline or a
/// non-finite RMSE on either side.
pub fn improvement_percent(before: f64, after: f64) -> Option<f64> {
    if !before.is_finite() || !after.is_finite() || before == 0.0 {
        return None;
    }
    Some(100.0 * (before - after) / before)
}

/// Formats an optional improvement for run summaries.
pub fn format_improvement(percent: Option<f64>) -> String {
    percent.map_or_else(|| "n/a".to_string(), |p| format!("{p:0.3}%"))
}

/// Test ratings resolved to dense positions.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSet {
    cells: Vec<ObservedCell>,
}

impl TestSet {
    /// Resolves each test record through the identifier indexes.
    ///
    /// # Errors
    ///
    /// - `EmptyDataset` when there are no test records.
    /// - `UnknownIdentifier` for ids absent from the indexes.
    pub fn resolve(
        records: &[RatingRecord],
        users: &IdentifierIndex,
        items: &IdentifierIndex,
    ) -> Result<Self> {
        if records.is_empty() {
            return Err(CompletionError::empty_dataset("test set"));
        }
        let cells = records
            .iter()
            .map(|r| {
                Ok(ObservedCell::new(
                    users.ordinal(r.user_id)?,
                    items.ordinal(r.item_id)?,
                    r.rating,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { cells })
    }

    /// Resolved test cells in input order.
    pub fn cells(&self) -> &[ObservedCell] {
        &self.cells
    }

    /// Number of test ratings.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always `false`: resolution rejects empty test sets.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// RMSE of `approx` against the test ratings.
    pub fn rmse(&self, approx: &DMatrix) -> Result<f64> {
        rmse(approx, &self.cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rmse_simple() {
        let approx = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let cells = vec![ObservedCell::new(0, 0, 2.0), ObservedCell::new(1, 1, 2.0)];
        // sqrt((1 + 4) / 2)
        assert_relative_eq!(rmse(&approx, &cells).unwrap(), (2.5_f64).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_rmse_errors() {
        let approx = DMatrix::zeros(2, 2);
        assert!(matches!(
            rmse(&approx, &[]),
            Err(CompletionError::EmptyDataset { .. })
        ));
        assert!(matches!(
            rmse(&approx, &[ObservedCell::new(2, 0, 1.0)]),
            Err(CompletionError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_improvement_percent() {
        assert_relative_eq!(improvement_percent(2.0, 1.5).unwrap(), 25.0, epsilon = 1e-12);
        assert_relative_eq!(improvement_percent(1.0, 1.2).unwrap(), -20.0, epsilon = 1e-12);
        assert!(improvement_percent(0.0, 1.0).is_none());
        assert!(improvement_percent(1.0, f64::NAN).is_none());
        assert!(improvement_percent(f64::INFINITY, 1.0).is_none());
    }

    #[test]
    fn test_format_improvement() {
        assert_eq!(format_improvement(Some(12.34567)), "12.346%");
        assert_eq!(format_improvement(None), "n/a");
    }

    #[test]
    fn test_test_set_resolution() {
        let train = vec![RatingRecord::new(1, 1, 4.0)];
        let test = vec![RatingRecord::new(2, 5, 3.0), RatingRecord::new(1, 1, 5.0)];
        let users = IdentifierIndex::users(&train, &test);
        let items = IdentifierIndex::items(&train, &test);

        let set = TestSet::resolve(&test, &users, &items).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.cells()[0], ObservedCell::new(1, 1, 3.0));
        assert_eq!(set.cells()[1], ObservedCell::new(0, 0, 5.0));

        assert!(matches!(
            TestSet::resolve(&[], &users, &items),
            Err(CompletionError::EmptyDataset { .. })
        ));
    }
}
