//! Dense rating matrix and observed-entry mask.
//!
//! The training ratings are sparse, but every approximator works on a fully
//! materialized `n_users × n_items` matrix. [`RatingMatrix::from_ratings`] is
//! the single place where training values are written into that matrix.
//!
//! # Zero versus missing
//!
//! Unobserved cells are stored as `0.0` and the mask marks a cell as
//! observed iff its value is strictly positive. A rating of exactly zero is
//! therefore indistinguishable from a missing one. Valid rating scales are
//! strictly positive, and this convention is kept as is.

use nalgebra::DMatrix as NaMatrix;

use crate::{
    error::{CompletionError, Result},
    index::IdentifierIndex,
    ratings::RatingRecord,
    types::DMatrix,
};

/// A known rating at a dense position.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObservedCell {
    /// Row ordinal (user)
    pub row: usize,
    /// Column ordinal (item)
    pub col: usize,
    /// Rating value
    pub value: f64,
}

impl ObservedCell {
    /// Creates a cell.
    pub fn new(row: usize, col: usize, value: f64) -> Self {
        Self { row, col, value }
    }
}

/// Dense zero-filled rating matrix built from training records.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingMatrix {
    values: DMatrix,
}

impl RatingMatrix {
    /// Populates a dense matrix from training records in one pass.
    ///
    /// Later duplicates of a `(user, item)` pair overwrite earlier ones.
    ///
    /// # Errors
    ///
    /// Returns `UnknownIdentifier` if a record's user or item has no ordinal.
    pub fn from_ratings(
        records: &[RatingRecord],
        users: &IdentifierIndex,
        items: &IdentifierIndex,
    ) -> Result<Self> {
        let mut values = DMatrix::zeros(users.len(), items.len());
        for record in records {
            let row = users.ordinal(record.user_id)?;
            let col = items.ordinal(record.item_id)?;
            values[(row, col)] = record.rating;
        }
        Ok(Self { values })
    }

    /// Wraps an existing dense matrix.
    pub fn from_dense(values: DMatrix) -> Self {
        Self { values }
    }

    /// Zero-filled dense values.
    pub fn values(&self) -> &DMatrix {
        &self.values
    }

    /// Consumes the wrapper and returns the dense values.
    pub fn into_inner(self) -> DMatrix {
        self.values
    }

    /// Shape as `(n_users, n_items)`.
    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    /// Companion view where unobserved cells hold `NaN`.
    pub fn nan_filled(&self) -> DMatrix {
        self.values
            .map(|v| if v > 0.0 { v } else { f64::NAN })
    }

    /// Derives the observed-entry mask (`value > 0`).
    pub fn observed_mask(&self) -> ObservedMask {
        ObservedMask::from_matrix(&self.values)
    }
}

/// Boolean matrix of observed training cells together with their values.
///
/// The mask is computed once per run and never changes: reinjection always
/// restores the same set of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedMask {
    mask: NaMatrix<bool>,
    cells: Vec<ObservedCell>,
}

impl ObservedMask {
    /// Builds the mask from a zero-filled matrix.
    ///
    /// Cells are stored in row-major order, the order in which the known
    /// values vector is laid out.
    pub fn from_matrix(values: &DMatrix) -> Self {
        let (nrows, ncols) = values.shape();
        let mask = values.map(|v| v > 0.0);
        let mut cells = Vec::new();
        for row in 0..nrows {
            for col in 0..ncols {
                if mask[(row, col)] {
                    cells.push(ObservedCell::new(row, col, values[(row, col)]));
                }
            }
        }
        Self { mask, cells }
    }

    /// Returns `true` if `(row, col)` holds a training rating.
    pub fn is_observed(&self, row: usize, col: usize) -> bool {
        self.mask.get((row, col)).copied().unwrap_or(false)
    }

    /// Observed cells in row-major order.
    pub fn cells(&self) -> &[ObservedCell] {
        &self.cells
    }

    /// Known training values in row-major order.
    pub fn known_values(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.value).collect()
    }

    /// Number of observed cells.
    pub fn count(&self) -> usize {
        self.cells.len()
    }

    /// Shape of the underlying matrix.
    pub fn shape(&self) -> (usize, usize) {
        self.mask.shape()
    }

    /// Overwrites every observed cell of `matrix` with its training value.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` when `matrix` has a different shape.
    pub fn reinject(&self, matrix: &mut DMatrix) -> Result<()> {
        self.check_shape(matrix)?;
        for cell in &self.cells {
            matrix[(cell.row, cell.col)] = cell.value;
        }
        Ok(())
    }

    /// Largest absolute difference between `matrix` and the training values
    /// over observed cells. Zero right after [`reinject`](Self::reinject).
    pub fn max_residual(&self, matrix: &DMatrix) -> Result<f64> {
        self.check_shape(matrix)?;
        Ok(self
            .cells
            .iter()
            .map(|c| (matrix[(c.row, c.col)] - c.value).abs())
            .fold(0.0, f64::max))
    }

    /// Sum of squared errors of `matrix` over observed cells.
    pub fn squared_error(&self, matrix: &DMatrix) -> Result<f64> {
        self.check_shape(matrix)?;
        Ok(self
            .cells
            .iter()
            .map(|c| {
                let diff = matrix[(c.row, c.col)] - c.value;
                diff * diff
            })
            .sum())
    }

    fn check_shape(&self, matrix: &DMatrix) -> Result<()> {
        if matrix.shape() == self.mask.shape() {
            Ok(())
        } else {
            Err(CompletionError::dimension_mismatch(
                format!("{:?}", self.mask.shape()),
                format!("{:?}", matrix.shape()),
            ))
        }
    }
}
