//! Flat parameter vector of a two-factor factorization.
//!
//! A rank-`r` factorization of an `n × d` matrix is stored as one vector of
//! length `r · (n + d)`:
//!
//! ```text
//! [ W (n × r, row-major) | H (r × d, row-major) ]
//! ```
//!
//! and the predicted matrix is `W · H`.

use nalgebra::DMatrix as NaMatrix;
use ratingfill_core::{
    error::{OptimizerError, OptimizerResult},
    types::{DMatrix, DVector},
};

/// Layout of the factor blocks inside a parameter vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FactorShape {
    n_rows: usize,
    n_cols: usize,
    rank: usize,
}

impl FactorShape {
    /// Creates the layout for an `n_rows × n_cols` matrix with `rank` factors.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when `rank` is zero.
    pub fn new(n_rows: usize, n_cols: usize, rank: usize) -> OptimizerResult<Self> {
        if rank == 0 {
            return Err(OptimizerError::invalid_configuration(
                "rank must be at least 1",
                "rank",
                "0",
            ));
        }
        Ok(Self {
            n_rows,
            n_cols,
            rank,
        })
    }

    /// Number of rows of the predicted matrix.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns of the predicted matrix.
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of latent features.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Length of the row-factor block `W`.
    pub fn row_block_len(&self) -> usize {
        self.n_rows * self.rank
    }

    /// Total parameter count `r · (n + d)`.
    pub fn len(&self) -> usize {
        self.rank * (self.n_rows + self.n_cols)
    }

    /// Returns `true` for an empty layout.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector with every parameter set to `value`.
    pub fn constant(&self, value: f64) -> DVector {
        DVector::from_element(self.len(), value)
    }

    /// Checks that `params` matches this layout.
    pub fn check(&self, params: &DVector) -> OptimizerResult<()> {
        if params.len() == self.len() {
            Ok(())
        } else {
            Err(OptimizerError::dimension_mismatch(self.len(), params.len()))
        }
    }

    /// Position of `W[row, k]` in the flat vector.
    #[inline]
    pub fn row_factor_index(&self, row: usize, k: usize) -> usize {
        row * self.rank + k
    }

    /// Position of `H[k, col]` in the flat vector.
    #[inline]
    pub fn col_factor_index(&self, k: usize, col: usize) -> usize {
        self.row_block_len() + k * self.n_cols + col
    }

    /// Predicted value `(W · H)[row, col]` read directly from the flat vector.
    #[inline]
    pub fn predict(&self, params: &DVector, row: usize, col: usize) -> f64 {
        (0..self.rank)
            .map(|k| params[self.row_factor_index(row, k)] * params[self.col_factor_index(k, col)])
            .sum()
    }

    /// Reshapes `params` into the factor blocks `(W, H)`.
    pub fn split(&self, params: &DVector) -> OptimizerResult<(DMatrix, DMatrix)> {
        self.check(params)?;
        let split = self.row_block_len();
        let w = NaMatrix::from_row_slice(self.n_rows, self.rank, &params.as_slice()[..split]);
        let h = NaMatrix::from_row_slice(self.rank, self.n_cols, &params.as_slice()[split..]);
        Ok((w, h))
    }

    /// Flattens factor blocks back into a parameter vector.
    pub fn flatten(&self, w: &DMatrix, h: &DMatrix) -> OptimizerResult<DVector> {
        if w.shape() != (self.n_rows, self.rank) {
            return Err(OptimizerError::dimension_mismatch(
                self.row_block_len(),
                w.len(),
            ));
        }
        if h.shape() != (self.rank, self.n_cols) {
            return Err(OptimizerError::dimension_mismatch(
                self.len() - self.row_block_len(),
                h.len(),
            ));
        }
        let row_major = w
            .row_iter()
            .chain(h.row_iter())
            .flat_map(|row| row.iter().copied().collect::<Vec<_>>());
        Ok(DVector::from_iterator(self.len(), row_major))
    }

    /// The predicted matrix `W · H`.
    pub fn reconstruct(&self, params: &DVector) -> OptimizerResult<DMatrix> {
        let (w, h) = self.split(params)?;
        Ok(w * h)
    }
}
