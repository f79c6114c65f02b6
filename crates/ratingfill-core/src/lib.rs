//! Core data model for low-rank rating completion.
//!
//! This crate turns sparse `(user, item, rating)` observations into the dense
//! objects every completion algorithm works on, and provides the evaluation
//! protocol used to compare them.
//!
//! # Key Concepts
//!
//! - **Identifier index**: raw ids to contiguous row/column ordinals
//! - **Rating matrix**: dense `n_users × n_items` matrix, zero where unknown
//! - **Observed mask**: the fixed set of cells with a training rating
//! - **Baselines**: user-average, item-average and blended estimates
//! - **RMSE**: root-mean-square error over test or training cells
//!
//! # Modules
//!
//! - [`baseline`]: Baseline estimators and blend weight search
//! - [`context`]: The per-run evaluation context
//! - [`error`]: Error types
//! - [`evaluation`]: RMSE evaluator and test set resolution
//! - [`index`]: Identifier index
//! - [`matrix`]: Dense rating matrix and observed mask
//! - [`ratings`]: Rating records
//! - [`types`]: Type aliases and numerical constants

pub mod baseline;
pub mod context;
pub mod error;
pub mod evaluation;
pub mod index;
pub mod matrix;
pub mod ratings;
pub mod types;

// Re-export commonly used items at the crate root
pub use error::{CompletionError, IdKind, OptimizerError, OptimizerResult, Result};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use ratingfill_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::baseline::{BaselineEstimates, BlendSelection, MissingUserPolicy};
    pub use crate::context::{EvaluationContext, InputMatrix};
    pub use crate::error::{CompletionError, IdKind, OptimizerError, OptimizerResult, Result};
    pub use crate::evaluation::{format_improvement, improvement_percent, rmse, TestSet};
    pub use crate::index::IdentifierIndex;
    pub use crate::matrix::{ObservedCell, ObservedMask, RatingMatrix};
    pub use crate::ratings::RatingRecord;
    pub use crate::types::{constants, DMatrix, DVector, RawId};
}
