//! Error types for rating completion.
//!
//! This module defines the error types used throughout the workspace. They
//! follow the three failure families of an evaluation run:
//!
//! - **Configuration errors**: unknown algorithm, unreadable input, missing
//!   columns, invalid hyperparameters. Raised before any computation.
//! - **Data errors**: identifiers absent from the index, users without
//!   training ratings, empty datasets.
//! - **Numerical errors**: failed decompositions and invalid numeric state.
//!   Divergence of the gradient optimizer is reported through the result
//!   status instead of an error.

use std::fmt;
use thiserror::Error;

/// Which identifier space a raw id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IdKind {
    /// Row identifiers (`userId`).
    User,
    /// Column identifiers (`movieId`).
    Item,
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Item => write!(f, "item"),
        }
    }
}

/// Errors that can occur while building or evaluating a completion run.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    /// Algorithm name outside the supported set.
    #[error("Unknown algorithm '{name}' (expected one of NMF, SVD1, SVD2, SGD, NMF2_SVD2)")]
    UnknownAlgorithm {
        /// The name that failed to parse
        name: String,
    },

    /// Identifier that was never seen in train or test.
    #[error("Unknown {kind} identifier: {id}")]
    UnknownIdentifier {
        /// Identifier space
        kind: IdKind,
        /// The raw identifier
        id: i64,
    },

    /// Input file lacks a required column.
    #[error("Missing required column '{column}' in {path}")]
    MissingColumn {
        /// Input file
        path: String,
        /// Column name
        column: String,
    },

    /// Malformed input row.
    #[error("Invalid input in {path} at line {line}: {reason}")]
    InvalidInput {
        /// Input file
        path: String,
        /// One-based line number
        line: u64,
        /// What went wrong
        reason: String,
    },

    /// File could not be opened, read or written.
    #[error("I/O error on {path}: {reason}")]
    Io {
        /// File involved
        path: String,
        /// Underlying error message
        reason: String,
    },

    /// A dataset that must not be empty is empty.
    #[error("Empty dataset: {what}")]
    EmptyDataset {
        /// Which dataset
        what: String,
    },

    /// A user has no training ratings, so its average is undefined.
    #[error("User {user_id} has no training ratings; user average is undefined")]
    UserWithoutRatings {
        /// Raw user identifier
        user_id: i64,
    },

    /// Dimension mismatch between matrices.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: String,
        /// Actual dimensions
        actual: String,
    },

    /// Hyperparameter outside its valid range.
    #[error("Invalid parameter {parameter} = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Offending value
        value: String,
        /// Constraint that was violated
        reason: String,
    },

    /// Numerical failure in a decomposition or factorization.
    #[error("Numerical error: {reason}")]
    NumericalError {
        /// Description of the numerical issue
        reason: String,
    },

    /// Propagated optimizer error.
    #[error("Optimizer failed: {0}")]
    Optimizer(#[from] OptimizerError),
}

impl CompletionError {
    /// Create an UnknownAlgorithm error.
    pub fn unknown_algorithm<S: Into<String>>(name: S) -> Self {
        Self::UnknownAlgorithm { name: name.into() }
    }

    /// Create an UnknownIdentifier error.
    pub fn unknown_identifier(kind: IdKind, id: i64) -> Self {
        Self::UnknownIdentifier { kind, id }
    }

    /// Create a MissingColumn error.
    pub fn missing_column<S1: Into<String>, S2: Into<String>>(path: S1, column: S2) -> Self {
        Self::MissingColumn {
            path: path.into(),
            column: column.into(),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input<S1: Into<String>, S2: Into<String>>(path: S1, line: u64, reason: S2) -> Self {
        Self::InvalidInput {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Create an Io error.
    pub fn io<S: Into<String>>(path: S, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Create an EmptyDataset error.
    pub fn empty_dataset<S: Into<String>>(what: S) -> Self {
        Self::EmptyDataset { what: what.into() }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: fmt::Display,
        S2: fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter<S1, S2, S3>(parameter: S1, value: S2, reason: S3) -> Self
    where
        S1: Into<String>,
        S2: fmt::Display,
        S3: Into<String>,
    {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a NumericalError.
    pub fn numerical_error<S: Into<String>>(reason: S) -> Self {
        Self::NumericalError {
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors caused by the run configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownAlgorithm { .. }
                | Self::MissingColumn { .. }
                | Self::InvalidInput { .. }
                | Self::Io { .. }
                | Self::InvalidParameter { .. }
                | Self::Optimizer(OptimizerError::InvalidConfiguration { .. })
        )
    }
}

/// Errors that can occur during gradient optimization.
#[derive(Debug, Clone, Error)]
pub enum OptimizerError {
    /// Invalid optimizer configuration.
    ///
    /// This error occurs when the optimizer is configured with invalid
    /// parameters (e.g., negative learning rate, zero batch size).
    #[error("Invalid optimizer configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was invalid
        value: String,
    },

    /// Parameter vector length does not match the factor layout.
    #[error("Parameter vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },
}

impl OptimizerError {
    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, S3>(reason: S1, parameter: S2, value: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }
}

/// Result type alias for completion operations.
pub type Result<T> = std::result::Result<T, CompletionError>;

/// Result type alias for optimizer operations.
pub type OptimizerResult<T> = std::result::Result<T, OptimizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CompletionError::unknown_algorithm("ALS");
        assert!(matches!(err, CompletionError::UnknownAlgorithm { .. }));
        assert!(err.to_string().contains("Unknown algorithm 'ALS'"));

        let err = CompletionError::unknown_identifier(IdKind::Item, 42);
        assert_eq!(err.to_string(), "Unknown item identifier: 42");

        let err = CompletionError::dimension_mismatch("(3, 2)", "(2, 3)");
        assert_eq!(err.to_string(), "Dimension mismatch: expected (3, 2), got (2, 3)");
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            CompletionError::missing_column("train.csv", "rating"),
            CompletionError::invalid_input("test.csv", 7, "rating is not a number"),
            CompletionError::empty_dataset("test set"),
            CompletionError::UserWithoutRatings { user_id: 9 },
            CompletionError::invalid_parameter("rank", 0, "must be at least 1"),
            CompletionError::numerical_error("SVD did not converge"),
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }

    #[test]
    fn test_optimizer_error_propagation() {
        let opt_err = OptimizerError::invalid_configuration("must be positive", "batch_size", "0");
        let err: CompletionError = opt_err.into();

        assert!(matches!(err, CompletionError::Optimizer(_)));
        assert!(err.to_string().contains("Optimizer failed"));
        assert!(err.to_string().contains("must be positive"));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_configuration_classification() {
        assert!(CompletionError::unknown_algorithm("KNN").is_configuration_error());
        assert!(!CompletionError::unknown_identifier(IdKind::User, 1).is_configuration_error());
        assert!(!CompletionError::numerical_error("nan").is_configuration_error());
        assert!(!CompletionError::Optimizer(OptimizerError::dimension_mismatch(4, 3))
            .is_configuration_error());
    }
}
