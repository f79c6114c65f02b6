//! Low-rank approximators for rating completion.
//!
//! Every approximator takes a dense, fully filled `n × d` matrix (one of the
//! baselines of the [`EvaluationContext`]) and returns a dense approximation
//! of the same shape, together with a one-line summary of how much the
//! training reconstruction error changed.
//!
//! # Algorithms
//!
//! | Name        | Type                      | Defaults        |
//! |-------------|---------------------------|-----------------|
//! | `SVD1`      | [`SvdTruncate`]           | `r = 5`         |
//! | `SVD2`      | [`SvdIterate`]            | `i = 10, r = 3` |
//! | `NMF`       | [`Nmf`]                   | `r = 10`        |
//! | `NMF2_SVD2` | [`NmfSvdIterate`]         | `i = 5, r = 5`  |
//! | `SGD`       | [`GradientFactorization`] | `r = 5, alpha = 0.01, bs = 225, 20 epochs` |
//!
//! # Examples
//!
//! ```rust
//! use ratingfill_approx::{Algorithm, AlgorithmKind};
//!
//! let alg: Algorithm = "SVD2".parse().unwrap();
//! assert_eq!(alg.kind(), AlgorithmKind::Svd2);
//! assert!("PCA".parse::<Algorithm>().is_err());
//! ```
//!
//! [`EvaluationContext`]: ratingfill_core::context::EvaluationContext

pub mod algorithm;
pub mod composite;
pub mod gradient;
pub mod nmf;
pub mod result;
pub mod svd;

// Re-export main items for convenience
pub use algorithm::{Algorithm, AlgorithmKind, Overrides};
pub use composite::{iterated_nmf, NmfSvdIterate};
pub use gradient::GradientFactorization;
pub use nmf::{MultiplicativeUpdate, Nmf, NmfFactors, NonnegativeFactorizer};
pub use result::{ApproximationResult, Approximator, ResultStatus};
pub use svd::{iterated_svd, truncated_svd, SvdIterate, SvdTruncate};
