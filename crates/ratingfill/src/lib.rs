//! # ratingfill
//!
//! Low-rank completion of sparse user–item rating matrices, evaluated by RMSE
//! on a held-out test set.
//!
//! A run loads train and test ratings, builds the dense rating matrix and its
//! baselines, approximates one baseline with a low-rank algorithm and scores
//! the approximation on the test ratings.
//!
//! ## Crates
//!
//! - [`ratingfill_core`]: data model, baselines, RMSE evaluation
//! - [`ratingfill_optim`]: mini-batch SGD over factor parameters
//! - [`ratingfill_approx`]: SVD, iterated SVD, NMF, NMF→SVD and SGD approximators
//!
//! ## Quick Start
//!
//! ```rust
//! use ratingfill::prelude::*;
//!
//! let train = vec![
//!     RatingRecord::new(1, 1, 5.0),
//!     RatingRecord::new(2, 2, 3.0),
//!     RatingRecord::new(3, 1, 4.0),
//! ];
//! let test = vec![RatingRecord::new(1, 2, 4.0)];
//! let ctx = EvaluationContext::build(&train, &test, MissingUserPolicy::Fail).unwrap();
//!
//! let runner = Runner::new(&ctx, InputMatrix::Blend);
//! let algorithm = Algorithm::Svd1(SvdTruncate::new(1));
//! let report = runner.run(&algorithm).unwrap();
//! assert!(report.test_rmse.is_finite());
//! ```

pub mod io;
pub mod runner;

pub use ratingfill_approx;
pub use ratingfill_core;
pub use ratingfill_optim;

// Re-export nalgebra for convenience
pub use nalgebra;

pub use runner::{execute, RunConfig, RunReport, Runner};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use ratingfill_approx::{
        Algorithm, AlgorithmKind, ApproximationResult, Approximator, GradientFactorization, Nmf,
        NmfSvdIterate, Overrides, ResultStatus, SvdIterate, SvdTruncate,
    };
    pub use ratingfill_core::prelude::*;
    pub use ratingfill_optim::SGDConfig;

    pub use crate::runner::{execute, RunConfig, RunReport, Runner};
}
