//! Gradient factorization optimizer for rating completion.
//!
//! This crate fits a two-factor model `W · H` to the observed training cells
//! by mini-batch stochastic gradient descent. Derivatives are estimated with
//! central finite differences of the squared-error loss.
//!
//! # Components
//!
//! - [`FactorShape`]: layout of `W` and `H` inside the flat parameter vector
//! - [`LossContext`]: squared-error loss over the observed cells
//! - [`SGD`]: epoch-bounded mini-batch optimizer
//!
//! # Examples
//!
//! ```rust
//! use ratingfill_core::matrix::ObservedCell;
//! use ratingfill_optim::{FactorShape, LossContext, SGD, SGDConfig};
//!
//! let cells = vec![ObservedCell::new(0, 0, 5.0), ObservedCell::new(1, 1, 3.0)];
//! let shape = FactorShape::new(2, 2, 1).unwrap();
//! let loss = LossContext::new(shape, &cells);
//!
//! let sgd = SGD::new(SGDConfig::new().with_batch_size(1).with_epochs(5));
//! let result = sgd.optimize(&loss, &shape.constant(0.825)).unwrap();
//! assert_eq!(result.epochs, 5);
//! ```

pub mod cost_function;
pub mod parameters;
pub mod sgd;

// Re-export main items for convenience
pub use cost_function::{CostFunction, LossContext};
pub use parameters::FactorShape;
pub use sgd::{OptimizationResult, SGDConfig, TerminationReason, SGD};
