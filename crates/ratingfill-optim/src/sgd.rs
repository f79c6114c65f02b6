//! Mini-batch stochastic gradient descent with finite-difference derivatives.
//!
//! # Algorithm Overview
//!
//! Starting from a given parameter vector, every epoch:
//! 1. Shuffles all parameter indices
//! 2. Splits them into batches of `batch_size`; a trailing partial batch is
//!    dropped, so those parameters are not updated in that epoch
//! 3. For each batch, estimates the central-difference derivative along the
//!    batch direction (two loss evaluations)
//! 4. Updates the batch parameters: `x_k -= (learning_rate / batch_size) · d`
//!
//! The loop is bounded by the number of epochs only; there is no convergence
//! test. If the loss becomes non-finite at the end of an epoch the optimizer
//! stops and reports [`TerminationReason::Diverged`].

use std::time::{Duration, Instant};

use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};
use ratingfill_core::{
    error::{OptimizerError, OptimizerResult},
    types::{constants::FINITE_DIFFERENCE_STEP, DVector},
};
use tracing::{debug, warn};

use crate::cost_function::CostFunction;

/// Configuration for the SGD optimizer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SGDConfig {
    /// Learning rate (`alpha`)
    pub learning_rate: f64,

    /// Number of parameters updated per step
    pub batch_size: usize,

    /// Number of passes over all parameters
    pub epochs: usize,

    /// Finite-difference step `h`
    pub step: f64,

    /// Seed of the index shuffling
    pub seed: u64,
}

impl Default for SGDConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            batch_size: 225,
            epochs: 20,
            step: FINITE_DIFFERENCE_STEP,
            seed: 0,
        }
    }
}

impl SGDConfig {
    /// Creates a new SGD configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the learning rate.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the number of epochs.
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Sets the finite-difference step.
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Sets the shuffling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> OptimizerResult<()> {
        if !self.learning_rate.is_finite() || self.learning_rate < 0.0 {
            return Err(OptimizerError::invalid_configuration(
                "learning rate must be finite and non-negative",
                "learning_rate",
                self.learning_rate.to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(OptimizerError::invalid_configuration(
                "batch size must be at least 1",
                "batch_size",
                "0",
            ));
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(OptimizerError::invalid_configuration(
                "finite-difference step must be finite and positive",
                "step",
                self.step.to_string(),
            ));
        }
        Ok(())
    }
}

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerminationReason {
    /// All configured epochs ran.
    MaxEpochs,
    /// The loss became NaN or infinite after the given epoch (1-based).
    Diverged {
        /// Epoch after which the loss was non-finite
        epoch: usize,
    },
}

/// Outcome of an optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Final parameter vector
    pub parameters: DVector,
    /// Loss at the final parameters
    pub value: f64,
    /// Loss before the first epoch
    pub initial_value: f64,
    /// Loss at the end of each completed epoch
    pub loss_history: Vec<f64>,
    /// Number of epochs that ran
    pub epochs: usize,
    /// Number of parameter updates (batches)
    pub updates: usize,
    /// Number of cost evaluations
    pub function_evaluations: usize,
    /// Wall-clock time
    pub duration: Duration,
    /// Reason for stopping
    pub termination: TerminationReason,
}

impl OptimizationResult {
    /// Returns `true` if the run stopped on a non-finite loss.
    pub fn diverged(&self) -> bool {
        matches!(self.termination, TerminationReason::Diverged { .. })
    }
}

/// Mini-batch stochastic gradient descent.
///
/// # Examples
///
/// ```rust
/// use ratingfill_optim::{SGD, SGDConfig};
///
/// let sgd = SGD::new(
///     SGDConfig::new()
///         .with_learning_rate(0.01)
///         .with_batch_size(225)
///         .with_epochs(20),
/// );
/// assert_eq!(sgd.name(), "Mini-batch SGD");
/// ```
#[derive(Debug, Clone)]
pub struct SGD {
    config: SGDConfig,
}

impl SGD {
    /// Creates a new SGD optimizer with the given configuration.
    pub fn new(config: SGDConfig) -> Self {
        Self { config }
    }

    /// Returns the optimizer configuration.
    pub fn config(&self) -> &SGDConfig {
        &self.config
    }

    /// Returns the optimizer name.
    pub fn name(&self) -> &str {
        "Mini-batch SGD"
    }

    /// Minimizes `cost_fn` starting from `initial`.
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` for an invalid [`SGDConfig`].
    /// - `DimensionMismatch` when `initial` does not match the cost.
    pub fn optimize<C>(&self, cost_fn: &C, initial: &DVector) -> OptimizerResult<OptimizationResult>
    where
        C: CostFunction,
    {
        self.config.validate()?;
        if initial.len() != cost_fn.dimension() {
            return Err(OptimizerError::dimension_mismatch(
                cost_fn.dimension(),
                initial.len(),
            ));
        }

        let start_time = Instant::now();
        let n = initial.len();
        let batch_size = self.config.batch_size;
        let batches_per_epoch = n / batch_size;
        if batches_per_epoch == 0 {
            warn!(
                parameters = n,
                batch_size, "batch size exceeds parameter count; no updates will be made"
            );
        }
        let scale = self.config.learning_rate / batch_size as f64;

        let mut rng = SmallRng::seed_from_u64(self.config.seed);
        let mut indices: Vec<usize> = (0..n).collect();
        let mut x = initial.clone();

        let initial_value = cost_fn.cost(&x)?;
        let mut function_evaluations = 1;
        let mut loss_history = Vec::with_capacity(self.config.epochs);
        let mut updates = 0;
        let mut termination = TerminationReason::MaxEpochs;

        for epoch in 1..=self.config.epochs {
            indices.shuffle(&mut rng);

            for batch in indices.chunks_exact(batch_size) {
                let derivative = cost_fn.batch_derivative_fd(&x, batch, self.config.step)?;
                function_evaluations += 2;
                for &k in batch {
                    x[k] -= scale * derivative;
                }
                updates += 1;
            }

            let loss = cost_fn.cost(&x)?;
            function_evaluations += 1;
            loss_history.push(loss);
            debug!(epoch, loss, "SGD epoch finished");

            if !loss.is_finite() {
                warn!(epoch, loss, "SGD diverged");
                termination = TerminationReason::Diverged { epoch };
                break;
            }
        }

        let value = loss_history.last().copied().unwrap_or(initial_value);
        Ok(OptimizationResult {
            parameters: x,
            value,
            initial_value,
            epochs: loss_history.len(),
            loss_history,
            updates,
            function_evaluations,
            duration: start_time.elapsed(),
            termination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[derive(Debug)]
    struct Quadratic {
        dim: usize,
    }

    impl CostFunction for Quadratic {
        fn dimension(&self) -> usize {
            self.dim
        }

        fn cost(&self, params: &DVector) -> OptimizerResult<f64> {
            Ok(params.norm_squared())
        }
    }

    #[test]
    fn test_sgd_creation() {
        let sgd = SGD::new(SGDConfig::new().with_learning_rate(0.5).with_batch_size(4));
        assert_eq!(sgd.name(), "Mini-batch SGD");
        assert_relative_eq!(sgd.config().learning_rate, 0.5);
        assert_eq!(sgd.config().batch_size, 4);
        assert_eq!(sgd.config().epochs, 20);
    }

    #[test]
    fn test_config_validation() {
        assert!(SGDConfig::new().validate().is_ok());
        assert!(SGDConfig::new().with_batch_size(0).validate().is_err());
        assert!(SGDConfig::new().with_learning_rate(-1.0).validate().is_err());
        assert!(SGDConfig::new().with_learning_rate(f64::NAN).validate().is_err());
        assert!(SGDConfig::new().with_step(0.0).validate().is_err());
    }

    #[test]
    fn test_single_parameter_batches_descend() {
        let cost = Quadratic { dim: 4 };
        let x0 = DVector::from_element(4, 1.0);
        let sgd = SGD::new(
            SGDConfig::new()
                .with_learning_rate(0.1)
                .with_batch_size(1)
                .with_epochs(30),
        );

        let result = sgd.optimize(&cost, &x0).unwrap();
        assert_eq!(result.termination, TerminationReason::MaxEpochs);
        assert_eq!(result.epochs, 30);
        assert_eq!(result.updates, 120);
        assert!(result.value < 1e-3 * result.initial_value);
    }

    #[test]
    fn test_partial_batch_is_dropped() {
        let cost = Quadratic { dim: 5 };
        let x0 = DVector::from_element(5, 1.0);
        let sgd = SGD::new(SGDConfig::new().with_batch_size(2).with_epochs(1));

        let result = sgd.optimize(&cost, &x0).unwrap();
        assert_eq!(result.updates, 2);
        // Exactly one parameter was left out of every batch.
        let untouched = result.parameters.iter().filter(|&&v| v == 1.0).count();
        assert_eq!(untouched, 1);
    }

    /// Quadratic that overflows to infinity outside a ball.
    #[derive(Debug)]
    struct Exploding;

    impl CostFunction for Exploding {
        fn dimension(&self) -> usize {
            2
        }

        fn cost(&self, params: &DVector) -> OptimizerResult<f64> {
            let sq = params.norm_squared();
            Ok(if sq > 1e6 { f64::INFINITY } else { sq })
        }
    }

    #[test]
    fn test_divergence_is_reported() {
        let cost = Exploding;
        let x0 = DVector::from_element(2, 1.0);
        let sgd = SGD::new(
            SGDConfig::new()
                .with_learning_rate(1e6)
                .with_batch_size(1)
                .with_epochs(200),
        );

        let result = sgd.optimize(&cost, &x0).unwrap();
        assert!(result.diverged());
        assert!(result.epochs < 200);
        assert!(!result.value.is_finite());
    }

    #[test]
    fn test_dimension_mismatch() {
        let cost = Quadratic { dim: 3 };
        let sgd = SGD::new(SGDConfig::new());
        assert!(matches!(
            sgd.optimize(&cost, &DVector::zeros(2)),
            Err(OptimizerError::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }
}
