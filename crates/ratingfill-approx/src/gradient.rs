//! Gradient factorization (`SGD`).
//!
//! Fits `W · H` directly to the observed training cells with the mini-batch
//! optimizer of `ratingfill-optim`. The dense input matrix is not used as a
//! starting point: every factor entry starts at the same constant value, and
//! only the observed cells enter the loss.

use ratingfill_core::{
    context::EvaluationContext,
    error::Result,
    types::{constants::PARAMETER_INITIAL_VALUE, DMatrix},
};
use ratingfill_optim::{FactorShape, LossContext, SGDConfig, TerminationReason, SGD};
use tracing::{info, instrument};

use crate::result::{check_input, ApproximationResult, Approximator};

/// Default rank of [`GradientFactorization`].
pub const DEFAULT_SGD_RANK: usize = 5;

/// Factorization trained by mini-batch SGD.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GradientFactorization {
    /// Inner dimension of the factors
    pub rank: usize,
    /// Optimizer settings
    pub sgd: SGDConfig,
    /// Value every parameter starts from
    pub initial_value: f64,
}

impl Default for GradientFactorization {
    fn default() -> Self {
        Self {
            rank: DEFAULT_SGD_RANK,
            sgd: SGDConfig::default(),
            initial_value: PARAMETER_INITIAL_VALUE,
        }
    }
}

impl GradientFactorization {
    /// Creates the approximator with default optimizer settings.
    pub fn new(rank: usize) -> Self {
        Self {
            rank,
            ..Self::default()
        }
    }

    /// Replaces the optimizer settings.
    pub fn with_sgd(mut self, sgd: SGDConfig) -> Self {
        self.sgd = sgd;
        self
    }

    /// Sets the starting value of every parameter.
    pub fn with_initial_value(mut self, initial_value: f64) -> Self {
        self.initial_value = initial_value;
        self
    }

    fn description(&self) -> String {
        format!(
            "SGD with r = {}, alpha = {}, bs = {}",
            self.rank, self.sgd.learning_rate, self.sgd.batch_size
        )
    }
}

impl Approximator for GradientFactorization {
    fn name(&self) -> &'static str {
        "SGD"
    }

    #[instrument(skip_all, fields(rank = self.rank, epochs = self.sgd.epochs))]
    fn approximate(&self, ctx: &EvaluationContext, input: &DMatrix) -> Result<ApproximationResult> {
        check_input(ctx, input)?;
        let (n_rows, n_cols) = ctx.shape();
        let shape = FactorShape::new(n_rows, n_cols, self.rank)?;
        let loss = LossContext::new(shape, ctx.mask().cells());
        let initial = shape.constant(self.initial_value);

        let before = ctx.training_rmse(&shape.reconstruct(&initial)?)?;
        let outcome = SGD::new(self.sgd.clone()).optimize(&loss, &initial)?;
        info!(
            epochs = outcome.epochs,
            updates = outcome.updates,
            evaluations = outcome.function_evaluations,
            loss = outcome.value,
            "SGD finished"
        );

        let approx = shape.reconstruct(&outcome.parameters)?;
        let after = ctx.training_rmse(&approx)?;
        let result = ApproximationResult::new(approx, &self.description(), before, after);
        Ok(match outcome.termination {
            TerminationReason::Diverged { epoch } => {
                result.with_degenerate(format!("loss diverged at epoch {epoch}"))
            }
            TerminationReason::MaxEpochs => result,
        })
    }
}
