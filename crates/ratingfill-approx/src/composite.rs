//! Iterated NMF followed by iterated SVD (`NMF2_SVD2`).
//!
//! The first stage runs `i` nonnegative factorizations, reinjecting the
//! observed training cells between rounds exactly like [`SvdIterate`] does
//! for truncations. Its last round is not reinjected and feeds the second
//! stage, an [`SvdIterate`] with the same rank and round count. The summary
//! compares the final matrix against the original input.
//!
//! [`SvdIterate`]: crate::svd::SvdIterate

use ratingfill_core::{
    context::EvaluationContext, error::Result, matrix::ObservedMask, types::DMatrix,
};
use tracing::{debug, instrument};

use crate::{
    nmf::{nmf_reconstruct, MultiplicativeUpdate, NonnegativeFactorizer},
    result::{check_input, check_iterations, ApproximationResult, Approximator},
    svd::iterated_svd,
};

/// Default rank of [`NmfSvdIterate`].
pub const DEFAULT_COMPOSITE_RANK: usize = 5;
/// Default round count of both stages of [`NmfSvdIterate`].
pub const DEFAULT_COMPOSITE_ITERATIONS: usize = 5;

/// `iterations` NMF reconstructions with reinjection of the observed cells
/// between rounds. The last round is returned as is.
pub fn iterated_nmf(
    factorizer: &dyn NonnegativeFactorizer,
    matrix: &DMatrix,
    mask: &ObservedMask,
    rank: usize,
    iterations: usize,
) -> Result<DMatrix> {
    check_iterations(iterations)?;
    let mut current = matrix.clone();
    for round in 1..=iterations {
        current = nmf_reconstruct(factorizer, &current, rank)?;
        if round < iterations {
            mask.reinject(&mut current)?;
        }
        debug!(round, rank, "NMF round finished");
    }
    Ok(current)
}

/// Two-stage NMF then SVD approximator.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NmfSvdIterate {
    /// Rank of both stages
    pub rank: usize,
    /// Round count of both stages
    pub iterations: usize,
    /// Solver of the NMF stage
    pub solver: MultiplicativeUpdate,
}

impl Default for NmfSvdIterate {
    fn default() -> Self {
        Self {
            rank: DEFAULT_COMPOSITE_RANK,
            iterations: DEFAULT_COMPOSITE_ITERATIONS,
            solver: MultiplicativeUpdate::default(),
        }
    }
}

impl NmfSvdIterate {
    /// Creates the approximator with default solver settings.
    pub fn new(rank: usize, iterations: usize) -> Self {
        Self {
            rank,
            iterations,
            ..Self::default()
        }
    }

    /// Replaces the NMF solver settings.
    pub fn with_solver(mut self, solver: MultiplicativeUpdate) -> Self {
        self.solver = solver;
        self
    }

    fn description(&self) -> String {
        format!("NMF2_SVD2 with i = {}, r = {}", self.iterations, self.rank)
    }
}

impl Approximator for NmfSvdIterate {
    fn name(&self) -> &'static str {
        "NMF2_SVD2"
    }

    #[instrument(skip_all, fields(rank = self.rank, iterations = self.iterations))]
    fn approximate(&self, ctx: &EvaluationContext, input: &DMatrix) -> Result<ApproximationResult> {
        check_input(ctx, input)?;
        let before = ctx.training_rmse(input)?;

        let nmf_stage = iterated_nmf(&self.solver, input, ctx.mask(), self.rank, self.iterations)?;
        let approx = iterated_svd(&nmf_stage, ctx.mask(), self.rank, self.iterations)?;
        let after = ctx.training_rmse(&approx)?;
        Ok(ApproximationResult::new(approx, &self.description(), before, after))
    }
}
