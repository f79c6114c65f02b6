//! Nonnegative matrix factorization.
//!
//! # Algorithm Overview
//!
//! A nonnegative `n × d` matrix `X` is approximated by `W · H` with
//! `W ≥ 0` (`n × r`) and `H ≥ 0` (`r × d`), minimizing `‖X - W·H‖_F`.
//!
//! [`MultiplicativeUpdate`] uses the Lee–Seung rules
//!
//! ```text
//! W ← W ∘ (X·Hᵀ) / (W·H·Hᵀ + ε)
//! H ← H ∘ (Wᵀ·X) / (Wᵀ·W·H + ε)
//! ```
//!
//! which keep both factors nonnegative. Factors start from scaled absolute
//! standard normal draws, `sqrt(mean(X) / r) · |N(0, 1)|`, with a fixed seed
//! so repeated runs give the same factorization. Every ten iterations the
//! reconstruction error is measured and the loop stops once the relative
//! decrease since the last check falls below the tolerance.

use std::fmt::Debug;

use rand::{rngs::SmallRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use ratingfill_core::{
    context::EvaluationContext,
    error::{CompletionError, Result},
    types::{
        constants::{NMF_DENOMINATOR_EPSILON, NMF_SEED},
        DMatrix,
    },
};
use tracing::{debug, instrument, warn};

use crate::result::{check_input, check_rank, ApproximationResult, Approximator};

/// Default rank of [`Nmf`].
pub const DEFAULT_NMF_RANK: usize = 10;

/// Number of iterations between two convergence checks.
const CHECK_INTERVAL: usize = 10;

/// Output of a factorization.
#[derive(Debug, Clone)]
pub struct NmfFactors {
    /// Row factor (`n × r`)
    pub w: DMatrix,
    /// Column factor (`r × d`)
    pub h: DMatrix,
    /// Iterations performed
    pub iterations: usize,
    /// Final Frobenius reconstruction error
    pub reconstruction_error: f64,
    /// Whether the tolerance was reached before the iteration limit
    pub converged: bool,
}

impl NmfFactors {
    /// The product `W · H`.
    pub fn reconstruct(&self) -> DMatrix {
        &self.w * &self.h
    }
}

/// Solver producing nonnegative factors.
pub trait NonnegativeFactorizer: Debug {
    /// Factorizes `matrix` into nonnegative factors of inner dimension `rank`.
    fn factorize(&self, matrix: &DMatrix, rank: usize) -> Result<NmfFactors>;
}

/// Lee–Seung multiplicative update solver.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiplicativeUpdate {
    /// Iteration limit
    pub max_iterations: usize,
    /// Relative error decrease below which the solver stops
    pub tolerance: f64,
    /// Seed of the factor initialization
    pub seed: u64,
}

impl Default for MultiplicativeUpdate {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-4,
            seed: NMF_SEED,
        }
    }
}

impl MultiplicativeUpdate {
    /// Creates a solver with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the iteration limit.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the initialization seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn initial_factors(&self, matrix: &DMatrix, rank: usize) -> (DMatrix, DMatrix) {
        let (n_rows, n_cols) = matrix.shape();
        let scale = (matrix.mean() / rank as f64).sqrt();
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut draw = || scale * rng.sample::<f64, _>(StandardNormal).abs();
        let h = DMatrix::from_fn(rank, n_cols, |_, _| draw());
        let w = DMatrix::from_fn(n_rows, rank, |_, _| draw());
        (w, h)
    }
}

/// `base ← base ∘ numer / (denom + ε)`, element by element.
fn multiplicative_update(base: &mut DMatrix, numer: &DMatrix, denom: &DMatrix) {
    for ((b, n), d) in base.iter_mut().zip(numer.iter()).zip(denom.iter()) {
        *b *= n / (d + NMF_DENOMINATOR_EPSILON);
    }
}

impl NonnegativeFactorizer for MultiplicativeUpdate {
    fn factorize(&self, matrix: &DMatrix, rank: usize) -> Result<NmfFactors> {
        check_rank(rank, usize::MAX)?;
        if matrix.is_empty() {
            return Err(CompletionError::empty_dataset("NMF input matrix"));
        }
        if let Some(bad) = matrix.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(CompletionError::invalid_parameter(
                "matrix",
                bad,
                "NMF requires finite nonnegative entries",
            ));
        }

        let (mut w, mut h) = self.initial_factors(matrix, rank);
        let initial_error = (matrix - &w * &h).norm();
        let mut previous_error = initial_error;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            iterations += 1;

            let numer = matrix * h.transpose();
            let denom = &w * (&h * h.transpose());
            multiplicative_update(&mut w, &numer, &denom);

            let numer = w.tr_mul(matrix);
            let denom = w.tr_mul(&w) * &h;
            multiplicative_update(&mut h, &numer, &denom);

            if self.tolerance > 0.0 && iterations % CHECK_INTERVAL == 0 {
                let error = (matrix - &w * &h).norm();
                debug!(iterations, error, "NMF convergence check");
                if initial_error == 0.0 || (previous_error - error) / initial_error < self.tolerance {
                    converged = true;
                    break;
                }
                previous_error = error;
            }
        }

        if !converged && self.tolerance > 0.0 {
            warn!(
                max_iterations = self.max_iterations,
                "NMF reached the iteration limit before converging"
            );
        }

        let reconstruction_error = (matrix - &w * &h).norm();
        Ok(NmfFactors {
            w,
            h,
            iterations,
            reconstruction_error,
            converged,
        })
    }
}

/// Factorizes `matrix` and returns the product of the factors.
pub fn nmf_reconstruct(
    factorizer: &dyn NonnegativeFactorizer,
    matrix: &DMatrix,
    rank: usize,
) -> Result<DMatrix> {
    Ok(factorizer.factorize(matrix, rank)?.reconstruct())
}

/// Single nonnegative factorization (`NMF`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Nmf {
    /// Inner dimension of the factors
    pub rank: usize,
    /// Solver settings
    pub solver: MultiplicativeUpdate,
}

impl Default for Nmf {
    fn default() -> Self {
        Self {
            rank: DEFAULT_NMF_RANK,
            solver: MultiplicativeUpdate::default(),
        }
    }
}

impl Nmf {
    /// Creates the approximator with default solver settings.
    pub fn new(rank: usize) -> Self {
        Self {
            rank,
            ..Self::default()
        }
    }

    /// Replaces the solver settings.
    pub fn with_solver(mut self, solver: MultiplicativeUpdate) -> Self {
        self.solver = solver;
        self
    }
}

impl Approximator for Nmf {
    fn name(&self) -> &'static str {
        "NMF"
    }

    #[instrument(skip_all, fields(rank = self.rank))]
    fn approximate(&self, ctx: &EvaluationContext, input: &DMatrix) -> Result<ApproximationResult> {
        check_input(ctx, input)?;
        let before = ctx.training_rmse(input)?;
        let factors = self.solver.factorize(input, self.rank)?;
        debug!(
            iterations = factors.iterations,
            error = factors.reconstruction_error,
            "NMF finished"
        );
        let approx = factors.reconstruct();
        let after = ctx.training_rmse(&approx)?;
        Ok(ApproximationResult::new(
            approx,
            &format!("NMF with r = {}", self.rank),
            before,
            after,
        ))
    }
}
