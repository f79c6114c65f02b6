//! Algorithm selection and dispatch.
//!
//! The supported algorithms form a closed set. [`AlgorithmKind`] parses the
//! command-line name, [`Algorithm`] carries the hyperparameters of the
//! selected variant and dispatches to its approximator.

use std::fmt;
use std::str::FromStr;

use ratingfill_core::{
    context::EvaluationContext,
    error::{CompletionError, Result},
    types::DMatrix,
};
use tracing::warn;

use crate::{
    composite::NmfSvdIterate,
    gradient::GradientFactorization,
    nmf::Nmf,
    result::{check_iterations, check_rank, ApproximationResult, Approximator},
    svd::{SvdIterate, SvdTruncate},
};

/// Name of a supported algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlgorithmKind {
    /// Truncated SVD
    Svd1,
    /// Iterated truncated SVD with reinjection
    Svd2,
    /// Nonnegative matrix factorization
    Nmf,
    /// Iterated NMF followed by iterated SVD
    Nmf2Svd2,
    /// Gradient factorization
    Sgd,
}

impl AlgorithmKind {
    /// Every supported algorithm.
    pub const ALL: [Self; 5] = [Self::Nmf, Self::Svd1, Self::Svd2, Self::Sgd, Self::Nmf2Svd2];

    /// Command-line name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Svd1 => "SVD1",
            Self::Svd2 => "SVD2",
            Self::Nmf => "NMF",
            Self::Nmf2Svd2 => "NMF2_SVD2",
            Self::Sgd => "SGD",
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmKind {
    type Err = CompletionError;

    /// Names are matched exactly, case included.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| CompletionError::unknown_algorithm(s))
    }
}

/// Optional hyperparameter overrides, typically from the command line.
///
/// Fields that do not apply to the selected algorithm are ignored with a
/// warning.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Overrides {
    /// Rank `r`
    pub rank: Option<usize>,
    /// Round count `i`
    pub iterations: Option<usize>,
    /// SGD learning rate
    pub learning_rate: Option<f64>,
    /// SGD batch size
    pub batch_size: Option<usize>,
    /// SGD epochs
    pub epochs: Option<usize>,
    /// Seed of NMF initialization or SGD shuffling
    pub seed: Option<u64>,
}

/// A configured algorithm.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    /// `SVD1`
    Svd1(SvdTruncate),
    /// `SVD2`
    Svd2(SvdIterate),
    /// `NMF`
    Nmf(Nmf),
    /// `NMF2_SVD2`
    Nmf2Svd2(NmfSvdIterate),
    /// `SGD`
    Sgd(GradientFactorization),
}

impl Algorithm {
    /// The algorithm with its default hyperparameters.
    pub fn with_defaults(kind: AlgorithmKind) -> Self {
        match kind {
            AlgorithmKind::Svd1 => Self::Svd1(SvdTruncate::default()),
            AlgorithmKind::Svd2 => Self::Svd2(SvdIterate::default()),
            AlgorithmKind::Nmf => Self::Nmf(Nmf::default()),
            AlgorithmKind::Nmf2Svd2 => Self::Nmf2Svd2(NmfSvdIterate::default()),
            AlgorithmKind::Sgd => Self::Sgd(GradientFactorization::default()),
        }
    }

    /// Which algorithm this is.
    pub fn kind(&self) -> AlgorithmKind {
        match self {
            Self::Svd1(_) => AlgorithmKind::Svd1,
            Self::Svd2(_) => AlgorithmKind::Svd2,
            Self::Nmf(_) => AlgorithmKind::Nmf,
            Self::Nmf2Svd2(_) => AlgorithmKind::Nmf2Svd2,
            Self::Sgd(_) => AlgorithmKind::Sgd,
        }
    }

    /// Command-line name.
    pub fn name(&self) -> &'static str {
        self.as_approximator().name()
    }

    /// Applies the overrides that make sense for this algorithm.
    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        let kind = self.kind();
        let ignored = |field: &str| warn!(algorithm = %kind, field, "override ignored");

        match &mut self {
            Self::Svd1(params) => {
                if let Some(rank) = overrides.rank {
                    params.rank = rank;
                }
                if overrides.iterations.is_some() {
                    ignored("iterations");
                }
            }
            Self::Svd2(params) => {
                if let Some(rank) = overrides.rank {
                    params.rank = rank;
                }
                if let Some(iterations) = overrides.iterations {
                    params.iterations = iterations;
                }
            }
            Self::Nmf(params) => {
                if let Some(rank) = overrides.rank {
                    params.rank = rank;
                }
                if let Some(seed) = overrides.seed {
                    params.solver.seed = seed;
                }
                if overrides.iterations.is_some() {
                    ignored("iterations");
                }
            }
            Self::Nmf2Svd2(params) => {
                if let Some(rank) = overrides.rank {
                    params.rank = rank;
                }
                if let Some(iterations) = overrides.iterations {
                    params.iterations = iterations;
                }
                if let Some(seed) = overrides.seed {
                    params.solver.seed = seed;
                }
            }
            Self::Sgd(params) => {
                if let Some(rank) = overrides.rank {
                    params.rank = rank;
                }
                if let Some(learning_rate) = overrides.learning_rate {
                    params.sgd.learning_rate = learning_rate;
                }
                if let Some(batch_size) = overrides.batch_size {
                    params.sgd.batch_size = batch_size;
                }
                if let Some(epochs) = overrides.epochs {
                    params.sgd.epochs = epochs;
                }
                if let Some(seed) = overrides.seed {
                    params.sgd.seed = seed;
                }
                if overrides.iterations.is_some() {
                    ignored("iterations");
                }
            }
        }

        if kind != AlgorithmKind::Sgd {
            let sgd_only = [
                ("learning_rate", overrides.learning_rate.is_some()),
                ("batch_size", overrides.batch_size.is_some()),
                ("epochs", overrides.epochs.is_some()),
            ];
            for &(field, set) in &sgd_only {
                if set {
                    ignored(field);
                }
            }
        }
        if matches!(kind, AlgorithmKind::Svd1 | AlgorithmKind::Svd2) && overrides.seed.is_some() {
            ignored("seed");
        }
        self
    }

    /// The approximator behind this variant.
    pub fn as_approximator(&self) -> &dyn Approximator {
        match self {
            Self::Svd1(params) => params,
            Self::Svd2(params) => params,
            Self::Nmf(params) => params,
            Self::Nmf2Svd2(params) => params,
            Self::Sgd(params) => params,
        }
    }

    /// Checks the hyperparameters that do not depend on the data.
    ///
    /// The `rank <= min(n, d)` bound of the SVD variants needs the matrix
    /// shape and is checked by [`Algorithm::approximate`].
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` for a zero rank or round count.
    /// - `Optimizer(InvalidConfiguration)` for an invalid SGD setting.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Svd1(params) => check_rank(params.rank, usize::MAX),
            Self::Svd2(params) => {
                check_rank(params.rank, usize::MAX)?;
                check_iterations(params.iterations)
            }
            Self::Nmf(params) => check_rank(params.rank, usize::MAX),
            Self::Nmf2Svd2(params) => {
                check_rank(params.rank, usize::MAX)?;
                check_iterations(params.iterations)
            }
            Self::Sgd(params) => {
                check_rank(params.rank, usize::MAX)?;
                params.sgd.validate()?;
                Ok(())
            }
        }
    }

    /// Runs the algorithm on `input`.
    pub fn approximate(&self, ctx: &EvaluationContext, input: &DMatrix) -> Result<ApproximationResult> {
        self.as_approximator().approximate(ctx, input)
    }
}

impl FromStr for Algorithm {
    type Err = CompletionError;

    /// Parses a name into the algorithm with default hyperparameters.
    fn from_str(s: &str) -> Result<Self> {
        s.parse::<AlgorithmKind>().map(Self::with_defaults)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
