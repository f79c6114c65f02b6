//! Evaluation context shared by every algorithm of a run.
//!
//! The context is built once from the train and test records and then passed
//! by reference to the approximators and the evaluator. It owns the
//! identifier indexes, the dense training matrix, the observed mask, the
//! baselines and the resolved test set. Nothing in it changes after
//! construction.

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::{
    baseline::{BaselineEstimates, MissingUserPolicy},
    error::{CompletionError, Result},
    evaluation::{self, TestSet},
    index::IdentifierIndex,
    matrix::{ObservedMask, RatingMatrix},
    ratings::{mean_rating, RatingRecord},
    types::DMatrix,
};

/// Dense matrix handed to an approximator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InputMatrix {
    /// User-average baseline
    User,
    /// Item-average baseline
    Item,
    /// Blended baseline
    #[default]
    Blend,
}

impl InputMatrix {
    /// Short name used in run logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::User => "user_average",
            Self::Item => "item_average",
            Self::Blend => "user_item_blend",
        }
    }
}

impl fmt::Display for InputMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InputMatrix {
    type Err = CompletionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "item" | "movie" => Ok(Self::Item),
            "blend" => Ok(Self::Blend),
            _ => Err(CompletionError::invalid_parameter(
                "input",
                s,
                "expected one of user, item, blend",
            )),
        }
    }
}

/// Precomputed state of an evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    users: IdentifierIndex,
    items: IdentifierIndex,
    ratings: RatingMatrix,
    mask: ObservedMask,
    baselines: BaselineEstimates,
    test: TestSet,
    global_mean: f64,
}

impl EvaluationContext {
    /// Builds the context from train and test records.
    ///
    /// # Errors
    ///
    /// - `EmptyDataset` when either input is empty.
    /// - `UserWithoutRatings` for test-only users under
    ///   [`MissingUserPolicy::Fail`].
    pub fn build(
        train: &[RatingRecord],
        test: &[RatingRecord],
        policy: MissingUserPolicy,
    ) -> Result<Self> {
        let global_mean =
            mean_rating(train).ok_or_else(|| CompletionError::empty_dataset("training set"))?;

        let users = IdentifierIndex::users(train, test);
        let items = IdentifierIndex::items(train, test);
        info!(
            users = users.len(),
            items = items.len(),
            train = train.len(),
            test = test.len(),
            "building rating matrix"
        );

        let ratings = RatingMatrix::from_ratings(train, &users, &items)?;
        let mask = ratings.observed_mask();
        let test = TestSet::resolve(test, &users, &items)?;
        let baselines = BaselineEstimates::build(train, &users, &items, &mask, policy)?;

        Ok(Self {
            users,
            items,
            ratings,
            mask,
            baselines,
            test,
            global_mean,
        })
    }

    /// User identifier index.
    pub fn users(&self) -> &IdentifierIndex {
        &self.users
    }

    /// Item identifier index.
    pub fn items(&self) -> &IdentifierIndex {
        &self.items
    }

    /// Zero-filled training matrix.
    pub fn ratings(&self) -> &RatingMatrix {
        &self.ratings
    }

    /// Observed training cells.
    pub fn mask(&self) -> &ObservedMask {
        &self.mask
    }

    /// Baseline matrices.
    pub fn baselines(&self) -> &BaselineEstimates {
        &self.baselines
    }

    /// Resolved test set.
    pub fn test_set(&self) -> &TestSet {
        &self.test
    }

    /// Mean of all training ratings.
    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    /// Matrix shape `(n_users, n_items)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.users.len(), self.items.len())
    }

    /// Selects one of the baseline matrices.
    pub fn input(&self, which: InputMatrix) -> &DMatrix {
        match which {
            InputMatrix::User => &self.baselines.user,
            InputMatrix::Item => &self.baselines.item,
            InputMatrix::Blend => &self.baselines.blend,
        }
    }

    /// RMSE of `approx` against the test ratings.
    pub fn test_rmse(&self, approx: &DMatrix) -> Result<f64> {
        self.test.rmse(approx)
    }

    /// RMSE of `approx` against the observed training cells.
    pub fn training_rmse(&self, approx: &DMatrix) -> Result<f64> {
        evaluation::rmse(approx, self.mask.cells())
    }
}
