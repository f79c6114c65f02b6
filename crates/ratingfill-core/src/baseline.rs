//! Baseline estimators.
//!
//! Three dense estimates of the rating matrix, each used as the input of an
//! approximator or as a comparison baseline:
//!
//! - **User average**: row `i` holds the mean training rating of user `i`.
//! - **Item average**: column `j` holds the mean training rating of item `j`,
//!   or the global training mean for items without training ratings.
//! - **Blend**: `p · user + (1 - p) · item`, with `p` picked from the grid
//!   `{0, 0.05, ..., 1}` by minimizing the squared error on observed cells.
//!
//! After construction every observed cell of all three matrices is
//! overwritten with its training value, so the estimates only fill genuinely
//! missing cells.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::{
    error::{CompletionError, Result},
    index::IdentifierIndex,
    matrix::{ObservedCell, ObservedMask},
    ratings::{mean_rating, RatingRecord},
    types::{constants::BLEND_GRID_POINTS, DMatrix, RawId},
};

/// What to do with users that have no training ratings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MissingUserPolicy {
    /// Reject the run with `UserWithoutRatings`.
    #[default]
    Fail,
    /// Use the global training mean as the user's average.
    GlobalMean,
}

/// Outcome of the blend weight grid search.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendSelection {
    /// Selected weight of the user average
    pub weight: f64,
    /// Squared training error at the selected weight
    pub loss: f64,
    /// `(weight, loss)` for every grid point, ascending by weight
    pub grid: Vec<(f64, f64)>,
}

/// The three baseline matrices with observed cells already reinjected.
#[derive(Debug, Clone)]
pub struct BaselineEstimates {
    /// User-average matrix
    pub user: DMatrix,
    /// Item-average matrix
    pub item: DMatrix,
    /// Convex blend of the two
    pub blend: DMatrix,
    /// Grid search result behind `blend`
    pub selection: BlendSelection,
}

/// Mean rating per user ordinal.
///
/// Means are taken over all training rows, duplicates included.
///
/// # Errors
///
/// - `UnknownIdentifier` for users missing from the index.
/// - `UserWithoutRatings` under [`MissingUserPolicy::Fail`].
pub fn user_means(
    records: &[RatingRecord],
    users: &IdentifierIndex,
    global_mean: f64,
    policy: MissingUserPolicy,
) -> Result<Vec<f64>> {
    let sums = grouped_sums(records, users, |r| r.user_id)?;
    sums.iter()
        .enumerate()
        .map(|(ordinal, &(sum, count))| {
            if count > 0 {
                return Ok(sum / count as f64);
            }
            match policy {
                MissingUserPolicy::GlobalMean => Ok(global_mean),
                MissingUserPolicy::Fail => Err(CompletionError::UserWithoutRatings {
                    user_id: users.id(ordinal).unwrap_or_default(),
                }),
            }
        })
        .collect()
}

/// Mean rating per item ordinal, falling back to `global_mean`.
pub fn item_means(
    records: &[RatingRecord],
    items: &IdentifierIndex,
    global_mean: f64,
) -> Result<Vec<f64>> {
    let sums = grouped_sums(records, items, |r| r.item_id)?;
    Ok(sums
        .iter()
        .map(|&(sum, count)| {
            if count > 0 {
                sum / count as f64
            } else {
                global_mean
            }
        })
        .collect())
}

fn grouped_sums<F>(
    records: &[RatingRecord],
    index: &IdentifierIndex,
    key: F,
) -> Result<Vec<(f64, usize)>>
where
    F: Fn(&RatingRecord) -> RawId,
{
    let mut sums = vec![(0.0, 0_usize); index.len()];
    let mut cache: HashMap<RawId, usize> = HashMap::new();
    for record in records {
        let id = key(record);
        let ordinal = match cache.get(&id) {
            Some(&ordinal) => ordinal,
            None => {
                let ordinal = index.ordinal(id)?;
                cache.insert(id, ordinal);
                ordinal
            }
        };
        sums[ordinal].0 += record.rating;
        sums[ordinal].1 += 1;
    }
    Ok(sums)
}

/// Squared training error of the blend with user weight `p`.
pub fn blend_loss(p: f64, user_means: &[f64], item_means: &[f64], cells: &[ObservedCell]) -> f64 {
    cells
        .iter()
        .map(|c| {
            let estimate = p * user_means[c.row] + (1.0 - p) * item_means[c.col];
            let diff = estimate - c.value;
            diff * diff
        })
        .sum()
}

/// Exhaustive search of the blend weight over the 21-point grid.
///
/// The first weight reaching the minimal loss in ascending order wins.
pub fn select_blend_weight(
    user_means: &[f64],
    item_means: &[f64],
    cells: &[ObservedCell],
) -> BlendSelection {
    let steps = (BLEND_GRID_POINTS - 1) as f64;
    let grid: Vec<(f64, f64)> = (0..BLEND_GRID_POINTS)
        .map(|k| {
            let p = k as f64 / steps;
            (p, blend_loss(p, user_means, item_means, cells))
        })
        .collect();

    let mut best = (0.0, f64::INFINITY);
    for &(p, loss) in &grid {
        if loss < best.1 {
            best = (p, loss);
        }
    }
    if !best.1.is_finite() {
        best.1 = grid[0].1;
    }

    BlendSelection {
        weight: best.0,
        loss: best.1,
        grid,
    }
}

impl BaselineEstimates {
    /// Builds the three baselines and reinjects the training values.
    pub fn build(
        records: &[RatingRecord],
        users: &IdentifierIndex,
        items: &IdentifierIndex,
        mask: &ObservedMask,
        policy: MissingUserPolicy,
    ) -> Result<Self> {
        let global_mean =
            mean_rating(records).ok_or_else(|| CompletionError::empty_dataset("training set"))?;
        let user_means = user_means(records, users, global_mean, policy)?;
        let item_means = item_means(records, items, global_mean)?;

        let (n, d) = (users.len(), items.len());
        let mut user = DMatrix::from_fn(n, d, |i, _| user_means[i]);
        let mut item = DMatrix::from_fn(n, d, |_, j| item_means[j]);

        let selection = select_blend_weight(&user_means, &item_means, mask.cells());
        for (p, loss) in &selection.grid {
            debug!(weight = p, loss, "blend grid point");
        }
        info!(
            weight = selection.weight,
            loss = selection.loss,
            "selected user/item blend weight"
        );

        let p = selection.weight;
        let mut blend = &user * p + &item * (1.0 - p);

        mask.reinject(&mut user)?;
        mask.reinject(&mut item)?;
        mask.reinject(&mut blend)?;

        Ok(Self {
            user,
            item,
            blend,
            selection,
        })
    }
}
