//! Rating records read from the train and test inputs.

use crate::types::RawId;

/// One observed rating: `userId, movieId, rating, timestamp`.
///
/// Only the identifiers and the rating take part in completion; the timestamp
/// is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingRecord {
    /// Raw user identifier
    #[cfg_attr(feature = "serde", serde(rename = "userId"))]
    pub user_id: RawId,
    /// Raw item identifier
    #[cfg_attr(feature = "serde", serde(rename = "movieId"))]
    pub item_id: RawId,
    /// Rating value, expected strictly positive
    pub rating: f64,
    /// Unix timestamp of the rating
    #[cfg_attr(feature = "serde", serde(default))]
    pub timestamp: Option<i64>,
}

impl RatingRecord {
    /// Creates a record without a timestamp.
    pub fn new(user_id: RawId, item_id: RawId, rating: f64) -> Self {
        Self {
            user_id,
            item_id,
            rating,
            timestamp: None,
        }
    }

    /// Sets the timestamp.
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Mean of the ratings in `records`, or `None` for an empty slice.
pub fn mean_rating(records: &[RatingRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let sum: f64 = records.iter().map(|r| r.rating).sum();
    Some(sum / records.len() as f64)
}
