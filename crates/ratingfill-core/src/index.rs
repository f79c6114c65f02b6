//! Identifier index: raw ids to dense matrix positions.
//!
//! Users and items are indexed differently and the difference is kept on
//! purpose for compatibility with previously recorded results:
//!
//! - **Items** are ordered by ascending raw id over the union of train and
//!   test items.
//! - **Users** keep the order in which they are first encountered in the
//!   training rows, followed by test-only users in test encounter order.
//!
//! Every identifier of train or test owns exactly one ordinal and ordinals
//! are contiguous from zero, so a lookup only fails for ids that appear in
//! neither input.

use std::collections::HashMap;

use crate::{
    error::{CompletionError, IdKind, Result},
    ratings::RatingRecord,
    types::RawId,
};

/// Bidirectional mapping between raw identifiers and ordinals in `[0, len)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierIndex {
    kind: IdKind,
    ids: Vec<RawId>,
    ordinals: HashMap<RawId, usize>,
}

impl IdentifierIndex {
    /// Builds an index that keeps first-encounter order, dropping repeats.
    pub fn encounter_order<I>(kind: IdKind, ids: I) -> Self
    where
        I: IntoIterator<Item = RawId>,
    {
        let mut index = Self {
            kind,
            ids: Vec::new(),
            ordinals: HashMap::new(),
        };
        for id in ids {
            index.insert(id);
        }
        index
    }

    /// Builds an index ordered by ascending raw id.
    pub fn sorted<I>(kind: IdKind, ids: I) -> Self
    where
        I: IntoIterator<Item = RawId>,
    {
        let mut ids: Vec<RawId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self::encounter_order(kind, ids)
    }

    /// User index: train users in encounter order, then unseen test users.
    pub fn users(train: &[RatingRecord], test: &[RatingRecord]) -> Self {
        Self::encounter_order(
            IdKind::User,
            train.iter().chain(test).map(|r| r.user_id),
        )
    }

    /// Item index: sorted union of train and test items.
    pub fn items(train: &[RatingRecord], test: &[RatingRecord]) -> Self {
        Self::sorted(IdKind::Item, train.iter().chain(test).map(|r| r.item_id))
    }

    fn insert(&mut self, id: RawId) {
        if !self.ordinals.contains_key(&id) {
            self.ordinals.insert(id, self.ids.len());
            self.ids.push(id);
        }
    }

    /// Returns the ordinal of `id`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownIdentifier` when `id` was not part of the inputs.
    pub fn ordinal(&self, id: RawId) -> Result<usize> {
        self.ordinals
            .get(&id)
            .copied()
            .ok_or_else(|| CompletionError::unknown_identifier(self.kind, id))
    }

    /// Returns the raw identifier stored at `ordinal`.
    pub fn id(&self, ordinal: usize) -> Option<RawId> {
        self.ids.get(ordinal).copied()
    }

    /// Returns `true` if `id` has an ordinal.
    pub fn contains(&self, id: RawId) -> bool {
        self.ordinals.contains_key(&id)
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if the index holds no identifiers.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifier space of this index.
    pub fn kind(&self) -> IdKind {
        self.kind
    }

    /// Raw identifiers in ordinal order.
    pub fn ids(&self) -> &[RawId] {
        &self.ids
    }
}
