//! # Date Index
//!
//! In-memory mapping from [`DateKey`] to the offset of the newest record for
//! that date in the record log (the chain *head*).
//!
//! The index is rebuilt at startup from a snapshot file, mutated on every
//! ingest, and written back to the snapshot on controlled shutdown. See the
//! [`snapshot`] module for the file format.

pub mod snapshot;

use recordlog::{DateKey, NO_PREV};
use std::collections::BTreeMap;

pub use snapshot::{SnapshotError, SNAPSHOT_FILENAME};

/// Head offsets per date.
///
/// Entries are kept in a `BTreeMap` so iteration (and therefore the snapshot
/// file) is in date order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateIndex {
    heads: BTreeMap<DateKey, u64>,
    /// True when the index has changed since it was last loaded or saved.
    dirty: bool,
}

impl DateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// The head offset for `date`, if any record for it exists.
    pub fn get(&self, date: &DateKey) -> Option<u64> {
        self.heads.get(date).copied()
    }

    /// The head offset as a `prev_offset` link: [`NO_PREV`] if absent.
    pub fn head_link(&self, date: &DateKey) -> i64 {
        self.get(date).map_or(NO_PREV, |off| off as i64)
    }

    /// Points `date` at `offset`.
    ///
    /// Callers must only pass an offset just returned by a successful log
    /// append for a reading of the same date.
    pub fn set(&mut self, date: DateKey, offset: u64) {
        self.heads.insert(date, offset);
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.heads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Entries in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (&DateKey, &u64)> {
        self.heads.iter()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl FromIterator<(DateKey, u64)> for DateIndex {
    /// Builds a dirty index; the last offset seen for a date wins.
    fn from_iter<I: IntoIterator<Item = (DateKey, u64)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (date, offset) in iter {
            index.set(date, offset);
        }
        index
    }
}

#[cfg(test)]
mod tests;
