//! Category index: entry counts grouped by category.
//!
//! Categories are not stored on their own. The index is derived from a scan
//! of the entries every time it is needed, so it can never disagree with
//! them: the sum of all counts is the number of entries scanned.

use crate::entry::Entry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from category name to entry count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryIndex(BTreeMap<String, u64>);

impl CategoryIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index by counting `entries`.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        let mut index = Self::new();
        for entry in entries {
            index.record(&entry.category);
        }
        index
    }

    /// Counts one more entry under `category`.
    pub fn record(&mut self, category: &str) {
        *self.0.entry(category.to_string()).or_insert(0) += 1;
    }

    /// Returns the count for `category` (0 if absent).
    #[must_use]
    pub fn get(&self, category: &str) -> u64 {
        self.0.get(category).copied().unwrap_or(0)
    }

    /// Returns the sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// Returns the number of distinct categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no category has been counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(category, count)` pairs in category order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Consumes the index, returning the underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, u64> {
        self.0
    }
}

impl FromIterator<(String, u64)> for CategoryIndex {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
