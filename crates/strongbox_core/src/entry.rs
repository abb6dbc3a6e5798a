//! Entries: the atomic unit of storage.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag set of an entry: tag name to tag value.
///
/// Tags index and filter entries; they never carry payload.
pub type Tags = BTreeMap<String, String>;

/// Identity of an entry within a store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryKey {
    category: String,
    name: String,
}

impl EntryKey {
    /// Creates a key, rejecting empty components.
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` if `category` or `name` is empty.
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> CoreResult<Self> {
        let category = category.into();
        let name = name.into();
        if category.is_empty() {
            return Err(CoreError::malformed_input("category must not be empty"));
        }
        if name.is_empty() {
            return Err(CoreError::malformed_input("name must not be empty"));
        }
        Ok(Self { category, name })
    }

    /// Returns the category.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A stored entry: `(category, name) -> (value, tags)`.
///
/// This is also the listing view: it serializes to
/// `{"category", "name", "value", "tags"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Category, the first half of the identity.
    pub category: String,
    /// Name, unique within the category.
    pub name: String,
    /// Serialized payload.
    pub value: String,
    /// Index tags.
    #[serde(default)]
    pub tags: Tags,
}

impl Entry {
    /// Creates an entry with a validated identity.
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` if `category` or `name` is empty.
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
        tags: Tags,
    ) -> CoreResult<Self> {
        let key = EntryKey::new(category, name)?;
        Ok(Self {
            category: key.category,
            name: key.name,
            value: value.into(),
            tags,
        })
    }

    /// Returns the identity of this entry.
    #[must_use]
    pub fn key(&self) -> EntryKey {
        EntryKey {
            category: self.category.clone(),
            name: self.name.clone(),
        }
    }

    /// Encodes the entry as the CBOR plaintext of a record.
    pub(crate) fn to_record(&self) -> CoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|e| CoreError::codec(format!("encode entry: {e}")))?;
        Ok(buf)
    }

    /// Decodes a record plaintext produced by [`to_record`](Self::to_record).
    pub(crate) fn from_record(bytes: &[u8]) -> CoreResult<Self> {
        let entry: Self = ciborium::de::from_reader(bytes)
            .map_err(|e| CoreError::codec(format!("decode entry: {e}")))?;
        if entry.category.is_empty() || entry.name.is_empty() {
            return Err(CoreError::corruption("stored entry has an empty identity"));
        }
        Ok(entry)
    }
}
