//! Bulk import with per-item fault isolation.
//!
//! A batch maps category names to lists of item descriptors:
//!
//! ```json
//! {
//!   "general": [{"name": "user1", "value": "secret", "tags": {"env": "prod"}}],
//!   "did": [{"name": "did:sov:1", "value": {"verkey": "abc"}}]
//! }
//! ```
//!
//! Only the shape of the batch itself is checked up front. Each item is then
//! validated and inserted on its own: a bad item is counted as failed and the
//! rest of the batch carries on. Items already inserted are never rolled back.

use crate::category::CategoryIndex;
use crate::entry::{Entry, Tags};
use crate::error::{CoreError, CoreResult};
use crate::session::Session;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// A parsed, not yet validated import batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportBatch {
    categories: Vec<(String, Vec<Value>)>,
}

impl ImportBatch {
    /// Parses a batch from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` if the text is not JSON or not shaped as
    /// category → list of items.
    pub fn parse(json: &str) -> CoreResult<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| CoreError::malformed_input(format!("batch is not valid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Builds a batch from an already parsed JSON value.
    ///
    /// A category mapped to a single object is taken as a one-item list.
    pub fn from_value(value: Value) -> CoreResult<Self> {
        let Value::Object(map) = value else {
            return Err(CoreError::malformed_input(
                "batch must be an object mapping categories to item lists",
            ));
        };

        let mut categories = Vec::with_capacity(map.len());
        for (category, items) in map {
            let items = match items {
                Value::Array(items) => items,
                item @ Value::Object(_) => vec![item],
                other => {
                    return Err(CoreError::malformed_input(format!(
                        "category '{category}' must map to a list of items, found {}",
                        json_type(&other)
                    )))
                }
            };
            categories.push((category, items));
        }

        Ok(Self { categories })
    }

    /// Total number of items across all categories.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|(_, items)| items.len()).sum()
    }

    /// Iterates `(category, items)` pairs.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.categories
            .iter()
            .map(|(category, items)| (category.as_str(), items.as_slice()))
    }
}

/// One validated import item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDescriptor {
    /// Entry name.
    pub name: String,
    /// Serialized value.
    pub value: String,
    /// Entry tags.
    pub tags: Tags,
}

impl ItemDescriptor {
    /// Validates one raw item.
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` describing the first problem found.
    pub fn from_value(item: &Value) -> CoreResult<Self> {
        let Value::Object(fields) = item else {
            return Err(CoreError::malformed_input(format!(
                "item must be an object, found {}",
                json_type(item)
            )));
        };

        let name = match fields.get("name") {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            Some(Value::String(_)) => return Err(CoreError::malformed_input("name is empty")),
            Some(other) => {
                return Err(CoreError::malformed_input(format!(
                    "name must be a string, found {}",
                    json_type(other)
                )))
            }
            None => return Err(CoreError::malformed_input("name is missing")),
        };

        let value = match fields.get("value") {
            None | Some(Value::Null) => {
                return Err(CoreError::malformed_input("value is missing or null"))
            }
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        };

        let tags = match fields.get("tags") {
            None | Some(Value::Null) => Tags::new(),
            Some(Value::Object(raw)) => {
                let mut tags = Tags::new();
                for (key, value) in raw {
                    let value = match value {
                        Value::String(text) => text.clone(),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        other => {
                            return Err(CoreError::malformed_input(format!(
                                "tag '{key}' must be a scalar, found {}",
                                json_type(other)
                            )))
                        }
                    };
                    tags.insert(key.clone(), value);
                }
                tags
            }
            Some(other) => {
                return Err(CoreError::malformed_input(format!(
                    "tags must be an object, found {}",
                    json_type(other)
                )))
            }
        };

        Ok(Self { name, value, tags })
    }
}

/// Aggregate outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Items inserted.
    pub imported: u64,
    /// Items that failed validation or insertion.
    pub failed: u64,
    /// Inserted items per category.
    pub categories: CategoryIndex,
}

impl ImportSummary {
    /// Accounts for the outcome of one item.
    pub fn record(&mut self, category: &str, outcome: &CoreResult<()>) {
        match outcome {
            Ok(()) => {
                self.imported += 1;
                self.categories.record(category);
            }
            Err(_) => self.failed += 1,
        }
    }

    /// Number of items attempted.
    #[must_use]
    pub fn attempted(&self) -> u64 {
        self.imported + self.failed
    }
}

/// Imports every item of `batch` into `session`.
///
/// Never fails as a whole: each item's error is logged, counted, and
/// dropped.
pub fn import_batch(session: &mut Session, batch: &ImportBatch) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for (category, items) in batch.categories() {
        for (index, item) in items.iter().enumerate() {
            let outcome = import_item(session, category, index, item);
            if let Err(err) = &outcome {
                warn!(error = %err, "import item failed");
            }
            summary.record(category, &outcome);
        }
    }

    info!(
        imported = summary.imported,
        failed = summary.failed,
        categories = summary.categories.len(),
        "bulk import finished"
    );
    summary
}

fn import_item(session: &mut Session, category: &str, index: usize, item: &Value) -> CoreResult<()> {
    let label = item
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map_or_else(|| format!("#{index}"), str::to_string);

    let insert = ItemDescriptor::from_value(item)
        .and_then(|item| Entry::new(category, item.name, item.value, item.tags))
        .and_then(|entry| session.insert_entry(entry));

    insert.map_err(|reason| CoreError::item_insert(category, label, reason))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
