//! The wallet call surface.
//!
//! Each method is one round trip: open a session on the store, do one
//! operation, close the session. Nothing stays open between calls.

use crate::category::CategoryIndex;
use crate::config::Config;
use crate::entry::{Entry, Tags};
use crate::error::CoreResult;
use crate::import::{import_batch, ImportBatch, ImportSummary};
use crate::session::{with_session, Session};
use std::path::{Path, PathBuf};
use tracing::info;

/// A wallet at a fixed location.
///
/// # Example
///
/// ```rust,no_run
/// use strongbox_core::{Tags, Wallet};
///
/// let wallet = Wallet::at("w.db");
/// wallet.provision("K1")?;
/// wallet.insert("K1", "user1", "secret")?;
/// assert_eq!(wallet.categories("K1")?.get("general"), 1);
/// # Ok::<(), strongbox_core::CoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Wallet {
    location: PathBuf,
    config: Config,
}

impl Wallet {
    /// Addresses the wallet stored at `location`.
    pub fn at(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            config: Config::default(),
        }
    }

    /// Replaces the configuration used for every call.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Returns the store location.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Creates an empty store, replacing any store already at the location.
    pub fn provision(&self, raw_key: &str) -> CoreResult<()> {
        Session::provision(&self.location, raw_key, &self.config)?.close()?;
        info!(store = %self.location.display(), "wallet provisioned");
        Ok(())
    }

    /// Inserts an untagged entry into the default category.
    pub fn insert(&self, raw_key: &str, name: &str, value: &str) -> CoreResult<()> {
        self.insert_entry(raw_key, &self.config.default_category, name, value, Tags::new())
    }

    /// Inserts or replaces the entry `(category, name)`.
    pub fn insert_entry(
        &self,
        raw_key: &str,
        category: &str,
        name: &str,
        value: &str,
        tags: Tags,
    ) -> CoreResult<()> {
        let entry = Entry::new(category, name, value, tags)?;
        self.session(raw_key, |session| session.insert_entry(entry))
    }

    /// Lists every entry.
    pub fn entries(&self, raw_key: &str) -> CoreResult<Vec<Entry>> {
        self.session(raw_key, |session| Ok(session.entries()))
    }

    /// Bulk-imports a JSON batch.
    ///
    /// The batch shape is checked before the store is opened, so a malformed
    /// batch never touches the store.
    pub fn import(&self, raw_key: &str, batch_json: &str) -> CoreResult<ImportSummary> {
        let batch = ImportBatch::parse(batch_json)?;
        self.session(raw_key, |session| Ok(import_batch(session, &batch)))
    }

    /// Counts entries per category.
    pub fn categories(&self, raw_key: &str) -> CoreResult<CategoryIndex> {
        self.session(raw_key, |session| Ok(session.category_index()))
    }

    fn session<T>(
        &self,
        raw_key: &str,
        f: impl FnOnce(&mut Session) -> CoreResult<T>,
    ) -> CoreResult<T> {
        with_session(&self.location, raw_key, &self.config, f)
    }
}
