//! Store sessions: one open, unlocked store for the duration of a call.
//!
//! A [`Session`] owns the storage backend (and with it the file lock), the
//! record cipher, and the replayed view of the entries. Dropping a session
//! closes it, so the store is released on every exit path: normal return,
//! early `?` return, or unwinding.

use crate::category::CategoryIndex;
use crate::config::Config;
use crate::crypto::{validate_raw_key, RecordCipher};
use crate::entry::{Entry, EntryKey, Tags};
use crate::error::{CoreError, CoreResult};
use crate::format::{self, Frame, StoreHeader, HEADER_SIZE};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use strongbox_storage::{FileBackend, StorageBackend};
use tracing::{debug, info, warn};

/// An open, unlocked store.
///
/// # Example
///
/// ```rust,no_run
/// use strongbox_core::{Config, Session, Tags};
/// use std::path::Path;
///
/// let mut session = Session::open_or_create(Path::new("w.db"), "K1", &Config::default())?;
/// session.insert("general", "user1", "secret", Tags::new())?;
/// session.close()?;
/// # Ok::<(), strongbox_core::CoreError>(())
/// ```
pub struct Session {
    backend: Box<dyn StorageBackend>,
    cipher: RecordCipher,
    entries: BTreeMap<EntryKey, Entry>,
    sync_on_commit: bool,
    location: String,
    closed: bool,
}

impl Session {
    /// Opens the store at `location`, creating it if absent.
    ///
    /// Blocks while another session holds the same file.
    ///
    /// # Errors
    ///
    /// - `AuthenticationFailed` if the store exists and `raw_key` is wrong
    /// - `Storage(Io)` / `Io` if the location cannot be read or written, or
    ///   no store exists and `create_if_missing` is off
    /// - `InvalidFormat` / `ChecksumMismatch` / `Corruption` for damaged files
    pub fn open_or_create(location: &Path, raw_key: &str, config: &Config) -> CoreResult<Self> {
        validate_raw_key(raw_key)?;

        let backend = if config.create_if_missing {
            FileBackend::open(location)?
        } else {
            FileBackend::open_existing(location)?
        };

        Self::open_with_backend(
            Box::new(backend),
            raw_key,
            config,
            location.display().to_string(),
        )
    }

    /// Replaces whatever is at `location` with a new, empty store.
    ///
    /// The old contents are discarded under the file lock, so a concurrent
    /// session on the same file finishes before the reset happens.
    pub fn provision(location: &Path, raw_key: &str, config: &Config) -> CoreResult<Self> {
        validate_raw_key(raw_key)?;

        let mut backend = FileBackend::open(location)?;
        if backend.size()? > 0 {
            info!(store = %location.display(), "replacing existing store");
            backend.truncate(0)?;
        }

        let config = config.clone().create_if_missing(true);
        Self::open_with_backend(
            Box::new(backend),
            raw_key,
            &config,
            location.display().to_string(),
        )
    }

    /// Opens a store held by an arbitrary backend.
    ///
    /// `location` is only used to label log events.
    pub fn open_with_backend(
        mut backend: Box<dyn StorageBackend>,
        raw_key: &str,
        config: &Config,
        location: impl Into<String>,
    ) -> CoreResult<Self> {
        validate_raw_key(raw_key)?;
        let location = location.into();

        let size = backend.size()?;
        let cipher = if size < HEADER_SIZE as u64 {
            Self::initialize(&mut *backend, raw_key, config, &location)?
        } else {
            let header = StoreHeader::decode(&backend.read_at(0, HEADER_SIZE)?)?;
            header.unlock(raw_key)?
        };

        let mut session = Self {
            backend,
            cipher,
            entries: BTreeMap::new(),
            sync_on_commit: config.sync_on_commit,
            location,
            closed: false,
        };
        session.replay()?;

        debug!(
            store = %session.location,
            entries = session.entries.len(),
            "session opened"
        );
        Ok(session)
    }

    /// Writes a fresh header into an empty (or never-finished) store.
    fn initialize(
        backend: &mut dyn StorageBackend,
        raw_key: &str,
        config: &Config,
        location: &str,
    ) -> CoreResult<RecordCipher> {
        let size = backend.size()?;
        if size > 0 {
            let partial = backend.read_at(0, size as usize)?;
            if !format::is_header_prefix(&partial) {
                return Err(CoreError::invalid_format("not a strongbox wallet file"));
            }
        }

        if !config.create_if_missing {
            return Err(CoreError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no store at {location}"),
            )));
        }

        if size > 0 {
            warn!(store = %location, size, "discarding incomplete header");
            backend.truncate(0)?;
        }

        let (header, cipher) = StoreHeader::create(raw_key)?;
        backend.append(&header.encode())?;
        backend.flush()?;
        backend.sync()?;

        info!(store = %location, "created new store");
        Ok(cipher)
    }

    /// Rebuilds the entry view from the record frames.
    fn replay(&mut self) -> CoreResult<()> {
        let body = self.backend.read_from(HEADER_SIZE as u64)?;
        let mut offset = 0;

        while offset < body.len() {
            match format::read_frame(&body[offset..])? {
                Frame::Intact { sealed, len } => {
                    let plaintext = self.cipher.open(sealed)?;
                    let entry = Entry::from_record(&plaintext)?;
                    self.entries.insert(entry.key(), entry);
                    offset += len;
                }
                Frame::Truncated => {
                    self.cut_torn_tail(offset, body.len())?;
                    break;
                }
                Frame::Damaged {
                    len,
                    expected,
                    actual,
                } => {
                    if offset + len == body.len() {
                        self.cut_torn_tail(offset, body.len())?;
                        break;
                    }
                    return Err(CoreError::ChecksumMismatch { expected, actual });
                }
            }
        }

        Ok(())
    }

    /// Drops an interrupted final write.
    fn cut_torn_tail(&mut self, offset: usize, body_len: usize) -> CoreResult<()> {
        warn!(
            store = %self.location,
            discarded = body_len - offset,
            "truncating torn final record"
        );
        self.backend.truncate((HEADER_SIZE + offset) as u64)?;
        Ok(())
    }

    /// Inserts or replaces the entry `(category, name)`.
    ///
    /// The record is durable when this returns (synced if `sync_on_commit`).
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` for an empty identity, or a storage error if
    /// the write fails. A failed write leaves the store as it was.
    pub fn insert(&mut self, category: &str, name: &str, value: &str, tags: Tags) -> CoreResult<()> {
        self.insert_entry(Entry::new(category, name, value, tags)?)
    }

    /// Inserts or replaces `entry`.
    pub fn insert_entry(&mut self, entry: Entry) -> CoreResult<()> {
        let record = entry.to_record()?;
        let frame = format::encode_frame(&self.cipher.seal(&record)?)?;

        let start = self.backend.size()?;
        if let Err(err) = self.commit(&frame) {
            // Never leave a partial frame behind for the next append to follow.
            if let Err(undo) = self.backend.truncate(start) {
                warn!(store = %self.location, error = %undo, "could not roll back failed write");
            }
            return Err(err);
        }

        self.entries.insert(entry.key(), entry);
        Ok(())
    }

    fn commit(&mut self, frame: &[u8]) -> CoreResult<()> {
        self.backend.append(frame)?;
        self.backend.flush()?;
        if self.sync_on_commit {
            self.backend.sync()?;
        }
        Ok(())
    }

    /// Returns a snapshot of every entry.
    ///
    /// Order is unspecified; callers must not rely on it.
    #[must_use]
    pub fn entries(&self) -> Vec<Entry> {
        self.entries.values().cloned().collect()
    }

    /// Iterates the entries without copying them.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Looks up one entry.
    #[must_use]
    pub fn get(&self, category: &str, name: &str) -> Option<&Entry> {
        let key = EntryKey::new(category, name).ok()?;
        self.entries.get(&key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counts entries per category.
    #[must_use]
    pub fn category_index(&self) -> CategoryIndex {
        CategoryIndex::from_entries(self.iter())
    }

    /// Flushes and releases the store.
    ///
    /// Dropping a session does the same but can only log failures.
    pub fn close(mut self) -> CoreResult<()> {
        self.closed = true;
        self.backend.flush()?;
        self.backend.sync()?;
        debug!(store = %self.location, "session closed");
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let released = self.backend.flush().and_then(|()| self.backend.sync());
        match released {
            Ok(()) => debug!(store = %self.location, "session dropped"),
            Err(err) => warn!(store = %self.location, error = %err, "failed to flush store on drop"),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("location", &self.location)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

/// Runs `f` against the store at `location` and closes it afterwards.
///
/// The store is released whichever way `f` exits. On success the close is
/// explicit so its errors are reported; on failure the session is dropped
/// and `f`'s error wins.
pub fn with_session<T>(
    location: &Path,
    raw_key: &str,
    config: &Config,
    f: impl FnOnce(&mut Session) -> CoreResult<T>,
) -> CoreResult<T> {
    let mut session = Session::open_or_create(location, raw_key, config)?;
    let value = f(&mut session)?;
    session.close()?;
    Ok(value)
}
