//! Backends for exercising write failures in tests.

use std::io;
use strongbox_storage::{InMemoryBackend, StorageBackend, StorageError, StorageResult};

/// Wraps an [`InMemoryBackend`] and breaks one append.
///
/// The failing append writes the first half of its data and then errors, the
/// way a full disk would.
pub(crate) struct FailingBackend {
    inner: InMemoryBackend,
    appends: usize,
    fail_on: usize,
}

impl FailingBackend {
    /// Fails the `fail_on`-th append (1-based) made through this wrapper.
    pub(crate) fn new(inner: InMemoryBackend, fail_on: usize) -> Self {
        Self {
            inner,
            appends: 0,
            fail_on,
        }
    }
}

impl StorageBackend for FailingBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        self.inner.read_at(offset, len)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        self.appends += 1;
        if self.appends == self.fail_on {
            self.inner.append(&data[..data.len() / 2])?;
            return Err(StorageError::Io(io::Error::other("no space left on device")));
        }
        self.inner.append(data)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.inner.flush()
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.inner.sync()
    }

    fn size(&self) -> StorageResult<u64> {
        self.inner.size()
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        self.inner.truncate(new_size)
    }
}
