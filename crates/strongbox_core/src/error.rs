//! Error types for Strongbox core.

use std::io;
use strongbox_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Coarse classification of a [`CoreError`].
///
/// Callers decide how to react (abort the call, count an item as failed,
/// ask for another key) from the kind rather than the concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The store exists but the key does not unlock it.
    Authentication,
    /// The location is unreadable or unwritable, or the disk failed.
    Io,
    /// Caller input could not be interpreted.
    MalformedInput,
    /// A single item of a bulk import could not be stored.
    ItemInsert,
    /// The store file is damaged or not a wallet.
    Corruption,
    /// A fault inside the engine, not caused by input or the store file.
    Internal,
}

/// Errors that can occur in Strongbox core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error outside the storage backend, or a store that is missing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The key does not unlock the store.
    #[error("authentication failed: the key does not unlock this store")]
    AuthenticationFailed,

    /// Input could not be interpreted.
    #[error("malformed input: {message}")]
    MalformedInput {
        /// Description of what was wrong.
        message: String,
    },

    /// One item of a bulk import failed.
    #[error("failed to import {category}/{name}: {reason}")]
    ItemInsert {
        /// Category the item was listed under.
        category: String,
        /// Item name, or `#<index>` when the item had no usable name.
        name: String,
        /// Why the item failed.
        reason: Box<CoreError>,
    },

    /// The file is not a wallet or has an unsupported version.
    #[error("invalid store format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// The file is a wallet but its contents are damaged.
    #[error("store corruption: {message}")]
    Corruption {
        /// Description of the damage.
        message: String,
    },

    /// Checksum mismatch detected.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Stored checksum.
        expected: u32,
        /// Computed checksum.
        actual: u32,
    },

    /// Encryption failed.
    #[error("encryption failed: {message}")]
    EncryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// A stored record could not be encoded or decoded.
    #[error("record codec error: {message}")]
    Codec {
        /// Description of the failure.
        message: String,
    },
}

impl CoreError {
    /// Creates a malformed input error.
    pub fn malformed_input(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates a corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }

    /// Creates an encryption failed error.
    pub fn encryption_failed(message: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            message: message.into(),
        }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Wraps `reason` as the failure of one bulk-import item.
    pub fn item_insert(
        category: impl Into<String>,
        name: impl Into<String>,
        reason: CoreError,
    ) -> Self {
        Self::ItemInsert {
            category: category.into(),
            name: name.into(),
            reason: Box::new(reason),
        }
    }

    /// Returns the taxonomy bucket this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(StorageError::Io(_)) | Self::Io(_) => ErrorKind::Io,
            Self::Storage(_)
            | Self::InvalidFormat { .. }
            | Self::Corruption { .. }
            | Self::ChecksumMismatch { .. }
            | Self::Codec { .. } => ErrorKind::Corruption,
            Self::AuthenticationFailed => ErrorKind::Authentication,
            Self::MalformedInput { .. } => ErrorKind::MalformedInput,
            Self::EncryptionFailed { .. } => ErrorKind::Internal,
            Self::ItemInsert { .. } => ErrorKind::ItemInsert,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            CoreError::AuthenticationFailed.kind(),
            ErrorKind::Authentication
        );
        assert_eq!(
            CoreError::Storage(StorageError::Io(io::Error::other("disk"))).kind(),
            ErrorKind::Io
        );
        assert_eq!(
            CoreError::malformed_input("batch").kind(),
            ErrorKind::MalformedInput
        );
        assert_eq!(
            CoreError::ChecksumMismatch {
                expected: 1,
                actual: 2
            }
            .kind(),
            ErrorKind::Corruption
        );
        assert_eq!(
            CoreError::Storage(StorageError::ReadPastEnd {
                offset: 0,
                len: 1,
                size: 0
            })
            .kind(),
            ErrorKind::Corruption
        );
    }

    #[test]
    fn encryption_failure_is_internal() {
        let err = CoreError::encryption_failed("HKDF expand failed");
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_ne!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn item_insert_message_names_the_item() {
        let err = CoreError::item_insert(
            "bad",
            "broken",
            CoreError::malformed_input("value is missing or null"),
        );
        assert_eq!(err.kind(), ErrorKind::ItemInsert);
        assert_eq!(
            err.to_string(),
            "failed to import bad/broken: malformed input: value is missing or null"
        );
    }
}
