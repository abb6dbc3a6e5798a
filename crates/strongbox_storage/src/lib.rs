//! # Strongbox Storage
//!
//! Byte-store backends underneath the Strongbox wallet file.
//!
//! Backends are **opaque byte stores**: they append, read back and truncate
//! bytes, and know nothing about headers, record frames or encryption. The
//! wallet format lives entirely in `strongbox_core`.
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - A single OS file, exclusively locked while open
//! - [`InMemoryBackend`] - A shareable in-memory buffer for tests
//!
//! ## Example
//!
//! ```rust
//! use strongbox_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"sealed frame").unwrap();
//! assert_eq!(backend.read_at(offset, 6).unwrap(), b"sealed");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
