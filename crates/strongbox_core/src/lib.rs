//! # Strongbox Core
//!
//! Encrypted, categorized credential store.
//!
//! This crate provides:
//! - The wallet file format: an authenticated header plus append-only,
//!   AES-256-GCM sealed record frames
//! - Store sessions with guaranteed release on every exit path
//! - Entry operations keyed by `(category, name)` with string tags
//! - The category index derived from a scan of the entries
//! - Bulk import with per-item fault isolation
//! - Result envelopes: `{"success": true, ...}` / `{"success": false, "error": ...}`
//!
//! ## Example
//!
//! ```rust,no_run
//! use strongbox_core::{Envelope, EntryList, Wallet};
//!
//! let wallet = Wallet::at("w.db");
//! wallet.provision("K1")?;
//! wallet.insert("K1", "user1", "secret")?;
//!
//! let listing: Envelope<EntryList> = wallet
//!     .entries("K1")
//!     .map(|entries| EntryList { entries })
//!     .into();
//! println!("{}", listing.encode());
//! # Ok::<(), strongbox_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod category;
mod config;
mod crypto;
mod entry;
mod envelope;
mod error;
mod format;
mod import;
mod session;
#[cfg(test)]
mod test_support;
mod wallet;

pub use category::CategoryIndex;
pub use config::{Config, DEFAULT_CATEGORY};
pub use crypto::{RecordCipher, StoreKey, KEY_SIZE, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
pub use entry::{Entry, EntryKey, Tags};
pub use envelope::{Ack, CategoryCounts, EntryList, Envelope};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use format::{StoreHeader, FORMAT_VERSION, HEADER_SIZE, MAGIC, MAX_FRAME_SIZE};
pub use import::{import_batch, ImportBatch, ImportSummary, ItemDescriptor};
pub use session::{with_session, Session};
pub use wallet::Wallet;
