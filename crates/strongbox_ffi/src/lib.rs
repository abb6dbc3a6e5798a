//! # Strongbox FFI
//!
//! C ABI for the Strongbox credential wallet.
//!
//! Every operation takes NUL-terminated UTF-8 strings and returns a newly
//! allocated, NUL-terminated JSON envelope:
//!
//! ```json
//! {"success": true, ...}
//! {"success": false, "error": "..."}
//! ```
//!
//! ## Memory ownership
//!
//! - Input strings stay owned by the caller and are not retained.
//! - Every returned string is owned by the caller, who must pass it to
//!   [`strongbox_free_string`] exactly once and never touch it afterwards.
//! - Returned pointers are never NULL.
//!
//! The C declarations live in `include/strongbox_ffi.h`.

#![warn(missing_docs)]

mod args;
mod buffer;
mod wallet;

pub use buffer::{strongbox_free_string, ReturnedString};
pub use wallet::{
    strongbox_import_bulk_entries, strongbox_insert_entry, strongbox_insert_tagged_entry,
    strongbox_list_categories, strongbox_list_entries, strongbox_provision_wallet,
};
