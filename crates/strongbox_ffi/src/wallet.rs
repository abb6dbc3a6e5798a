//! Wallet operations exported over the C ABI.
//!
//! Each function reads its arguments, runs one wallet operation, and returns
//! the envelope as an owned C string. Panics are caught here and reported as
//! failure envelopes; nothing unwinds into the caller.

use crate::args::{optional_str, required_str};
use crate::buffer::into_owned_ptr;
use serde::Serialize;
use std::any::Any;
use std::ffi::c_char;
use std::panic::{self, AssertUnwindSafe};
use strongbox_core::{
    Ack, CategoryCounts, CoreError, CoreResult, EntryList, Envelope, Tags, Wallet,
};
use tracing::{debug, error};

/// Runs one operation and encodes its outcome.
fn respond<T: Serialize>(
    operation: &'static str,
    call: impl FnOnce() -> CoreResult<T>,
) -> *mut c_char {
    let envelope: Envelope<T> = match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => {
            if let Err(err) = &result {
                debug!(operation, kind = ?err.kind(), error = %err, "operation failed");
            }
            result.into()
        }
        Err(payload) => {
            error!(operation, panic = panic_message(payload.as_ref()), "operation panicked");
            Envelope::failure(format!("internal error during {operation}"))
        }
    };
    into_owned_ptr(envelope.encode())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn parse_tags(tags_json: Option<&str>) -> CoreResult<Tags> {
    match tags_json {
        None => Ok(Tags::new()),
        Some(json) => serde_json::from_str::<Option<Tags>>(json)
            .map(Option::unwrap_or_default)
            .map_err(|e| {
                CoreError::malformed_input(format!(
                    "tags must be an object of string values: {e}"
                ))
            }),
    }
}

/// Creates an empty wallet at `path`, replacing any wallet already there.
///
/// Success payload: none.
///
/// # Safety
///
/// `path` and `key` must be NULL or valid NUL-terminated strings. The result
/// must be released with `strongbox_free_string`.
#[no_mangle]
pub unsafe extern "C" fn strongbox_provision_wallet(
    path: *const c_char,
    key: *const c_char,
) -> *mut c_char {
    respond("provision", || {
        let path = required_str(path, "path")?;
        let key = required_str(key, "key")?;
        Wallet::at(path).provision(key).map(|()| Ack {})
    })
}

/// Inserts or replaces `name` in the `general` category, without tags.
///
/// Success payload: none.
///
/// # Safety
///
/// Every argument must be NULL or a valid NUL-terminated string. The result
/// must be released with `strongbox_free_string`.
#[no_mangle]
pub unsafe extern "C" fn strongbox_insert_entry(
    path: *const c_char,
    key: *const c_char,
    name: *const c_char,
    value: *const c_char,
) -> *mut c_char {
    respond("insert", || {
        let path = required_str(path, "path")?;
        let key = required_str(key, "key")?;
        let name = required_str(name, "name")?;
        let value = required_str(value, "value")?;
        Wallet::at(path).insert(key, name, value).map(|()| Ack {})
    })
}

/// Inserts or replaces `(category, name)` with optional tags.
///
/// `tags_json` is a JSON object of string values, or NULL for no tags.
///
/// Success payload: none.
///
/// # Safety
///
/// Every argument must be NULL or a valid NUL-terminated string. The result
/// must be released with `strongbox_free_string`.
#[no_mangle]
pub unsafe extern "C" fn strongbox_insert_tagged_entry(
    path: *const c_char,
    key: *const c_char,
    category: *const c_char,
    name: *const c_char,
    value: *const c_char,
    tags_json: *const c_char,
) -> *mut c_char {
    respond("insert", || {
        let path = required_str(path, "path")?;
        let key = required_str(key, "key")?;
        let category = required_str(category, "category")?;
        let name = required_str(name, "name")?;
        let value = required_str(value, "value")?;
        let tags = parse_tags(optional_str(tags_json, "tags_json")?)?;
        Wallet::at(path)
            .insert_entry(key, category, name, value, tags)
            .map(|()| Ack {})
    })
}

/// Lists every entry.
///
/// Success payload: `entries`, an array of
/// `{"category", "name", "value", "tags"}` in no particular order.
///
/// # Safety
///
/// `path` and `key` must be NULL or valid NUL-terminated strings. The result
/// must be released with `strongbox_free_string`.
#[no_mangle]
pub unsafe extern "C" fn strongbox_list_entries(
    path: *const c_char,
    key: *const c_char,
) -> *mut c_char {
    respond("list", || {
        let path = required_str(path, "path")?;
        let key = required_str(key, "key")?;
        let entries = Wallet::at(path).entries(key)?;
        Ok(EntryList { entries })
    })
}

/// Imports a batch of entries, `{"category": [{"name", "value", "tags"}]}`.
///
/// Items are imported independently: bad items are counted, not fatal.
///
/// Success payload: `imported`, `failed`, and `categories` (imported items
/// per category).
///
/// # Safety
///
/// Every argument must be NULL or a valid NUL-terminated string. The result
/// must be released with `strongbox_free_string`.
#[no_mangle]
pub unsafe extern "C" fn strongbox_import_bulk_entries(
    path: *const c_char,
    key: *const c_char,
    batch_json: *const c_char,
) -> *mut c_char {
    respond("import", || {
        let path = required_str(path, "path")?;
        let key = required_str(key, "key")?;
        let batch_json = required_str(batch_json, "batch_json")?;
        Wallet::at(path).import(key, batch_json)
    })
}

/// Counts entries per category.
///
/// Success payload: `categories`, an object of category name to count.
///
/// # Safety
///
/// `path` and `key` must be NULL or valid NUL-terminated strings. The result
/// must be released with `strongbox_free_string`.
#[no_mangle]
pub unsafe extern "C" fn strongbox_list_categories(
    path: *const c_char,
    key: *const c_char,
) -> *mut c_char {
    respond("list_categories", || {
        let path = required_str(path, "path")?;
        let key = required_str(key, "key")?;
        let categories = Wallet::at(path).categories(key)?;
        Ok(CategoryCounts { categories })
    })
}
