//! Reading C string arguments.

use std::ffi::{c_char, CStr};
use strongbox_core::{CoreError, CoreResult};

/// Reads a required string argument.
///
/// # Safety
///
/// `ptr` must be NULL or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn required_str<'a>(ptr: *const c_char, arg: &str) -> CoreResult<&'a str> {
    optional_str(ptr, arg)?
        .ok_or_else(|| CoreError::malformed_input(format!("argument '{arg}' is null")))
}

/// Reads a string argument that may be NULL.
///
/// # Safety
///
/// Same as [`required_str`].
pub(crate) unsafe fn optional_str<'a>(
    ptr: *const c_char,
    arg: &str,
) -> CoreResult<Option<&'a str>> {
    if ptr.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(Some)
        .map_err(|_| CoreError::malformed_input(format!("argument '{arg}' is not valid UTF-8")))
}
