//! Returned strings and their release.

use std::ffi::{c_char, CStr, CString};
use std::ptr::NonNull;
use std::str::Utf8Error;

/// Envelope returned if the real one cannot be turned into a C string.
const UNREPRESENTABLE: &CStr = c"{\"success\":false,\"error\":\"result contains a NUL byte\"}";

/// Hands `text` to the caller as an owned C string.
///
/// The caller releases it with [`strongbox_free_string`].
pub(crate) fn into_owned_ptr(text: String) -> *mut c_char {
    match CString::new(text) {
        Ok(cstring) => cstring.into_raw(),
        Err(_) => UNREPRESENTABLE.to_owned().into_raw(),
    }
}

/// Frees a string returned by any Strongbox function.
///
/// Passing NULL is a no-op.
///
/// # Safety
///
/// `ptr` must be NULL or a pointer returned by a Strongbox function that has
/// not been freed yet. It must not be used after this call.
#[no_mangle]
pub unsafe extern "C" fn strongbox_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Owning handle for a string returned across the C ABI.
///
/// Releases the string on drop, so a Rust host never has to pair calls to
/// [`strongbox_free_string`] by hand.
///
/// ```rust,no_run
/// use std::ffi::CString;
/// use strongbox_ffi::{strongbox_list_entries, ReturnedString};
///
/// let path = CString::new("w.db").unwrap();
/// let key = CString::new("K1").unwrap();
/// let listing = unsafe {
///     ReturnedString::from_raw(strongbox_list_entries(path.as_ptr(), key.as_ptr()))
/// }
/// .unwrap();
/// println!("{}", listing.to_str().unwrap());
/// ```
pub struct ReturnedString {
    ptr: NonNull<c_char>,
}

impl ReturnedString {
    /// Takes ownership of a returned string. Returns `None` for NULL.
    ///
    /// # Safety
    ///
    /// `ptr` must be NULL or a pointer returned by a Strongbox function that
    /// nothing else will free.
    pub unsafe fn from_raw(ptr: *mut c_char) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr })
    }

    /// Borrows the contents as a C string.
    pub fn as_c_str(&self) -> &CStr {
        // SAFETY: the pointer came from CString::into_raw and is still owned.
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }
    }

    /// Borrows the contents as UTF-8.
    pub fn to_str(&self) -> Result<&str, Utf8Error> {
        self.as_c_str().to_str()
    }

    /// Gives the string back without freeing it.
    #[must_use]
    pub fn into_raw(self) -> *mut c_char {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        ptr
    }
}

impl Drop for ReturnedString {
    fn drop(&mut self) {
        // SAFETY: ownership was transferred to us in from_raw.
        unsafe { strongbox_free_string(self.ptr.as_ptr()) };
    }
}

impl std::fmt::Debug for ReturnedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ReturnedString")
            .field(&self.as_c_str())
            .finish()
    }
}
