//! Conversions between Rust strings and the C strings Vulkan uses.

use std::ffi::{c_char, CStr, CString};

/// Copy a null-terminated C string into an owned string. A null pointer yields an empty string.
/// # Safety
/// `ptr` must be null or point to a valid null-terminated string.
pub(crate) unsafe fn wrap_c_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Borrow the raw pointers of a list of C strings, for passing as `ppEnabled*Names`.
/// The pointers are only valid while `strings` is alive.
pub(crate) fn raw_ptrs(strings: &[CString]) -> Vec<*const c_char> {
    strings.iter().map(|string| string.as_ptr()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_empty() {
        assert_eq!(unsafe { wrap_c_str(std::ptr::null()) }, "");
    }

    #[test]
    fn round_trip_through_raw_pointer() {
        let names = vec![CString::new("VK_KHR_swapchain").unwrap()];
        let raw = raw_ptrs(&names);
        assert_eq!(unsafe { wrap_c_str(raw[0]) }, "VK_KHR_swapchain");
    }
}
