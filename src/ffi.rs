//! FFI bindings for Sleep Calc
//!
//! This module provides C-compatible functions for calling the calculators from
//! other languages. Every calculator takes a JSON request as a null-terminated
//! C string and returns a newly allocated JSON string that must be freed by the
//! caller using `sleepcalc_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::api::{caffeine_report_json, jet_lag_plan_json, sleep_options_json};
use crate::error::Result;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Run a JSON calculator over a C string request
unsafe fn call_json(request: *const c_char, calculate: fn(&str) -> Result<String>) -> *mut c_char {
    clear_last_error();

    let request_str = match cstr_to_string(request) {
        Some(s) => s,
        None => {
            set_last_error("Invalid request string pointer");
            return ptr::null_mut();
        }
    };

    match calculate(&request_str) {
        Ok(response) => string_to_cstr(&response),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Calculators
// ============================================================================

/// Compute sleep cycle options from a sleep request JSON.
///
/// # Safety
/// - `request_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `sleepcalc_free_string`.
/// - Returns NULL on error; call `sleepcalc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_sleep_options(request_json: *const c_char) -> *mut c_char {
    call_json(request_json, sleep_options_json)
}

/// Compute remaining caffeine and bedtime options from a caffeine request JSON.
///
/// # Safety
/// - `request_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `sleepcalc_free_string`.
/// - Returns NULL on error; call `sleepcalc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_caffeine_report(request_json: *const c_char) -> *mut c_char {
    call_json(request_json, caffeine_report_json)
}

/// Build a jet lag plan from a jet lag request JSON.
///
/// # Safety
/// - `request_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `sleepcalc_free_string`.
/// - Returns NULL on error; call `sleepcalc_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_jet_lag_plan(request_json: *const c_char) -> *mut c_char {
    call_json(request_json, jet_lag_plan_json)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Sleep Calc functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Sleep Calc function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Sleep Calc call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn sleepcalc_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
