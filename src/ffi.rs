//! FFI bindings for biomarker stress assessment
//!
//! C-compatible entry points. Inputs and outputs are null-terminated JSON strings;
//! returned strings are allocated here and must be released with
//! `stress_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::ClientConfig;
use crate::error::StressError;
use crate::interpreter::interpret;
use crate::submitter::StressAnalyzer;
use crate::types::{BiomarkerInput, StressAssessment};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn assessment_to_cstr(result: Result<StressAssessment, StressError>) -> *mut c_char {
    match result.and_then(|assessment| Ok(serde_json::to_string(&assessment)?)) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

fn parse_input(input_json: &str) -> Result<BiomarkerInput, StressError> {
    Ok(serde_json::from_str(input_json)?)
}

/// Interpret a prediction payload offline and return the assessment as JSON.
///
/// # Safety
/// - `payload_json` and `input_json` must be valid null-terminated C strings.
/// - `input_json` uses the wire labels (`user_name`, `user_age`, `cortisol_val`, ...).
/// - Returns a newly allocated string that must be freed with `stress_free_string`.
/// - Returns NULL on error; call `stress_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn stress_interpret(
    payload_json: *const c_char,
    input_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(payload_str) = cstr_to_string(payload_json) else {
        set_last_error("Invalid payload string pointer");
        return ptr::null_mut();
    };
    let Some(input_str) = cstr_to_string(input_json) else {
        set_last_error("Invalid input string pointer");
        return ptr::null_mut();
    };

    let result = parse_input(&input_str).and_then(|input| {
        let payload: serde_json::Value = serde_json::from_str(&payload_str)?;
        interpret(&payload, &input)
    });
    assessment_to_cstr(result)
}

/// Submit biomarkers to the configured inference service and block until done.
///
/// Configuration comes from the environment (`STRESS_SERVICE_ID`, `HF_TOKEN`, ...).
///
/// # Safety
/// - `input_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `stress_free_string`.
/// - Returns NULL on error; call `stress_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn stress_analyze(input_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(input_str) = cstr_to_string(input_json) else {
        set_last_error("Invalid input string pointer");
        return ptr::null_mut();
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            set_last_error(&format!("Failed to start async runtime: {e}"));
            return ptr::null_mut();
        }
    };

    let result = parse_input(&input_str).and_then(|input| {
        let analyzer = StressAnalyzer::from_config(ClientConfig::from_env()?)?;
        runtime.block_on(analyzer.submit(&input))
    });
    assessment_to_cstr(result)
}

/// Free a string returned by this library.
///
/// # Safety
/// - `ptr` must be a pointer returned by a `stress_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn stress_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Get the last error message.
///
/// # Safety
/// - The returned pointer is valid until the next `stress_*` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn stress_last_error() -> *const c_char {
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
pub unsafe extern "C" fn stress_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
