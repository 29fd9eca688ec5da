//! C-ABI wrapper around `httpkit-core`.
//!
//! # Overview
//! Exposes the pure URL, query and header functions through `extern "C"` so
//! a host written in any language with a C FFI can reuse them. The host keeps
//! doing its own network I/O; only string processing crosses the boundary.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Null arguments yield a null return instead of an error envelope: none of
//!   these functions can otherwise fail.
//! - The C caller owns every returned pointer and must release it with the
//!   matching `httpkit_free_*` function.

pub mod types;

use std::borrow::Cow;
use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::catch_unwind;
use std::ptr;

use httpkit_core::{header, query, url, UrlFlags};

use types::*;

/// Borrow a C string, replacing invalid UTF-8.
///
/// # Safety
/// `s` must be non-null and point to a NUL-terminated string.
unsafe fn read_str<'a>(s: *const c_char) -> Cow<'a, str> {
    unsafe { CStr::from_ptr(s) }.to_string_lossy()
}

// ---------------------------------------------------------------------------
// URL building
// ---------------------------------------------------------------------------

/// Merge `parts` into `base` under `flags` (the `HTTP_URL_*` bit values) and
/// return the resulting URL.
///
/// A null `base` means the URL of the request currently being served, read
/// from the CGI environment. Unknown flag bits are ignored.
/// Returns null if `parts` is null.
/// The caller must free the returned string with `httpkit_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_build_url(
    base: *const c_char,
    parts: *const c_char,
    flags: u32,
) -> *mut c_char {
    catch_unwind(|| {
        if parts.is_null() {
            return ptr::null_mut();
        }
        let base = (!base.is_null()).then(|| unsafe { read_str(base) });
        let parts = unsafe { read_str(parts) };
        let (built, _) = url::build(
            base.as_deref(),
            &parts,
            UrlFlags::from_bits_truncate(flags),
        );
        into_c_string(built)
    })
    .unwrap_or(ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

/// Percent-encode a single query value.
///
/// Returns null if `value` is null.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_encode_value(value: *const c_char) -> *mut c_char {
    catch_unwind(|| {
        if value.is_null() {
            return ptr::null_mut();
        }
        let value = unsafe { read_str(value) };
        into_c_string(query::encode_value(&value))
    })
    .unwrap_or(ptr::null_mut())
}

/// Decode a `a=1&b=two&flag` string into typed parameters, sorted by key.
///
/// Returns null if `input` is null.
/// The caller must free the returned list with `httpkit_free_params`.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_parse_parameters(input: *const c_char) -> *mut FfiParamList {
    catch_unwind(|| {
        if input.is_null() {
            return ptr::null_mut();
        }
        let input = unsafe { read_str(input) };
        FfiParamList::from_core(query::decode_parameters(&input))
    })
    .unwrap_or(ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// Parse raw response header text, one record per block, final response
/// first.
///
/// Returns null if `raw` is null.
/// The caller must free the returned list with `httpkit_free_headers`.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_parse_header(raw: *const c_char) -> *mut FfiHeaderList {
    catch_unwind(|| {
        if raw.is_null() {
            return ptr::null_mut();
        }
        let raw = unsafe { read_str(raw) };
        FfiHeaderList::from_core(header::parse(&raw))
    })
    .unwrap_or(ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a string returned by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| unsafe { free_c_string(s) });
    }
}

/// Free a list returned by `httpkit_parse_parameters`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_free_params(list: *mut FfiParamList) {
    if !list.is_null() {
        let _ = catch_unwind(|| unsafe { FfiParamList::free(list) });
    }
}

/// Free a list returned by `httpkit_parse_header`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_free_headers(list: *mut FfiHeaderList) {
    if !list.is_null() {
        let _ = catch_unwind(|| unsafe { FfiHeaderList::free(list) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
