//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + length instead of `Vec` or
//! `BTreeMap`, and a tag enum for `QueryValue`. Conversions and the matching
//! deallocation live here so `lib.rs` stays focused on the `extern "C"`
//! surface.

use std::collections::BTreeMap;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

use httpkit_core::{HeaderRecord, QueryValue};

// ---------------------------------------------------------------------------
// Allocation helpers
// ---------------------------------------------------------------------------

/// Hand a Rust string to C. Text after an embedded NUL is dropped, which is
/// what a C reader would see anyway.
pub(crate) fn into_c_string(mut s: String) -> *mut c_char {
    if let Some(nul) = s.find('\0') {
        s.truncate(nul);
    }
    CString::new(s).unwrap_or_default().into_raw()
}

/// Reclaim a string produced by `into_c_string`. Null is ignored.
///
/// # Safety
/// `s` must be null or come from `into_c_string` and not be freed yet.
pub(crate) unsafe fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Leak a `Vec` as pointer + length. An empty vec becomes a null pointer.
fn into_raw_slice<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (ptr::null_mut(), 0);
    }
    let len = items.len() as u32;
    let slice = Box::into_raw(items.into_boxed_slice());
    (slice as *mut T, len)
}

/// Reclaim a slice produced by `into_raw_slice`.
///
/// # Safety
/// `items` and `len` must come from the same `into_raw_slice` call.
unsafe fn from_raw_slice<T>(items: *mut T, len: u32) -> Vec<T> {
    if items.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = ptr::slice_from_raw_parts_mut(items, len as usize);
    unsafe { Box::from_raw(slice) }.into_vec()
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Which field of `FfiParam` carries the value.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiValueKind {
    /// The pair had no `=`; no value field is set.
    Null = 0,
    Int = 1,
    Bool = 2,
    Str = 3,
}

/// One decoded `key=value` pair.
#[repr(C)]
pub struct FfiParam {
    pub key: *mut c_char,
    pub kind: FfiValueKind,
    pub int_value: i64,
    pub bool_value: bool,
    /// Set only when `kind` is `Str`, null otherwise.
    pub str_value: *mut c_char,
}

impl FfiParam {
    fn new(key: String, value: Option<QueryValue>) -> Self {
        let mut param = FfiParam {
            key: into_c_string(key),
            kind: FfiValueKind::Null,
            int_value: 0,
            bool_value: false,
            str_value: ptr::null_mut(),
        };
        match value {
            None => {}
            Some(QueryValue::Int(n)) => {
                param.kind = FfiValueKind::Int;
                param.int_value = n;
            }
            Some(QueryValue::Bool(b)) => {
                param.kind = FfiValueKind::Bool;
                param.bool_value = b;
            }
            Some(QueryValue::Str(s)) => {
                param.kind = FfiValueKind::Str;
                param.str_value = into_c_string(s);
            }
        }
        param
    }
}

/// Decoded parameters in key order.
#[repr(C)]
pub struct FfiParamList {
    pub items: *mut FfiParam,
    pub len: u32,
}

impl FfiParamList {
    pub(crate) fn from_core(params: BTreeMap<String, Option<QueryValue>>) -> *mut Self {
        let params: Vec<FfiParam> = params
            .into_iter()
            .map(|(key, value)| FfiParam::new(key, value))
            .collect();
        let (items, len) = into_raw_slice(params);
        Box::into_raw(Box::new(FfiParamList { items, len }))
    }

    /// # Safety
    /// `list` must come from `from_core` and not be freed yet.
    pub(crate) unsafe fn free(list: *mut Self) {
        let list = unsafe { Box::from_raw(list) };
        for param in unsafe { from_raw_slice(list.items, list.len) } {
            unsafe {
                free_c_string(param.key);
                free_c_string(param.str_value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Header records
// ---------------------------------------------------------------------------

/// A header field with its normalized name (`content_type`).
#[repr(C)]
pub struct FfiHeaderField {
    pub name: *mut c_char,
    pub value: *mut c_char,
}

/// One response header block.
#[repr(C)]
pub struct FfiHeaderRecord {
    pub protocol: *mut c_char,
    pub protocol_version: *mut c_char,
    pub status_code: u16,
    pub status_text: *mut c_char,
    pub fields: *mut FfiHeaderField,
    pub fields_len: u32,
}

impl FfiHeaderRecord {
    fn from_core(record: HeaderRecord) -> Self {
        let fields: Vec<FfiHeaderField> = record
            .fields
            .into_iter()
            .map(|(name, value)| FfiHeaderField {
                name: into_c_string(name),
                value: into_c_string(value),
            })
            .collect();
        let (fields, fields_len) = into_raw_slice(fields);
        FfiHeaderRecord {
            protocol: into_c_string(record.protocol),
            protocol_version: into_c_string(record.protocol_version),
            status_code: record.status_code,
            status_text: into_c_string(record.status_text),
            fields,
            fields_len,
        }
    }

    unsafe fn free_fields(&self) {
        unsafe {
            free_c_string(self.protocol);
            free_c_string(self.protocol_version);
            free_c_string(self.status_text);
        }
        for field in unsafe { from_raw_slice(self.fields, self.fields_len) } {
            unsafe {
                free_c_string(field.name);
                free_c_string(field.value);
            }
        }
    }
}

/// Parsed header blocks, final response first.
#[repr(C)]
pub struct FfiHeaderList {
    pub records: *mut FfiHeaderRecord,
    pub len: u32,
}

impl FfiHeaderList {
    pub(crate) fn from_core(records: Vec<HeaderRecord>) -> *mut Self {
        let records: Vec<FfiHeaderRecord> =
            records.into_iter().map(FfiHeaderRecord::from_core).collect();
        let (records, len) = into_raw_slice(records);
        Box::into_raw(Box::new(FfiHeaderList { records, len }))
    }

    /// # Safety
    /// `list` must come from `from_core` and not be freed yet.
    pub(crate) unsafe fn free(list: *mut Self) {
        let list = unsafe { Box::from_raw(list) };
        for record in unsafe { from_raw_slice(list.records, list.len) } {
            unsafe { record.free_fields() };
        }
    }
}
