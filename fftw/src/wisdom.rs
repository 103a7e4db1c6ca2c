//! Accumulated planner knowledge ("wisdom") import and export.
//!
//! Wisdom is process-global state inside the native library: every plan
//! built with `MEASURE` or better deposits knowledge that later plans of
//! the same geometry reuse. These functions move that state to and from
//! files and strings. The boolean results mirror the native API: `false`
//! means the library rejected the input, not that the call misfired.

use std::ffi::{CString, c_char, c_void};
use std::path::Path;

use buffer::{Error, Result};

use crate::api;

fn c_path(path: &Path) -> Result<CString> {
    let utf8 = path.to_str().ok_or(Error::InvalidPath)?;
    CString::new(utf8).map_err(|_| Error::InvalidPath)
}

/// Writes the process's accumulated wisdom to `path`.
pub fn export_to_file(path: &Path) -> Result<bool> {
    let api = api::api()?;
    let path = c_path(path)?;
    Ok(unsafe { (api.export_wisdom_to_filename)(path.as_ptr()) } != 0)
}

/// Merges wisdom from `path` into the process.
pub fn import_from_file(path: &Path) -> Result<bool> {
    let api = api::api()?;
    let path = c_path(path)?;
    Ok(unsafe { (api.import_wisdom_from_filename)(path.as_ptr()) } != 0)
}

unsafe extern "C" fn capture_byte(c: c_char, data: *mut c_void) {
    let out = unsafe { &mut *(data as *mut Vec<u8>) };
    out.push(c as u8);
}

/// Returns the process's accumulated wisdom as a string.
///
/// The bytes are collected through the library's character callback, so
/// no native-owned string has to be freed on this side.
pub fn export_string() -> Result<String> {
    let api = api::api()?;
    let mut out = Vec::new();
    unsafe { (api.export_wisdom)(capture_byte, &mut out as *mut Vec<u8> as *mut c_void) };
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Merges wisdom from a string previously produced by [`export_string`].
pub fn import_from_string(wisdom: &str) -> Result<bool> {
    let api = api::api()?;
    let Ok(wisdom) = CString::new(wisdom) else {
        // Valid wisdom is a NUL-free s-expression.
        return Ok(false);
    };
    Ok(unsafe { (api.import_wisdom_from_string)(wisdom.as_ptr()) } != 0)
}

/// Discards all wisdom accumulated so far.
pub fn forget() -> Result<()> {
    let api = api::api()?;
    unsafe { (api.forget_wisdom)() };
    Ok(())
}
