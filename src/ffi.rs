//! C-compatible FFI API for cross-language bindings.
//!
//! # ABI Contract
//!
//! All exported functions use `extern "C"` calling convention and `#[no_mangle]`
//! to ensure stable symbol names.
//!
//! ## Initialisation
//! `expd_init` must succeed once before any generating call. It loads the
//! report fonts (or selects the builtin ones) and keeps them for the life of
//! the process. Later calls to `expd_init` are no-ops.
//!
//! ## Memory management
//! - Buffers returned by `expd_*` functions are allocated on the Rust heap.
//! - Callers **must** free them with `expd_free_buffer` / `expd_free_string`.
//! - Passing a null pointer to a free function is a no-op.
//!
//! ## Error handling
//! Functions that can fail return a `c_int`:
//!
//! | code | meaning |
//! |------|---------|
//! | 0 | success |
//! | 1 | null pointer argument |
//! | 2 | invalid UTF-8 |
//! | 3 | rejected input (not JSON, not a list of records, bad layout JSON) |
//! | 4 | rendering or font failure |
//! | 5 | `expd_init` has not succeeded yet |
//!
//! Error details can be retrieved via `expd_last_error`, which is
//! thread-local.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::slice;
use std::sync::OnceLock;

use serde_json::Value;

use crate::error::Error;
use crate::layout_config::{LayoutConfig, PageMargins};
use crate::pipeline::{compute_layout_config, generate_pdf, PipelineConfig};
use crate::render::render_pdf;
use crate::resources::ReportResources;

const ERR_NULL: c_int = 1;
const ERR_UTF8: c_int = 2;
const ERR_INPUT: c_int = 3;
const ERR_RENDER: c_int = 4;
const ERR_UNINITIALISED: c_int = 5;

static RESOURCES: OnceLock<ReportResources> = OnceLock::new();

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Record `err` and map it to its return code.
fn fail(err: &Error) -> c_int {
    set_last_error(&err.to_string());
    if err.is_client_error() {
        ERR_INPUT
    } else {
        ERR_RENDER
    }
}

fn resources() -> Result<&'static ReportResources, c_int> {
    RESOURCES.get().ok_or_else(|| {
        set_last_error("expd_init has not been called");
        ERR_UNINITIALISED
    })
}

// ---------------------------------------------------------------------------
// C-compatible configuration types
// ---------------------------------------------------------------------------

/// Optional configuration passed to the generating functions.
///
/// Fields set to `0` (or `NULL` for `title`) fall back to their defaults:
/// - `page_width` / `page_height` → US Letter, 612 × 792 pt
/// - margins → 7.2 pt top, 36 pt bottom, 28.8 pt left and right
/// - `title` → "Expedientes"
/// - `omit_trailing_break` → `0`, the last record is followed by a page break
#[repr(C)]
pub struct ExpdPipelineConfig {
    /// Null-terminated UTF-8 document title embedded in PDF metadata.
    pub title: *const c_char,
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    /// Non-zero drops the page break after the last record.
    pub omit_trailing_break: u8,
}

/// Convert an `ExpdPipelineConfig` (FFI) to a `PipelineConfig` (Rust).
///
/// # Safety
/// `cfg.title`, if non-null, must point to a valid null-terminated UTF-8 string.
unsafe fn pipeline_config_from_c(cfg: &ExpdPipelineConfig) -> PipelineConfig {
    let defaults = PipelineConfig::default();
    let or = |v: f32, d: f32| if v == 0.0 { d } else { v };

    let title = if cfg.title.is_null() {
        defaults.title.clone()
    } else {
        CStr::from_ptr(cfg.title)
            .to_str()
            .map(str::to_string)
            .unwrap_or_else(|_| defaults.title.clone())
    };

    let m = PageMargins::REPORT;
    PipelineConfig {
        title,
        page_width: or(cfg.page_width, defaults.page_width),
        page_height: or(cfg.page_height, defaults.page_height),
        margins: PageMargins {
            top: or(cfg.margin_top, m.top),
            bottom: or(cfg.margin_bottom, m.bottom),
            left: or(cfg.margin_left, m.left),
            right: or(cfg.margin_right, m.right),
        },
        trailing_page_break: cfg.omit_trailing_break == 0,
        month_names: None,
    }
}

/// # Safety
/// `cfg` must be null or point to a valid [`ExpdPipelineConfig`].
unsafe fn config_or_default(cfg: *const ExpdPipelineConfig) -> PipelineConfig {
    if cfg.is_null() {
        PipelineConfig::default()
    } else {
        pipeline_config_from_c(&*cfg)
    }
}

/// Decode the JSON payload behind `json_ptr`.
///
/// # Safety
/// `json_ptr` must point to `json_len` valid bytes.
unsafe fn read_payload(json_ptr: *const u8, json_len: u32) -> Result<Value, c_int> {
    let bytes = slice::from_raw_parts(json_ptr, json_len as usize);
    let text = std::str::from_utf8(bytes).map_err(|e| {
        set_last_error(&format!("Invalid UTF-8: {e}"));
        ERR_UTF8
    })?;
    serde_json::from_str(text).map_err(|e| fail(&Error::from(e)))
}

/// Hand a byte buffer to the caller.
///
/// # Safety
/// `out_buf` and `out_len` must be valid pointers.
unsafe fn write_buffer(bytes: Vec<u8>, out_buf: *mut *mut u8, out_len: *mut u32) {
    let len = bytes.len() as u32;
    let buf = bytes.into_boxed_slice();
    *out_buf = Box::into_raw(buf) as *mut u8;
    *out_len = len;
}

/// Hand the layout JSON to the caller; null if it cannot be represented.
///
/// # Safety
/// `out_json_ptr` must be a valid pointer.
unsafe fn write_layout_json(json: String, out_json_ptr: *mut *mut c_char) -> bool {
    match CString::new(json) {
        Ok(cs) => {
            *out_json_ptr = cs.into_raw();
            true
        }
        Err(_) => {
            *out_json_ptr = ptr::null_mut();
            false
        }
    }
}

/// Hand both the PDF and its layout JSON to the caller, or neither.
///
/// # Safety
/// All three out pointers must be valid.
unsafe fn write_pdf_with_layout(
    pdf_bytes: Vec<u8>,
    layout_json: String,
    out_pdf_buf: *mut *mut u8,
    out_pdf_len: *mut u32,
    out_json_ptr: *mut *mut c_char,
) -> c_int {
    if !write_layout_json(layout_json, out_json_ptr) {
        *out_pdf_buf = ptr::null_mut();
        *out_pdf_len = 0;
        set_last_error("JSON contained null byte");
        return ERR_RENDER;
    }
    write_buffer(pdf_bytes, out_pdf_buf, out_pdf_len);
    0
}

// ---------------------------------------------------------------------------
// Core API
// ---------------------------------------------------------------------------

/// Load the report fonts from `font_dir`, or use the builtin Helvetica faces
/// when `font_dir` is `NULL`.
///
/// # Returns
/// `0` on success (also when already initialised), `4` if the fonts cannot
/// be loaded.
///
/// # Safety
/// `font_dir`, if non-null, must point to a valid null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn expd_init(font_dir: *const c_char) -> c_int {
    if RESOURCES.get().is_some() {
        return 0;
    }
    let loaded = if font_dir.is_null() {
        Ok(ReportResources::builtin())
    } else {
        match CStr::from_ptr(font_dir).to_str() {
            Ok(dir) => ReportResources::from_font_dir(dir),
            Err(e) => {
                set_last_error(&format!("Invalid UTF-8 in font dir: {e}"));
                return ERR_UTF8;
            }
        }
    };
    match loaded {
        Ok(res) => {
            if RESOURCES.set(res).is_err() {
                log::debug!("Report resources were initialised concurrently");
            }
            0
        }
        Err(e) => fail(&e),
    }
}

/// Generate a PDF from a JSON list of records.
///
/// # Parameters
/// - `json_ptr`, `json_len`: UTF-8 JSON input (not necessarily null-terminated)
/// - `cfg`: optional pointer to an [`ExpdPipelineConfig`]; pass `NULL` for defaults
/// - `out_buf`, `out_len`: on success, the heap-allocated PDF bytes
///
/// # Returns
/// `0` on success, non-zero on error. On error, call `expd_last_error`.
///
/// # Safety
/// - `json_ptr` must point to `json_len` valid bytes.
/// - `cfg`, if non-null, must point to a valid [`ExpdPipelineConfig`].
/// - `out_buf` and `out_len` must be valid pointers.
/// - The caller must free `*out_buf` by calling `expd_free_buffer`.
#[no_mangle]
pub unsafe extern "C" fn expd_generate(
    json_ptr: *const u8,
    json_len: u32,
    cfg: *const ExpdPipelineConfig,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
) -> c_int {
    if json_ptr.is_null() || out_buf.is_null() || out_len.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }
    let res = match resources() {
        Ok(r) => r,
        Err(code) => return code,
    };
    let payload = match read_payload(json_ptr, json_len) {
        Ok(v) => v,
        Err(code) => return code,
    };

    match generate_pdf(&payload, res, &config_or_default(cfg)) {
        Ok((pdf_bytes, _)) => {
            write_buffer(pdf_bytes, out_buf, out_len);
            0
        }
        Err(e) => fail(&e),
    }
}

/// Generate a PDF and also return the layout config JSON.
///
/// # Safety
/// Same as `expd_generate`. Additionally, `*out_json_ptr` must be freed
/// with `expd_free_string`.
#[no_mangle]
pub unsafe extern "C" fn expd_generate_with_layout(
    json_ptr: *const u8,
    json_len: u32,
    cfg: *const ExpdPipelineConfig,
    out_pdf_buf: *mut *mut u8,
    out_pdf_len: *mut u32,
    out_json_ptr: *mut *mut c_char,
) -> c_int {
    if json_ptr.is_null()
        || out_pdf_buf.is_null()
        || out_pdf_len.is_null()
        || out_json_ptr.is_null()
    {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }
    let res = match resources() {
        Ok(r) => r,
        Err(code) => return code,
    };
    let payload = match read_payload(json_ptr, json_len) {
        Ok(v) => v,
        Err(code) => return code,
    };

    match generate_pdf(&payload, res, &config_or_default(cfg)) {
        Ok((pdf_bytes, layout_config)) => write_pdf_with_layout(
            pdf_bytes,
            layout_config.to_json(),
            out_pdf_buf,
            out_pdf_len,
            out_json_ptr,
        ),
        Err(e) => fail(&e),
    }
}

/// Compute only the layout config (no PDF rendering). Returns JSON.
///
/// # Safety
/// - `json_ptr` must point to `json_len` valid bytes.
/// - `cfg`, if non-null, must point to a valid [`ExpdPipelineConfig`].
/// - `*out_json_ptr` must be freed with `expd_free_string`.
#[no_mangle]
pub unsafe extern "C" fn expd_compute_layout(
    json_ptr: *const u8,
    json_len: u32,
    cfg: *const ExpdPipelineConfig,
    out_json_ptr: *mut *mut c_char,
) -> c_int {
    if json_ptr.is_null() || out_json_ptr.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }
    let res = match resources() {
        Ok(r) => r,
        Err(code) => return code,
    };
    let payload = match read_payload(json_ptr, json_len) {
        Ok(v) => v,
        Err(code) => return code,
    };

    match compute_layout_config(&payload, res, &config_or_default(cfg)) {
        Ok(layout) => {
            if write_layout_json(layout.to_json(), out_json_ptr) {
                0
            } else {
                set_last_error("JSON contained null byte");
                ERR_RENDER
            }
        }
        Err(e) => fail(&e),
    }
}

/// Render a PDF from a layout config JSON string.
///
/// This allows pre-computing the layout and rendering separately.
///
/// # Safety
/// - `json_ptr` must point to a valid null-terminated string.
/// - `out_buf` and `out_len` must be valid pointers.
#[no_mangle]
pub unsafe extern "C" fn expd_render_from_layout(
    json_ptr: *const c_char,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
) -> c_int {
    if json_ptr.is_null() || out_buf.is_null() || out_len.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }
    let res = match resources() {
        Ok(r) => r,
        Err(code) => return code,
    };

    let json = match CStr::from_ptr(json_ptr).to_str() {
        Ok(s) => s,
        Err(e) => {
            set_last_error(&format!("Invalid UTF-8 in JSON: {e}"));
            return ERR_UTF8;
        }
    };

    let rendered = LayoutConfig::from_json(json).and_then(|l| render_pdf(&l, &res.fonts));
    match rendered {
        Ok(pdf_bytes) => {
            write_buffer(pdf_bytes, out_buf, out_len);
            0
        }
        Err(e) => fail(&e),
    }
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Free a PDF buffer returned by `expd_generate` (or similar).
///
/// # Safety
/// `buf` must have been returned by a previous `expd_*` call, and `len` must
/// be the corresponding length.
#[no_mangle]
pub unsafe extern "C" fn expd_free_buffer(buf: *mut u8, len: u32) {
    if !buf.is_null() {
        let _ = Box::from_raw(slice::from_raw_parts_mut(buf, len as usize));
    }
}

/// Free a layout JSON string.
///
/// # Safety
/// `s` must have been returned by an `expd_*` call.
#[no_mangle]
pub unsafe extern "C" fn expd_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

/// Retrieve the last error message. Returns a null-terminated string.
///
/// The returned pointer is valid until the next `expd_*` call on the same
/// thread. The caller should **not** free this pointer.
///
/// Returns null if no error has occurred.
#[no_mangle]
pub extern "C" fn expd_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        let borrow = e.borrow();
        match borrow.as_ref() {
            Some(cs) => cs.as_ptr(),
            None => ptr::null(),
        }
    })
}

/// Return the library version as a null-terminated string.
/// The caller must **not** free this pointer.
#[no_mangle]
pub extern "C" fn expd_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        assert_eq!(unsafe { expd_init(ptr::null()) }, 0);
    }

    fn last_error() -> String {
        let p = expd_last_error();
        assert!(!p.is_null());
        unsafe { CStr::from_ptr(p) }.to_str().unwrap().to_string()
    }

    #[test]
    fn ffi_generate() {
        init();
        let json = br#"[{"expedientName": "Hola FFI"}]"#;
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;

        let rc = unsafe {
            expd_generate(
                json.as_ptr(),
                json.len() as u32,
                ptr::null(),
                &mut out_buf,
                &mut out_len,
            )
        };

        assert_eq!(rc, 0, "Expected success");
        assert!(!out_buf.is_null());
        assert!(out_len > 100);

        let bytes = unsafe { slice::from_raw_parts(out_buf, out_len as usize) };
        assert_eq!(&bytes[0..5], b"%PDF-");

        unsafe { expd_free_buffer(out_buf, out_len) };
    }

    #[test]
    fn ffi_rejects_non_list_payload() {
        init();
        let json = br#"{"expedientName": "x"}"#;
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;

        let rc = unsafe {
            expd_generate(
                json.as_ptr(),
                json.len() as u32,
                ptr::null(),
                &mut out_buf,
                &mut out_len,
            )
        };

        assert_eq!(rc, ERR_INPUT);
        assert!(out_buf.is_null());
        assert!(last_error().contains("list"));
    }

    #[test]
    fn ffi_rejects_broken_json() {
        init();
        let json = b"[{";
        let mut json_ptr: *mut c_char = ptr::null_mut();
        let rc = unsafe {
            expd_compute_layout(json.as_ptr(), json.len() as u32, ptr::null(), &mut json_ptr)
        };
        assert_eq!(rc, ERR_INPUT);
        assert!(json_ptr.is_null());
    }

    #[test]
    fn ffi_compute_layout_then_render() {
        init();
        let json = b"[{}]";
        let mut json_ptr: *mut c_char = ptr::null_mut();

        let rc = unsafe {
            expd_compute_layout(json.as_ptr(), json.len() as u32, ptr::null(), &mut json_ptr)
        };
        assert_eq!(rc, 0);
        assert!(!json_ptr.is_null());

        let layout = unsafe { CStr::from_ptr(json_ptr) }.to_str().unwrap();
        assert!(layout.contains("page_width_pt"));

        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;
        let rc = unsafe { expd_render_from_layout(json_ptr, &mut out_buf, &mut out_len) };
        assert_eq!(rc, 0);
        assert!(out_len > 100);

        unsafe {
            expd_free_buffer(out_buf, out_len);
            expd_free_string(json_ptr);
        }
    }

    #[test]
    fn ffi_custom_config() {
        init();
        let json = b"[{}]";
        let title = CString::new("Cartera").unwrap();
        let cfg = ExpdPipelineConfig {
            title: title.as_ptr(),
            page_width: 0.0,
            page_height: 0.0,
            margin_top: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            margin_right: 0.0,
            omit_trailing_break: 1,
        };
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;
        let mut json_ptr: *mut c_char = ptr::null_mut();

        let rc = unsafe {
            expd_generate_with_layout(
                json.as_ptr(),
                json.len() as u32,
                &cfg,
                &mut out_buf,
                &mut out_len,
                &mut json_ptr,
            )
        };
        assert_eq!(rc, 0);

        let layout = unsafe { CStr::from_ptr(json_ptr) }.to_str().unwrap();
        let layout = LayoutConfig::from_json(layout).unwrap();
        assert_eq!(layout.title, "Cartera");
        assert_eq!(layout.pages.len(), 1);

        unsafe {
            expd_free_buffer(out_buf, out_len);
            expd_free_string(json_ptr);
        }
    }

    #[test]
    fn ffi_bad_margins_are_render_errors() {
        init();
        let json = b"[{}]";
        let cfg = ExpdPipelineConfig {
            title: ptr::null(),
            page_width: 0.0,
            page_height: 0.0,
            margin_top: 0.0,
            margin_bottom: 0.0,
            margin_left: 400.0,
            margin_right: 400.0,
            omit_trailing_break: 0,
        };
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;
        let rc = unsafe {
            expd_generate(json.as_ptr(), json.len() as u32, &cfg, &mut out_buf, &mut out_len)
        };
        assert_eq!(rc, ERR_RENDER);
        assert!(out_buf.is_null());
    }

    #[test]
    fn ffi_null_input() {
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 0;

        let rc = unsafe { expd_generate(ptr::null(), 0, ptr::null(), &mut out_buf, &mut out_len) };

        assert_eq!(rc, ERR_NULL);
    }

    #[test]
    fn unrepresentable_layout_json_hands_back_nothing() {
        let mut out_buf: *mut u8 = ptr::null_mut();
        let mut out_len: u32 = 7;
        let mut out_json: *mut c_char = ptr::null_mut();

        let rc = unsafe {
            write_pdf_with_layout(
                b"%PDF-".to_vec(),
                "{\"title\":\"a\0b\"}".to_string(),
                &mut out_buf,
                &mut out_len,
                &mut out_json,
            )
        };
        assert_eq!(rc, ERR_RENDER);
        assert!(out_buf.is_null());
        assert_eq!(out_len, 0);
        assert!(out_json.is_null());
        assert_eq!(last_error(), "JSON contained null byte");
    }

    #[test]
    fn ffi_version() {
        let v = expd_version();
        let version = unsafe { CStr::from_ptr(v) }.to_str().unwrap();
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }
}
