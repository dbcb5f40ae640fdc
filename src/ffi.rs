//! FFI interface for native hosts
//!
//! Provides C-compatible functions for driving a selection session.
//! Element targets, configuration and results are passed as JSON:
//! a target is the element-child index path from the document element,
//! e.g. `[1, 0, 2]` for the third child of the first child of `<body>`.

use std::cell::Cell;
use std::ffi::{c_char, CStr, CString};
use std::ptr;
use std::rc::Rc;

use serde::Serialize;
use serde_json::json;

use crate::config::EngineConfig;
use crate::dom::Page;
use crate::selector::SelectorGenerator;
use crate::session::Session;
use crate::types::{FieldType, SelectionEvent};

type FieldSource = Box<dyn Fn() -> FieldType>;
type EventSink = Box<dyn FnMut(SelectionEvent)>;

/// Opaque session handle owned by the host
pub struct TentSession {
    session: Session<FieldSource, EventSink>,
    field_type: Rc<Cell<FieldType>>,
}

/// Result struct returned to the host
/// Both pointers are owned by Rust and must be freed via free_tent_result
#[repr(C)]
pub struct TentResultFFI {
    /// JSON-serialized result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if the call failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Install the selection engine on an HTML document.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `config_json` - JSON-serialized EngineConfig (null-terminated), or null for defaults
///
/// # Returns
/// A session handle, or null when the document has no body, already carries
/// the engine, or the input is invalid
///
/// The session has no dispatch callback: each selection is delivered to the
/// host as the return value of the `tent_click` call that produced it, and
/// the host forwards it to its own store.
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `config_json` must be null or a valid null-terminated C string
/// - Caller must release the handle via `tent_session_free`
#[no_mangle]
pub unsafe extern "C" fn tent_session_new(
    html_ptr: *const c_char,
    html_len: usize,
    config_json: *const c_char,
) -> *mut TentSession {
    let Ok(html) = read_html(html_ptr, html_len) else {
        return ptr::null_mut();
    };

    let config = if config_json.is_null() {
        EngineConfig::default()
    } else {
        match CStr::from_ptr(config_json).to_str() {
            Ok(s) => match EngineConfig::from_json(s) {
                Ok(config) => config,
                Err(_) => return ptr::null_mut(),
            },
            Err(_) => return ptr::null_mut(),
        }
    };

    let mut page = Page::parse(&html);
    match config.parsed_base_url() {
        Ok(Some(base)) => page = page.with_base_url(base),
        Ok(None) => {}
        Err(_) => return ptr::null_mut(),
    }

    let field_type = Rc::new(Cell::new(FieldType::Unknown));
    let reader = field_type.clone();
    let source: FieldSource = Box::new(move || reader.get());
    let sink: EventSink = Box::new(|_event| {});

    match Session::start(page, &config, source, sink) {
        Some(session) => Box::into_raw(Box::new(TentSession {
            session,
            field_type,
        })),
        None => ptr::null_mut(),
    }
}

/// Release a session created by tent_session_new
///
/// # Safety
/// - `session` must be null or a handle returned by `tent_session_new`
/// - Must only be called once per handle
#[no_mangle]
pub unsafe extern "C" fn tent_session_free(session: *mut TentSession) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Pointer moved over an element.
///
/// Result JSON: `{"highlighted": [path]}` or `{"highlighted": null}`
///
/// # Safety
/// - `session` must be a live handle from `tent_session_new`
/// - `target_json` and `field_type` must be valid null-terminated C strings
#[no_mangle]
pub unsafe extern "C" fn tent_pointer_over(
    session: *mut TentSession,
    target_json: *const c_char,
    field_type: *const c_char,
) -> TentResultFFI {
    let Some(handle) = session.as_mut() else {
        return make_error_result("Session is null");
    };
    let target = match resolve_target(handle.session.page(), target_json) {
        Ok(target) => target,
        Err(msg) => return make_error_result(&msg),
    };
    match read_field_type(field_type) {
        Ok(ft) => handle.field_type.set(ft),
        Err(msg) => return make_error_result(&msg),
    }

    handle.session.pointer_over(target);

    let highlighted = handle
        .session
        .controller()
        .highlighter()
        .current()
        .map(|highlight| handle.session.page().element_path(highlight.target));
    json_result(&json!({ "highlighted": highlighted }))
}

/// Element clicked.
///
/// Result JSON: the SelectionEvent (`{"selector": ..., "content": ...}`),
/// or `null` when the element yields nothing for the field type
///
/// # Safety
/// Same as tent_pointer_over
#[no_mangle]
pub unsafe extern "C" fn tent_click(
    session: *mut TentSession,
    target_json: *const c_char,
    field_type: *const c_char,
) -> TentResultFFI {
    let Some(handle) = session.as_mut() else {
        return make_error_result("Session is null");
    };
    let target = match resolve_target(handle.session.page(), target_json) {
        Ok(target) => target,
        Err(msg) => return make_error_result(&msg),
    };
    match read_field_type(field_type) {
        Ok(ft) => handle.field_type.set(ft),
        Err(msg) => return make_error_result(&msg),
    }

    let event = handle.session.click(target);
    json_result(&event)
}

/// Serialize the session's page.
///
/// Result JSON: `{"html": "..."}`
///
/// # Safety
/// - `session` must be a live handle from `tent_session_new`
#[no_mangle]
pub unsafe extern "C" fn tent_session_html(session: *const TentSession) -> TentResultFFI {
    let Some(handle) = session.as_ref() else {
        return make_error_result("Session is null");
    };
    json_result(&json!({ "html": handle.session.page().html() }))
}

/// One-shot selector generation for an element of an HTML document.
///
/// Result JSON: `{"selector": "..."}`
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `target_json` must be a valid null-terminated C string
#[no_mangle]
pub unsafe extern "C" fn tent_generate_selector(
    html_ptr: *const c_char,
    html_len: usize,
    target_json: *const c_char,
) -> TentResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(html) => html,
        Err(msg) => return make_error_result(msg),
    };
    let page = Page::parse(&html);
    let target = match resolve_target(&page, target_json) {
        Ok(target) => target,
        Err(msg) => return make_error_result(&msg),
    };

    match SelectorGenerator::default().generate(&page, target) {
        Ok(selector) => json_result(&json!({ "selector": selector })),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Free a TentResultFFI returned by any tent_* function
///
/// # Safety
/// - `result` must have been returned by this library
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_tent_result(result: TentResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

unsafe fn read_html(html_ptr: *const c_char, html_len: usize) -> Result<String, &'static str> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok(String::new());
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice)
        .map(str::to_string)
        .map_err(|_| "Invalid UTF-8 in HTML content")
}

unsafe fn resolve_target(page: &Page, target_json: *const c_char) -> Result<ego_tree::NodeId, String> {
    if target_json.is_null() {
        return Err("Target is null".to_string());
    }
    let raw = CStr::from_ptr(target_json)
        .to_str()
        .map_err(|_| "Invalid UTF-8 in target".to_string())?;
    let path: Vec<usize> =
        serde_json::from_str(raw).map_err(|e| format!("Failed to parse target JSON: {}", e))?;
    page.resolve_path(&path).map_err(|e| e.to_string())
}

unsafe fn read_field_type(field_type: *const c_char) -> Result<FieldType, String> {
    if field_type.is_null() {
        return Ok(FieldType::Unknown);
    }
    let raw = CStr::from_ptr(field_type)
        .to_str()
        .map_err(|_| "Invalid UTF-8 in field type".to_string())?;
    // Parsing never fails: unrecognized names become Unknown
    Ok(raw.parse::<FieldType>().unwrap_or_default())
}

fn json_result<T: Serialize>(value: &T) -> TentResultFFI {
    match serde_json::to_string(value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => TentResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

// Helper to create error result
fn make_error_result(msg: &str) -> TentResultFFI {
    let error_cstr = CString::new(msg).unwrap_or_else(|_| CString::new("Unknown error").unwrap_or_default());
    TentResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
