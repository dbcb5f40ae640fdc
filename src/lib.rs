//! Point-and-click element selection for web pages
//!
//! Installs a selection tool onto a parsed HTML page:
//! - Isolation sandbox separating page content from the injected UI
//! - Hover highlighting of elements that yield a value for the current field type
//! - Click-to-select producing a unique CSS selector plus the extracted value
//! - FFI interface for native hosts

pub mod config;
pub mod controller;
pub mod dom;
pub mod error;
pub mod extractors;
pub mod ffi;
pub mod highlight;
pub mod sandbox;
pub mod selector;
pub mod session;
pub mod store;
pub mod types;

pub use config::{EngineConfig, HighlightConfig, SelectorConfig, SelectorStrategy};
pub use controller::{PointerEvent, SelectionController};
pub use dom::Page;
pub use error::{EngineError, Result};
pub use extractors::*;
pub use ffi::*;
pub use highlight::{Highlight, HoverHighlighter, Marker};
pub use sandbox::{IsolationSandbox, SandboxRoots};
pub use selector::SelectorGenerator;
pub use session::{Session, SidebarRenderer};
pub use store::{field_store, FieldStore, FieldTypeSource, SelectionSink, StoreHandle, StoreState};
pub use types::{ExtractedValue, FieldType, SelectionEvent};
