//! Error types for the selection engine
//!
//! "Not applicable" outcomes (nothing to extract, sandbox already in place)
//! are not errors and never show up here.

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while driving the engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be used
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// CSS selector failed to parse
    #[error("Invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },

    /// Node is no longer reachable from the document root
    #[error("Node is not attached to the document")]
    Detached,

    /// Operation requires an element node
    #[error("Node is not an element")]
    NotAnElement,

    /// Markup did not produce the expected element
    #[error("Cannot build element from `{0}`")]
    Template(String),

    /// Host element already carries an encapsulated partition
    #[error("Element already hosts a shadow root")]
    ShadowRootExists,

    /// Insertion would make a node its own ancestor
    #[error("Cannot insert a node into itself or one of its descendants")]
    Hierarchy,

    /// The external store went away before it finished hydrating
    #[error("Field store closed before hydration")]
    StoreClosed,

    /// Element path does not resolve to an element
    #[error("No element at path {0:?}")]
    InvalidPath(Vec<usize>),
}

impl EngineError {
    pub(crate) fn invalid_selector(selector: &str, err: impl std::fmt::Display) -> Self {
        EngineError::InvalidSelector {
            selector: selector.to_string(),
            message: err.to_string(),
        }
    }
}
