//! Values passed across the engine boundary

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of value the user is currently collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Image,
    /// Anything the engine does not know how to extract
    #[default]
    #[serde(other)]
    Unknown,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Image => "image",
            FieldType::Unknown => "unknown",
        }
    }
}

impl FromStr for FieldType {
    type Err = std::convert::Infallible;

    /// Never fails: unrecognized names map to `Unknown`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "text" => FieldType::Text,
            "image" => FieldType::Image,
            _ => FieldType::Unknown,
        })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value extracted from a hovered or clicked element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedValue {
    pub kind: FieldType,
    pub value: String,
}

/// Emitted once per qualifying click
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEvent {
    pub selector: String,
    pub content: String,
}
