//! Engine configuration

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{EngineError, Result};

/// Candidate selector forms, tried in the configured order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorStrategy {
    /// `#id`
    Id,
    /// `.class-a.class-b`
    Class,
    /// Bare tag name
    Tag,
    /// `tag:nth-child(n)` path
    #[serde(alias = "nth-child")]
    NthChild,
}

/// Selector generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub strategies: Vec<SelectorStrategy>,

    /// Class names starting with any of these never appear in a selector
    pub excluded_class_prefixes: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            strategies: vec![
                SelectorStrategy::Id,
                SelectorStrategy::Tag,
                SelectorStrategy::NthChild,
            ],
            excluded_class_prefixes: vec!["tether-".to_string(), "tent-".to_string()],
        }
    }
}

/// Highlight marker template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Tag of the injected overlay element; must not collide with page tags
    pub tag: String,
    pub class: String,
    pub style: String,
    /// Attribute set on void targets such as `<img>`, which cannot hold
    /// the overlay element
    pub attribute: String,
    /// Inline style appended to void targets while highlighted
    pub void_style: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            tag: "tent-highlight".to_string(),
            class: "tent-highlight".to_string(),
            style: "position: absolute; inset: 0; pointer-events: none; \
                    outline: 2px solid #4a90d9; background: rgba(74, 144, 217, 0.15)"
                .to_string(),
            attribute: "data-tent-highlight".to_string(),
            void_style: "outline: 2px solid #4a90d9; outline-offset: -2px".to_string(),
        }
    }
}

/// Configuration for the selection engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Marker class of the wrapper holding the original page content
    pub main_class: String,

    /// Marker class of the interface container hosting the isolated UI
    pub sidebar_class: String,

    /// Elements copied into the isolated partition
    pub bundled_styles_selector: String,

    /// Inline style of the UI mount element
    pub mount_style: String,

    pub highlight: HighlightConfig,

    pub selector: SelectorConfig,

    /// Base URL used to resolve relative image sources
    pub base_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            main_class: "tent-main".to_string(),
            sidebar_class: "tent-sidebar".to_string(),
            bundled_styles_selector: ".bundled-styles".to_string(),
            mount_style: "all: initial".to_string(),
            highlight: HighlightConfig::default(),
            selector: SelectorConfig::default(),
            base_url: None,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON configuration; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values that would otherwise fail deep inside the engine
    pub fn validate(&self) -> Result<()> {
        for (name, class) in [
            ("main_class", &self.main_class),
            ("sidebar_class", &self.sidebar_class),
            ("highlight.class", &self.highlight.class),
            ("highlight.attribute", &self.highlight.attribute),
        ] {
            if !is_plain_name(class) {
                return Err(EngineError::Config(format!(
                    "{name} must be a non-empty plain name, got {class:?}"
                )));
            }
        }
        if !is_plain_name(&self.highlight.tag) {
            return Err(EngineError::Config(format!(
                "highlight.tag must be a non-empty tag name, got {:?}",
                self.highlight.tag
            )));
        }
        if self.selector.strategies.is_empty() {
            return Err(EngineError::Config(
                "selector.strategies must not be empty".to_string(),
            ));
        }
        self.parsed_base_url()?;
        Ok(())
    }

    /// The base URL, parsed
    pub fn parsed_base_url(&self) -> Result<Option<Url>> {
        match self.base_url.as_deref() {
            Some(raw) => Ok(Some(Url::parse(raw)?)),
            None => Ok(None),
        }
    }

    /// Set the wrapper marker class
    pub fn with_main_class(mut self, class: impl Into<String>) -> Self {
        self.main_class = class.into();
        self
    }

    /// Set the interface container marker class
    pub fn with_sidebar_class(mut self, class: impl Into<String>) -> Self {
        self.sidebar_class = class.into();
        self
    }

    /// Set the selector matching bundled style elements
    pub fn with_bundled_styles_selector(mut self, selector: impl Into<String>) -> Self {
        self.bundled_styles_selector = selector.into();
        self
    }

    /// Set the selector strategies, in priority order
    pub fn with_strategies(mut self, strategies: Vec<SelectorStrategy>) -> Self {
        self.selector.strategies = strategies;
        self
    }

    /// Set the base URL for image sources
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

fn is_plain_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
