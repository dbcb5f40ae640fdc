//! Minimal unique CSS selector generation
//!
//! Candidate forms are tried in the configured order and the first one that
//! matches exactly the target element wins:
//! - `#id` for a document-unique id
//! - `.a.b` for a unique class combination (off by default)
//! - the bare tag name when the tag is unique
//! - a `tag:nth-child(n)` path grown one ancestor at a time until unique
//!
//! When nothing is unique the root-anchored `>` path is returned, which
//! always is. Selectors are point-in-time identifiers: later DOM changes can
//! make them ambiguous or stale.

use ego_tree::NodeId;
use scraper::Selector;
use tracing::trace;

use crate::config::{SelectorConfig, SelectorStrategy};
use crate::dom::Page;
use crate::error::{EngineError, Result};

/// Builds selectors that resolve to exactly one element
#[derive(Debug, Clone, Default)]
pub struct SelectorGenerator {
    config: SelectorConfig,
}

impl SelectorGenerator {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    /// Compute a selector matching only `node` in the current page
    pub fn generate(&self, page: &Page, node: NodeId) -> Result<String> {
        if page.element(node).is_none() {
            return Err(EngineError::NotAnElement);
        }
        if !page.is_attached(node) {
            return Err(EngineError::Detached);
        }

        let candidate = self.config.strategies.iter().find_map(|strategy| {
            let selector = match strategy {
                SelectorStrategy::Id => self.id_selector(page, node),
                SelectorStrategy::Class => self.class_selector(page, node),
                SelectorStrategy::Tag => self.tag_selector(page, node),
                SelectorStrategy::NthChild => self.nth_child_selector(page, node),
            };
            if let Some(ref s) = selector {
                trace!(strategy = ?strategy, selector = %s, "selector candidate found");
            }
            selector
        });

        let selector = match candidate {
            Some(selector) => selector,
            None => anchored_path(page, node),
        };

        debug_assert!(
            resolves_uniquely(page, &selector, node),
            "generated selector `{selector}` does not resolve to its element"
        );
        Ok(selector)
    }

    fn id_selector(&self, page: &Page, node: NodeId) -> Option<String> {
        let id = page.element(node)?.value().id()?;
        if id.is_empty() {
            return None;
        }
        let selector = format!("#{}", escape_ident(id));
        resolves_uniquely(page, &selector, node).then_some(selector)
    }

    fn class_selector(&self, page: &Page, node: NodeId) -> Option<String> {
        let element = page.element(node)?;
        let classes: Vec<&str> = element
            .value()
            .classes()
            .filter(|class| {
                !self
                    .config
                    .excluded_class_prefixes
                    .iter()
                    .any(|prefix| class.starts_with(prefix.as_str()))
            })
            .collect();
        if classes.is_empty() {
            return None;
        }

        let selector: String = classes
            .iter()
            .map(|class| format!(".{}", escape_ident(class)))
            .collect();
        resolves_uniquely(page, &selector, node).then_some(selector)
    }

    fn tag_selector(&self, page: &Page, node: NodeId) -> Option<String> {
        let tag = escape_ident(page.tag_name(node)?);
        resolves_uniquely(page, &tag, node).then_some(tag)
    }

    /// Shortest unique suffix of the descendant-combinator path
    fn nth_child_selector(&self, page: &Page, node: NodeId) -> Option<String> {
        let mut components: Vec<String> = Vec::new();
        let mut current = Some(node);

        while let Some(id) = current {
            components.push(path_component(page, id)?);
            let selector = components
                .iter()
                .rev()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            if resolves_uniquely(page, &selector, node) {
                return Some(selector);
            }
            current = page.parent_element(id);
        }

        None
    }
}

/// Whether `selector` matches exactly one attached element, and it is `node`
pub fn resolves_uniquely(page: &Page, selector: &str, node: NodeId) -> bool {
    match Selector::parse(selector) {
        Ok(parsed) => page.select(&parsed) == [node],
        Err(_) => false,
    }
}

/// `tag:nth-child(n)`, or the bare tag for the document element
fn path_component(page: &Page, id: NodeId) -> Option<String> {
    let tag = escape_ident(page.tag_name(id)?);
    match page.parent_element(id) {
        Some(parent) => {
            let position = page
                .element_children(parent)
                .iter()
                .position(|child| *child == id)?;
            Some(format!("{tag}:nth-child({})", position + 1))
        }
        None => Some(tag),
    }
}

/// Full path from the document element using child combinators
fn anchored_path(page: &Page, node: NodeId) -> String {
    let mut components = Vec::new();
    let mut current = Some(node);
    while let Some(id) = current {
        if let Some(component) = path_component(page, id) {
            components.push(component);
        }
        current = page.parent_element(id);
    }
    components.reverse();
    components.join(" > ")
}

/// Escape a string for use as a CSS identifier (`CSS.escape` rules)
pub fn escape_ident(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let chars: Vec<char> = value.chars().collect();

    if chars == ['-'] {
        return "\\-".to_string();
    }

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1f}' | '\u{7f}' => out.push_str(&format!("\\{:x} ", c as u32)),
            '0'..='9' if i == 0 || (i == 1 && chars[0] == '-') => {
                out.push_str(&format!("\\{:x} ", c as u32))
            }
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }

    out
}
