//! Pointer interaction state machine
//!
//! Two named transitions drive everything: pointer-over decides whether the
//! target gets highlighted, click turns a qualifying target into a
//! [`SelectionEvent`]. The field type is read from the source on every
//! event, so a change in the external store applies to the very next event.

use ego_tree::NodeId;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::dom::Page;
use crate::extractors::extract_content;
use crate::highlight::HoverHighlighter;
use crate::selector::SelectorGenerator;
use crate::store::{FieldTypeSource, SelectionSink};
use crate::types::SelectionEvent;

/// Pointer events delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Over(NodeId),
    Click(NodeId),
}

/// Wires extraction, highlighting and selector generation to pointer events
pub struct SelectionController<S, K> {
    content_root: NodeId,
    generator: SelectorGenerator,
    highlighter: HoverHighlighter,
    source: S,
    sink: K,
}

impl<S, K> SelectionController<S, K>
where
    S: FieldTypeSource,
    K: SelectionSink,
{
    /// Listen for events whose target lies inside `content_root`
    pub fn new(config: &EngineConfig, content_root: NodeId, source: S, sink: K) -> Self {
        Self {
            content_root,
            generator: SelectorGenerator::new(config.selector.clone()),
            highlighter: HoverHighlighter::new(&config.highlight),
            source,
            sink,
        }
    }

    pub fn content_root(&self) -> NodeId {
        self.content_root
    }

    pub fn highlighter(&self) -> &HoverHighlighter {
        &self.highlighter
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Route a host event to its transition
    pub fn handle(&mut self, page: &mut Page, event: PointerEvent) -> Option<SelectionEvent> {
        match event {
            PointerEvent::Over(target) => {
                self.on_pointer_over(page, target);
                None
            }
            PointerEvent::Click(target) => self.on_click(page, target),
        }
    }

    /// Highlight `target` if it yields a value, otherwise clear the highlight
    pub fn on_pointer_over(&mut self, page: &mut Page, target: NodeId) {
        if !self.observes(page, target) {
            return;
        }

        let field_type = self.source.current_field_type();
        if extract_content(page, target, field_type).is_some() {
            self.highlighter.on_candidate(page, target);
        } else {
            self.highlighter.on_no_candidate(page);
        }
    }

    /// Emit a selection for `target` if it yields a value
    ///
    /// Returns the emitted event; clicks on targets without a value are
    /// ignored.
    pub fn on_click(&mut self, page: &mut Page, target: NodeId) -> Option<SelectionEvent> {
        if !self.observes(page, target) {
            return None;
        }

        let field_type = self.source.current_field_type();
        let value = extract_content(page, target, field_type)?;

        let selector = match self.generator.generate(page, target) {
            Ok(selector) => selector,
            Err(err) => {
                warn!(error = %err, "no selector for clicked element");
                return None;
            }
        };

        let event = SelectionEvent {
            selector,
            content: value.value,
        };
        debug!(selector = %event.selector, field_type = %field_type, "element selected");
        self.sink.select_element(event.clone());
        Some(event)
    }

    /// Delegation scope: inside the content root and not one of our markers
    fn observes(&self, page: &Page, target: NodeId) -> bool {
        page.contains(self.content_root, target) && !self.highlighter.is_marker(page, target)
    }
}
