//! Hover highlight overlay
//!
//! At most one element carries the marker at any time. The marker is an
//! injected overlay element appended as the last child of the highlighted
//! node, so the positions of the node and its existing children are left
//! alone. Void elements such as `<img>` cannot hold children; they are
//! marked with an attribute and an inline outline instead, and get their
//! original attributes back when the highlight moves on.

use ego_tree::NodeId;
use scraper::Node;
use tracing::trace;

use crate::config::HighlightConfig;
use crate::dom::{escape_attr, Page};

/// Elements the serializer writes without children
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// How the highlighted element is marked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Overlay element appended inside the target
    Overlay(NodeId),
    /// Marker attribute set on the target itself
    Attribute,
}

/// The highlighted element and the marker attached to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub target: NodeId,
    pub marker: Marker,
}

impl Highlight {
    /// The overlay element, when the target holds one
    pub fn overlay(&self) -> Option<NodeId> {
        match self.marker {
            Marker::Overlay(id) => Some(id),
            Marker::Attribute => None,
        }
    }
}

/// Tracks the single highlighted element
#[derive(Debug, Clone)]
pub struct HoverHighlighter {
    markup: String,
    tag: String,
    attribute: String,
    void_style: String,
    current: Option<Highlight>,
    /// Original value of an attribute-marked target
    saved: Option<Node>,
}

impl HoverHighlighter {
    pub fn new(config: &HighlightConfig) -> Self {
        let markup = format!(
            r#"<{tag} class="{class}" style="{style}" aria-hidden="true"></{tag}>"#,
            tag = config.tag,
            class = escape_attr(&config.class),
            style = escape_attr(&config.style),
        );
        Self {
            markup,
            tag: config.tag.clone(),
            attribute: config.attribute.clone(),
            void_style: config.void_style.clone(),
            current: None,
            saved: None,
        }
    }

    /// Currently highlighted element, if any
    pub fn current(&self) -> Option<Highlight> {
        self.current
    }

    /// Whether `node` is one of our markers rather than page content
    pub fn is_marker(&self, page: &Page, node: NodeId) -> bool {
        page.tag_name(node) == Some(self.tag.as_str())
    }

    /// Highlight `node`, clearing any previous highlight first
    pub fn on_candidate(&mut self, page: &mut Page, node: NodeId) {
        if let Some(current) = self.current {
            if current.target == node && self.still_marked(page, &current) {
                return;
            }
        }

        self.clear(page);

        let is_void = page
            .tag_name(node)
            .is_some_and(|tag| VOID_ELEMENTS.contains(&tag));
        let marker = if is_void {
            self.mark_attribute(page, node)
        } else {
            self.mark_overlay(page, node)
        };

        if let Some(marker) = marker {
            trace!(?node, "highlighted");
            self.current = Some(Highlight {
                target: node,
                marker,
            });
        }
    }

    /// Remove the highlight, if any
    pub fn on_no_candidate(&mut self, page: &mut Page) {
        self.clear(page);
    }

    fn mark_overlay(&self, page: &mut Page, node: NodeId) -> Option<Marker> {
        let marker = match page.create_element(&self.markup) {
            Ok(marker) => marker,
            Err(err) => {
                trace!(error = %err, "could not create highlight marker");
                return None;
            }
        };
        if let Err(err) = page.append(node, marker) {
            trace!(error = %err, "could not attach highlight marker");
            page.detach(marker);
            return None;
        }
        Some(Marker::Overlay(marker))
    }

    fn mark_attribute(&mut self, page: &mut Page, node: NodeId) -> Option<Marker> {
        let style = match page.attr(node, "style").map(str::trim) {
            Some(existing) if !existing.is_empty() => format!(
                "{}; {}",
                existing.trim_end_matches(';'),
                self.void_style
            ),
            _ => self.void_style.clone(),
        };

        let overrides = [(self.attribute.as_str(), ""), ("style", style.as_str())];
        match page.set_attributes(node, &overrides) {
            Ok(previous) => {
                self.saved = Some(previous);
                Some(Marker::Attribute)
            }
            Err(err) => {
                trace!(error = %err, "could not mark highlighted element");
                None
            }
        }
    }

    fn still_marked(&self, page: &Page, highlight: &Highlight) -> bool {
        match highlight.marker {
            Marker::Overlay(marker) => page.contains(highlight.target, marker),
            Marker::Attribute => page.attr(highlight.target, &self.attribute).is_some(),
        }
    }

    /// Best-effort removal; a target the page already removed is fine
    fn clear(&mut self, page: &mut Page) {
        let Some(previous) = self.current.take() else {
            return;
        };
        let saved = self.saved.take();
        match previous.marker {
            Marker::Overlay(marker) => page.detach(marker),
            Marker::Attribute => {
                // Leave the element alone if the page replaced it meanwhile
                if let Some(saved) = saved {
                    if self.still_marked(page, &previous) {
                        page.restore_value(previous.target, saved);
                    }
                }
            }
        }
        trace!(node = ?previous.target, "highlight cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <div id="a">Alpha</div>
        <div id="b">Beta <span>inner</span></div>
    </body></html>"#;

    fn markers(page: &Page) -> Vec<NodeId> {
        page.query_selector_all("tent-highlight").unwrap()
    }

    fn first(page: &Page, selector: &str) -> NodeId {
        page.query_selector(selector).unwrap().unwrap()
    }

    #[test]
    fn test_single_marker_follows_hover() {
        let mut page = Page::parse(PAGE);
        let mut highlighter = HoverHighlighter::new(&HighlightConfig::default());
        let a = first(&page, "#a");
        let b = first(&page, "#b");

        for target in [a, b, a] {
            highlighter.on_candidate(&mut page, target);
            let found = markers(&page);
            assert_eq!(found.len(), 1);
            assert_eq!(page.parent_element(found[0]), Some(target));
            assert_eq!(highlighter.current().unwrap().target, target);
        }
    }

    #[test]
    fn test_same_target_is_noop() {
        let mut page = Page::parse(PAGE);
        let mut highlighter = HoverHighlighter::new(&HighlightConfig::default());
        let a = first(&page, "#a");

        highlighter.on_candidate(&mut page, a);
        let before = highlighter.current().unwrap();
        highlighter.on_candidate(&mut page, a);
        assert_eq!(highlighter.current().unwrap(), before);
        assert_eq!(markers(&page).len(), 1);
    }

    #[test]
    fn test_no_candidate_clears() {
        let mut page = Page::parse(PAGE);
        let mut highlighter = HoverHighlighter::new(&HighlightConfig::default());
        let b = first(&page, "#b");

        highlighter.on_candidate(&mut page, b);
        highlighter.on_no_candidate(&mut page);
        assert!(markers(&page).is_empty());
        assert!(highlighter.current().is_none());

        // Clearing twice is harmless
        highlighter.on_no_candidate(&mut page);
        assert!(highlighter.current().is_none());
    }

    #[test]
    fn test_removed_target_does_not_panic() {
        let mut page = Page::parse(PAGE);
        let mut highlighter = HoverHighlighter::new(&HighlightConfig::default());
        let a = first(&page, "#a");
        let b = first(&page, "#b");

        highlighter.on_candidate(&mut page, a);
        page.detach(a);
        highlighter.on_candidate(&mut page, b);
        assert_eq!(markers(&page).len(), 1);
        assert_eq!(highlighter.current().unwrap().target, b);

        page.detach(b);
        highlighter.on_no_candidate(&mut page);
        assert!(markers(&page).is_empty());
    }

    #[test]
    fn test_marker_leaves_existing_positions_alone() {
        let mut page = Page::parse(PAGE);
        let mut highlighter = HoverHighlighter::new(&HighlightConfig::default());
        let b = first(&page, "#b");
        let span = first(&page, "span");
        let before = page.element_path(span);

        highlighter.on_candidate(&mut page, b);
        assert_eq!(page.element_path(span), before);
        let overlay = highlighter.current().unwrap().overlay().unwrap();
        assert!(highlighter.is_marker(&page, overlay));
        assert!(!highlighter.is_marker(&page, span));
    }

    #[test]
    fn test_void_target_is_marked_in_serialized_page() {
        let mut page = Page::parse(
            r#"<html><body><p><img src="a.png"><b>x</b></p><p><img src="b.png" style="width: 10px;"></p></body></html>"#,
        );
        let mut highlighter = HoverHighlighter::new(&HighlightConfig::default());
        let images = page.query_selector_all("img").unwrap();
        let bold = first(&page, "b");
        let original = page.html();

        highlighter.on_candidate(&mut page, images[0]);
        let highlight = highlighter.current().unwrap();
        assert_eq!(highlight.target, images[0]);
        assert_eq!(highlight.marker, Marker::Attribute);
        assert!(page.html().contains("data-tent-highlight"));
        assert_eq!(page.attr(images[0], "src"), Some("a.png"));
        assert_eq!(page.element_path(bold), vec![1, 0, 1]);
        assert_eq!(page.query_selector_all("[data-tent-highlight]").unwrap(), vec![images[0]]);

        // Same target again keeps the marking as is
        highlighter.on_candidate(&mut page, images[0]);
        assert_eq!(page.query_selector_all("[data-tent-highlight]").unwrap().len(), 1);

        highlighter.on_candidate(&mut page, images[1]);
        assert_eq!(page.query_selector_all("[data-tent-highlight]").unwrap(), vec![images[1]]);
        assert_eq!(
            page.attr(images[1], "style"),
            Some("width: 10px; outline: 2px solid #4a90d9; outline-offset: -2px")
        );
        assert_eq!(page.attr(images[0], "style"), None);

        highlighter.on_no_candidate(&mut page);
        assert_eq!(page.html(), original);
    }

    #[test]
    fn test_switching_between_void_and_overlay_targets() {
        let mut page =
            Page::parse(r#"<html><body><div id="a">Alpha</div><img src="x.png"></body></html>"#);
        let mut highlighter = HoverHighlighter::new(&HighlightConfig::default());
        let img = first(&page, "img");
        let div = first(&page, "#a");
        let original = page.html();

        highlighter.on_candidate(&mut page, img);
        highlighter.on_candidate(&mut page, div);
        assert!(page.query_selector_all("[data-tent-highlight]").unwrap().is_empty());
        assert_eq!(markers(&page).len(), 1);

        highlighter.on_candidate(&mut page, img);
        assert!(markers(&page).is_empty());
        assert_eq!(page.query_selector_all("[data-tent-highlight]").unwrap(), vec![img]);

        highlighter.on_no_candidate(&mut page);
        assert_eq!(page.html(), original);
    }

    #[test]
    fn test_replaced_void_target_is_left_alone() {
        let mut page = Page::parse(r#"<html><body><img src="x.png"><img src="y.png"></body></html>"#);
        let mut highlighter = HoverHighlighter::new(&HighlightConfig::default());
        let images = page.query_selector_all("img").unwrap();

        highlighter.on_candidate(&mut page, images[0]);
        page.detach(images[0]);
        highlighter.on_candidate(&mut page, images[1]);
        assert_eq!(highlighter.current().unwrap().target, images[1]);
        assert_eq!(page.query_selector_all("[data-tent-highlight]").unwrap(), vec![images[1]]);
    }
}
