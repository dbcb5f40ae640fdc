//! Live page model
//!
//! The host document is a `scraper::Html` whose arena tree is mutated in
//! place. Nodes are addressed by `NodeId` handles: they are `Copy`, never
//! own the node, and simply stop resolving to an attached element once the
//! page removes it.

use std::collections::HashMap;

use ego_tree::{NodeId, NodeMut, NodeRef};
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::error::{EngineError, Result};

/// A live HTML page plus the encapsulated partitions attached to it
#[derive(Debug, Clone)]
pub struct Page {
    html: Html,
    base_url: Option<Url>,
    /// Encapsulated partitions keyed by host element
    shadow_roots: HashMap<NodeId, Html>,
}

impl Page {
    /// Parse a full HTML document
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
            base_url: None,
            shadow_roots: HashMap::new(),
        }
    }

    /// Resolve relative URLs against `base_url`
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Underlying parsed document
    pub fn document(&self) -> &Html {
        &self.html
    }

    /// The `<body>` element, if the document has one
    pub fn body(&self) -> Option<NodeId> {
        let html_el = self.document_element()?;
        self.element_children(html_el)
            .into_iter()
            .find(|id| self.tag_name(*id) == Some("body"))
    }

    /// The root element (`<html>`)
    pub fn document_element(&self) -> Option<NodeId> {
        self.html
            .tree
            .root()
            .children()
            .find(|child| child.value().is_element())
            .map(|child| child.id())
    }

    /// Element view of `id`, `None` for other node kinds
    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, Node>> {
        self.html.tree.get(id)
    }

    /// Local tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.value().name())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.value().attr(name))
    }

    /// All child nodes, text and comments included
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.html
            .tree
            .get(id)
            .map(|node| node.children().map(|child| child.id()).collect())
            .unwrap_or_default()
    }

    /// Element children only, in document order
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.html
            .tree
            .get(id)
            .map(|node| {
                node.children()
                    .filter(|child| child.value().is_element())
                    .map(|child| child.id())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parent element, `None` at the document element
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.html.tree.get(id)?.parent()?;
        parent.value().is_element().then(|| parent.id())
    }

    /// Whether the node is reachable from the document root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let root = self.html.tree.root().id();
        match self.html.tree.get(id) {
            Some(node) => node.id() == root || node.ancestors().any(|a| a.id() == root),
            None => false,
        }
    }

    /// Inclusive descendant test
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        match self.html.tree.get(id) {
            Some(node) => id == ancestor || node.ancestors().any(|a| a.id() == ancestor),
            None => false,
        }
    }

    /// Attached elements matching `selector`, in document order
    pub fn select(&self, selector: &Selector) -> Vec<NodeId> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| selector.matches(el))
            .map(|el| el.id())
            .collect()
    }

    /// First attached element matching a selector string
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    /// All attached elements matching a selector string
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let parsed =
            Selector::parse(selector).map_err(|e| EngineError::invalid_selector(selector, e))?;
        Ok(self.select(&parsed))
    }

    /// Create a detached element from a single-tag template such as
    /// `<div class="x"></div>`
    pub fn create_element(&mut self, markup: &str) -> Result<NodeId> {
        let template = element_template(markup)?;
        Ok(self.html.tree.orphan(template).id())
    }

    /// Rebuild element `id` with `overrides` applied to its attributes
    ///
    /// The node keeps its id and children. Returns the previous value so
    /// [`Page::restore_value`] can put it back.
    pub fn set_attributes(&mut self, id: NodeId, overrides: &[(&str, &str)]) -> Result<Node> {
        let previous = self
            .html
            .tree
            .get(id)
            .ok_or(EngineError::Detached)?
            .value()
            .clone();
        let Node::Element(original) = &previous else {
            return Err(EngineError::NotAnElement);
        };

        let mut attrs: Vec<(&str, &str)> = original
            .attrs()
            .filter(|(name, _)| !overrides.iter().any(|(o, _)| o == name))
            .collect();
        attrs.extend_from_slice(overrides);

        let markup = attrs.iter().fold(
            format!("<{}", original.name()),
            |mut markup, (name, value)| {
                markup.push_str(&format!(r#" {name}="{}""#, escape_attr(value)));
                markup
            },
        ) + ">";

        let rebuilt = element_template(&markup)?;
        match &rebuilt {
            Node::Element(el) if el.name == original.name && el.attrs().count() == attrs.len() => {}
            _ => return Err(EngineError::Template(markup)),
        }

        if let Some(mut node) = self.html.tree.get_mut(id) {
            *node.value() = rebuilt;
        }
        Ok(previous)
    }

    /// Put back a value returned by [`Page::set_attributes`]
    pub fn restore_value(&mut self, id: NodeId, value: Node) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            *node.value() = value;
        }
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if parent == child || self.contains(child, parent) {
            return Err(EngineError::Hierarchy);
        }
        if let Some(mut node) = self.html.tree.get_mut(child) {
            node.detach();
        }
        let mut parent_node = self.html.tree.get_mut(parent).ok_or(EngineError::Detached)?;
        parent_node.append_id(child);
        Ok(())
    }

    /// Remove a node from its parent; unknown ids are ignored
    pub fn detach(&mut self, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Move every child of `from` to the end of `to`, preserving order
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        for child in self.children(from) {
            self.append(to, child)?;
        }
        Ok(())
    }

    /// Attach an encapsulated partition to `host`
    ///
    /// Nodes inside the partition live in their own tree: page selectors
    /// never match them and page nodes never inherit from them.
    pub fn attach_shadow(&mut self, host: NodeId) -> Result<&mut Html> {
        if self.element(host).is_none() {
            return Err(EngineError::NotAnElement);
        }
        if self.shadow_roots.contains_key(&host) {
            return Err(EngineError::ShadowRootExists);
        }
        Ok(self.shadow_roots.entry(host).or_insert_with(Html::new_fragment))
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<&Html> {
        self.shadow_roots.get(&host)
    }

    pub fn shadow_root_mut(&mut self, host: NodeId) -> Option<&mut Html> {
        self.shadow_roots.get_mut(&host)
    }

    /// Deep-copy a page element into the partition hosted by `host`
    pub fn clone_into_shadow(&mut self, source: NodeId, host: NodeId) -> Result<NodeId> {
        let shadow = self
            .shadow_roots
            .get_mut(&host)
            .ok_or(EngineError::NotAnElement)?;
        let node = self.html.tree.get(source).ok_or(EngineError::Detached)?;
        let mut root = shadow.tree.root_mut();
        Ok(clone_subtree(node, &mut root))
    }

    /// Create an element from a template and append it to the partition
    /// hosted by `host`
    pub fn append_to_shadow(&mut self, host: NodeId, markup: &str) -> Result<NodeId> {
        let template = element_template(markup)?;
        let shadow = self
            .shadow_roots
            .get_mut(&host)
            .ok_or(EngineError::NotAnElement)?;
        Ok(shadow.tree.root_mut().append(template).id())
    }

    /// Element-child indices leading from the document element to `id`
    pub fn element_path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent_element(current) {
            match self.element_children(parent).iter().position(|c| *c == current) {
                Some(index) => path.push(index),
                None => break,
            }
            current = parent;
        }
        path.reverse();
        path
    }

    /// Inverse of [`Page::element_path`]
    pub fn resolve_path(&self, path: &[usize]) -> Result<NodeId> {
        let mut current = self
            .document_element()
            .ok_or_else(|| EngineError::InvalidPath(path.to_vec()))?;
        for index in path {
            current = *self
                .element_children(current)
                .get(*index)
                .ok_or_else(|| EngineError::InvalidPath(path.to_vec()))?;
        }
        Ok(current)
    }

    /// Serialize the page
    pub fn html(&self) -> String {
        self.html.html()
    }
}

/// Recursively copy `source` under `parent`, returning the new node id
fn clone_subtree(source: NodeRef<'_, Node>, parent: &mut NodeMut<'_, Node>) -> NodeId {
    let mut copy = parent.append(source.value().clone());
    for child in source.children() {
        clone_subtree(child, &mut copy);
    }
    copy.id()
}

fn element_template(markup: &str) -> Result<Node> {
    let fragment = Html::parse_fragment(markup);
    fragment
        .root_element()
        .children()
        .find(|child| child.value().is_element())
        .map(|child| child.value().clone())
        .ok_or_else(|| EngineError::Template(markup.to_string()))
}

/// Escape a value for use inside a double-quoted attribute
pub(crate) fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
