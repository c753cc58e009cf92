//! Element tree
//!
//! An arena of elements standing in for the browser document. Builders
//! write into it, the dock allocator reparents nodes inside it, and the
//! whole thing serializes to HTML.
//!
//! # Design Contract
//!
//! - A node has at most one parent. `append_child` and `insert_before`
//!   detach the node from its previous parent first.
//! - Removed slots are recycled. Each slot carries a generation, so a
//!   stale `NodeId` reports `is_alive() == false` after its slot is
//!   reused and mutations through it are ignored.
//! - Text and raw HTML content replace children, the same way
//!   `textContent` / `innerHTML` assignment does.

use std::fmt::Write as _;

/// Handle to an element in a [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    fn index(self) -> usize {
        self.index as usize
    }
}

/// Leaf content of an element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Content {
    #[default]
    None,
    /// Plain text, escaped on serialization
    Text(String),
    /// Pre-rendered HTML, emitted verbatim
    Html(String),
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    content: Content,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    alive: bool,
    generation: u32,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            classes: Vec::new(),
            attrs: Vec::new(),
            content: Content::None,
            children: Vec::new(),
            parent: None,
            alive: true,
            generation: 0,
        }
    }
}

/// Elements serialized without a closing tag
const VOID_ELEMENTS: &[&str] = &["base", "br", "hr", "img", "input", "link", "meta"];

/// Element arena rooted at a `body` element
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Element>,
    free_list: Vec<u32>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree containing only the `body` root
    pub fn new() -> Self {
        Self {
            nodes: vec![Element::new("body")],
            free_list: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        }
    }

    /// The `body` element
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> &Element {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.index()]
    }

    /// Mutable access that ignores stale handles
    fn live_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.nodes
            .get_mut(id.index())
            .filter(|n| n.alive && n.generation == id.generation)
    }

    /// Create a detached element, reusing a freed slot when one exists
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.nodes[index as usize];
            let generation = slot.generation.wrapping_add(1);
            *slot = Element::new(tag);
            slot.generation = generation;
            return NodeId { index, generation };
        }
        let index = self.nodes.len() as u32;
        self.nodes.push(Element::new(tag));
        NodeId { index, generation: 0 }
    }

    /// Number of arena slots, live or free
    pub fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live elements, the root included
    pub fn live_count(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Create a detached element with the given classes
    pub fn create_with_classes(&mut self, tag: &str, classes: &[&str]) -> NodeId {
        let id = self.create_element(tag);
        for class in classes {
            self.add_class(id, class);
        }
        id
    }

    /// Create an element with classes and append it to `parent`
    pub fn append_new(&mut self, parent: NodeId, tag: &str, classes: &[&str]) -> NodeId {
        let id = self.create_with_classes(tag, classes);
        self.append_child(parent, id);
        id
    }

    /// Whether the node has not been removed
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.index())
            .is_some_and(|n| n.alive && n.generation == id.generation)
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.node(id).tag
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Position of `id` among its parent's children
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Detach `child` from its current parent (if any)
    pub fn detach(&mut self, child: NodeId) {
        if !self.is_alive(child) {
            return;
        }
        if let Some(parent) = self.node_mut(child).parent.take() {
            self.node_mut(parent).children.retain(|&c| c != child);
        }
    }

    /// Move `child` to the end of `parent`'s children
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.is_alive(parent) || !self.is_alive(child) {
            tracing::warn!(?parent, ?child, "ignoring append of a removed node");
            return;
        }
        if parent == child || self.contains(child, parent) {
            tracing::warn!(?parent, ?child, "refusing to append a node into its own subtree");
            return;
        }
        self.detach(child);
        let parent_node = self.node_mut(parent);
        parent_node.content = Content::None;
        parent_node.children.push(child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Move `child` into `parent` directly before `reference`.
    ///
    /// Appends when `reference` is `None` or is not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if reference == Some(child) {
            return;
        }
        if !self.is_alive(parent) || !self.is_alive(child) {
            tracing::warn!(?parent, ?child, "ignoring insert of a removed node");
            return;
        }
        if parent == child || self.contains(child, parent) {
            tracing::warn!(?parent, ?child, "refusing to insert a node into its own subtree");
            return;
        }
        self.detach(child);
        let position = reference.and_then(|r| self.children(parent).iter().position(|&c| c == r));
        let parent_node = self.node_mut(parent);
        parent_node.content = Content::None;
        match position {
            Some(index) => parent_node.children.insert(index, child),
            None => parent_node.children.push(child),
        }
        self.node_mut(child).parent = Some(parent);
    }

    /// Detach a node, mark its whole subtree dead and free its slots
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root || !self.is_alive(id) {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let node = self.node_mut(next);
            node.alive = false;
            node.parent = None;
            stack.append(&mut node.children);
            node.content = Content::None;
            self.free_list.push(next.index);
        }
    }

    /// Remove all children of a node
    pub fn clear_children(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.node_mut(child).parent = None;
            self.remove(child);
        }
        self.node_mut(id).content = Content::None;
    }

    /// Whether `node` is `ancestor` or lies inside it
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    // ========== classes & attributes ==========

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        let Some(node) = self.live_mut(id) else {
            return;
        };
        if !node.classes.iter().any(|c| c == class) {
            node.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(node) = self.live_mut(id) {
            node.classes.retain(|c| c != class);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.node(id).classes.iter().any(|c| c == class)
    }

    /// Toggle a class, returning whether it is now present
    pub fn toggle_class(&mut self, id: NodeId, class: &str) -> bool {
        if self.has_class(id, class) {
            self.remove_class(id, class);
            false
        } else {
            self.add_class(id, class);
            true
        }
    }

    pub fn classes(&self, id: NodeId) -> &[String] {
        &self.node(id).classes
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let Some(node) = self.live_mut(id) else {
            return;
        };
        let attrs = &mut node.attrs;
        match attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => attrs.push((name.to_string(), value)),
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(node) = self.live_mut(id) {
            node.attrs.retain(|(n, _)| n != name);
        }
    }

    // ========== content ==========

    /// Replace children with a text node
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.clear_children(id);
        if let Some(node) = self.live_mut(id) {
            node.content = Content::Text(text.into());
        }
    }

    /// Replace children with pre-rendered HTML
    pub fn set_inner_html(&mut self, id: NodeId, html: impl Into<String>) {
        self.clear_children(id);
        if let Some(node) = self.live_mut(id) {
            node.content = Content::Html(html.into());
        }
    }

    /// Raw HTML content of a node, if it holds any
    pub fn inner_html(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).content {
            Content::Html(html) => Some(html),
            _ => None,
        }
    }

    /// Concatenated text of the node and its descendants
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        match &node.content {
            Content::Text(text) => out.push_str(text),
            Content::Html(html) => out.push_str(html),
            Content::None => {}
        }
        for &child in &node.children {
            self.collect_text(child, out);
        }
    }

    // ========== queries ==========

    /// Pre-order descendants of `scope`, excluding `scope` itself
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn find_by_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(scope).into_iter().find(|&id| self.has_class(id, class))
    }

    pub fn find_all_by_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| self.has_class(id, class))
            .collect()
    }

    /// First descendant carrying every class in `classes`
    pub fn find_by_classes(&self, scope: NodeId, classes: &[&str]) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&id| classes.iter().all(|c| self.has_class(id, c)))
    }

    pub fn find_by_attr(&self, scope: NodeId, name: &str, value: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&id| self.attr(id, name) == Some(value))
    }

    /// Element with the given `id` attribute anywhere in the document
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_by_attr(self.root, "id", id)
    }

    pub fn find_all_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| self.tag(id) == tag)
            .collect()
    }

    /// Nearest node (starting at `id` itself) carrying `class`
    pub fn closest_with_class(&self, id: NodeId, class: &str) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.has_class(node, class) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    // ========== serialization ==========

    /// Serialize a node and its subtree to HTML
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    /// Serialize only the children of a node
    pub fn inner_to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_content(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        let _ = write!(out, "<{}", node.tag);
        if !node.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape(&node.classes.join(" ")));
        }
        for (name, value) in &node.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape(value));
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&node.tag.as_str()) {
            return;
        }
        self.write_content(id, out);
        let _ = write!(out, "</{}>", node.tag);
    }

    fn write_content(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        match &node.content {
            Content::Text(text) => out.push_str(&escape(text)),
            Content::Html(html) => out.push_str(html),
            Content::None => {}
        }
        for &child in &node.children {
            self.write_html(child, out);
        }
    }
}

/// HTML-escape text or attribute values
///
/// Only `& < > " '` are replaced; URLs stay readable in the output.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
