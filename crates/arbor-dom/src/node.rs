//! The in-memory rendering surface.
//!
//! A [`Node`] is a cheap-clone handle (`Rc<RefCell<..>>`) onto one surface
//! node. Parents hold strong references to children; the reverse link is a
//! `Weak`, so dropping a subtree from its parent's child list frees it.
//!
//! Beside the visible state (tag, attributes, text) every node carries the
//! reconciler's bookkeeping: its stable key, a keyed index over its children
//! (weak handles, evicted explicitly when a child detaches), listener
//! configurations, and the per-event throttle/debounce state consulted at
//! dispatch time.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use serde_json::Value;
use web_time::Instant;

/// Marker attribute adopted as the node key when virtualising existing
/// markup.
pub const KEY_ATTRIBUTE: &str = "data-arbor-key";

/// Behavioral listener settings mirrored from the event attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListenerConfig {
    pub include: Vec<String>,
    pub prevent_default: bool,
    pub stop_propagation: bool,
    pub immediate: bool,
    pub debounce: u64,
    pub throttle: u64,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element { namespace: String, tag: String },
    Text { content: String },
}

#[derive(Debug)]
pub struct NodeData {
    kind: NodeKind,
    parent: Weak<RefCell<NodeData>>,
    children: Vec<Node>,
    attributes: BTreeMap<String, String>,
    properties: BTreeMap<String, Value>,
    /// Opaque markup for raw nodes; rendered verbatim, never diffed.
    inner_html: String,
    listeners: AHashMap<String, ListenerConfig>,
    key: String,
    /// Keyed index over `children`. Weak handles; entries are evicted when
    /// the child detaches, so a dead entry is a bug rather than a feature.
    keyed: AHashMap<String, Weak<RefCell<NodeData>>>,
    throttle_last: AHashMap<String, Instant>,
    debounce_seq: AHashMap<String, u64>,
}

/// A shared-mutable handle onto one surface node.
#[derive(Debug, Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self(Rc::new(RefCell::new(NodeData {
            kind,
            parent: Weak::new(),
            children: Vec::new(),
            attributes: BTreeMap::new(),
            properties: BTreeMap::new(),
            inner_html: String::new(),
            listeners: AHashMap::new(),
            key: String::new(),
            keyed: AHashMap::new(),
            throttle_last: AHashMap::new(),
            debounce_seq: AHashMap::new(),
        })))
    }

    /// Create an element node.
    #[must_use]
    pub fn element(namespace: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(NodeKind::Element {
            namespace: namespace.into(),
            tag: tag.into(),
        })
    }

    /// Create a text node.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeKind::Text {
            content: content.into(),
        })
    }

    fn downgrade(&self) -> Weak<RefCell<NodeData>> {
        Rc::downgrade(&self.0)
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self.0.borrow().kind, NodeKind::Text { .. })
    }

    /// The element's tag, or `None` for text nodes.
    #[must_use]
    pub fn tag(&self) -> Option<String> {
        match &self.0.borrow().kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text { .. } => None,
        }
    }

    #[must_use]
    pub fn namespace(&self) -> Option<String> {
        match &self.0.borrow().kind {
            NodeKind::Element { namespace, .. } => Some(namespace.clone()),
            NodeKind::Text { .. } => None,
        }
    }

    /// Text content, or `None` for elements.
    #[must_use]
    pub fn text_content(&self) -> Option<String> {
        match &self.0.borrow().kind {
            NodeKind::Text { content } => Some(content.clone()),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn set_text(&self, content: impl Into<String>) {
        if let NodeKind::Text {
            content: existing, ..
        } = &mut self.0.borrow_mut().kind
        {
            *existing = content.into();
        }
    }

    pub fn set_inner_html(&self, html: impl Into<String>) {
        let mut data = self.0.borrow_mut();
        data.children.clear();
        data.keyed.clear();
        data.inner_html = html.into();
    }

    #[must_use]
    pub fn inner_html(&self) -> String {
        self.0.borrow().inner_html.clone()
    }

    #[must_use]
    pub fn parent(&self) -> Option<Node> {
        self.0.borrow().parent.upgrade().map(Node)
    }

    #[must_use]
    pub fn children_len(&self) -> usize {
        self.0.borrow().children.len()
    }

    #[must_use]
    pub fn child_at(&self, index: usize) -> Option<Node> {
        self.0.borrow().children.get(index).cloned()
    }

    /// All children, as fresh handles.
    #[must_use]
    pub fn children(&self) -> Vec<Node> {
        self.0.borrow().children.clone()
    }

    /// This node's position among its parent's children.
    #[must_use]
    pub fn index_in_parent(&self) -> Option<usize> {
        let parent = self.parent()?;
        let index = parent
            .0
            .borrow()
            .children
            .iter()
            .position(|child| Rc::ptr_eq(&child.0, &self.0));
        index
    }

    /// Append `child`, detaching it from any previous parent first.
    pub fn append_child(&self, child: &Node) {
        let len = self.children_len();
        self.insert_at(len, child);
    }

    /// Insert `child` at `index`, detaching it from any previous parent.
    pub fn insert_at(&self, index: usize, child: &Node) {
        child.detach();
        {
            let mut data = self.0.borrow_mut();
            let index = index.min(data.children.len());
            data.children.insert(index, child.clone());
            let key = child.key();
            if !key.is_empty() {
                data.keyed.insert(key, child.downgrade());
            }
        }
        child.0.borrow_mut().parent = self.downgrade();
    }

    /// Remove this node from its parent, evicting its keyed-index entry.
    pub fn detach(&self) {
        let Some(parent) = self.parent() else {
            return;
        };
        {
            let mut data = parent.0.borrow_mut();
            data.children.retain(|child| !Rc::ptr_eq(&child.0, &self.0));
            let key = self.key();
            if !key.is_empty() {
                data.keyed.remove(&key);
            }
        }
        self.0.borrow_mut().parent = Weak::new();
    }

    /// Remove and return the child at `index`.
    pub fn remove_at(&self, index: usize) -> Option<Node> {
        let child = self.child_at(index)?;
        child.detach();
        Some(child)
    }

    /// Drop the last `count` children.
    pub fn remove_trailing(&self, count: usize) {
        for _ in 0..count {
            let len = self.children_len();
            if len == 0 {
                break;
            }
            if let Some(child) = self.child_at(len - 1) {
                child.detach();
            }
        }
    }

    #[must_use]
    pub fn key(&self) -> String {
        self.0.borrow().key.clone()
    }

    pub fn set_key(&self, key: impl Into<String>) {
        self.0.borrow_mut().key = key.into();
    }

    /// Look up a keyed child, falling back to a linear scan if the index
    /// entry has gone stale.
    #[must_use]
    pub fn keyed_child(&self, key: &str) -> Option<Node> {
        if let Some(found) = self.0.borrow().keyed.get(key).and_then(Weak::upgrade) {
            return Some(Node(found));
        }
        self.0
            .borrow()
            .children
            .iter()
            .find(|child| child.key() == key)
            .cloned()
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.0
            .borrow_mut()
            .attributes
            .insert(name.into(), value.into());
    }

    pub fn remove_attribute(&self, name: &str) {
        self.0.borrow_mut().attributes.remove(name);
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0.borrow().attributes.get(name).cloned()
    }

    /// Attribute names and values, sorted by name.
    #[must_use]
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.0
            .borrow()
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub fn set_property(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().properties.insert(name.into(), value);
    }

    pub fn remove_property(&self, name: &str) {
        self.0.borrow_mut().properties.remove(name);
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<Value> {
        self.0.borrow().properties.get(name).cloned()
    }

    pub fn set_listener(&self, name: impl Into<String>, config: ListenerConfig) {
        self.0.borrow_mut().listeners.insert(name.into(), config);
    }

    pub fn remove_listener(&self, name: &str) {
        self.0.borrow_mut().listeners.remove(name);
    }

    #[must_use]
    pub fn listener(&self, name: &str) -> Option<ListenerConfig> {
        self.0.borrow().listeners.get(name).cloned()
    }

    /// Last accepted firing time for a throttled event.
    #[must_use]
    pub fn throttle_last(&self, name: &str) -> Option<Instant> {
        self.0.borrow().throttle_last.get(name).copied()
    }

    pub fn record_throttle(&self, name: &str, at: Instant) {
        self.0
            .borrow_mut()
            .throttle_last
            .insert(name.to_owned(), at);
    }

    /// Advance and return the debounce sequence for `name`. A pending
    /// delivery token is valid only while it carries the current sequence.
    pub fn bump_debounce(&self, name: &str) -> u64 {
        let mut data = self.0.borrow_mut();
        let seq = data.debounce_seq.entry(name.to_owned()).or_insert(0);
        *seq += 1;
        *seq
    }

    #[must_use]
    pub fn debounce_seq(&self, name: &str) -> u64 {
        self.0
            .borrow()
            .debounce_seq
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// A weak handle for delayed-delivery tokens.
    #[must_use]
    pub fn weak(&self) -> WeakNode {
        WeakNode(self.downgrade())
    }

    /// Render the subtree as markup. Test and debug aid, not a full HTML
    /// serializer.
    #[must_use]
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        let data = self.0.borrow();
        match &data.kind {
            NodeKind::Text { content } => out.push_str(content),
            NodeKind::Element { tag, .. } => {
                let _ = write!(out, "<{tag}");
                for (name, value) in &data.attributes {
                    let _ = write!(out, " {name}=\"{value}\"");
                }
                out.push('>');
                if data.inner_html.is_empty() {
                    for child in &data.children {
                        child.write_markup(out);
                    }
                } else {
                    out.push_str(&data.inner_html);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

/// A weak node handle; dies with the node.
#[derive(Debug, Clone)]
pub struct WeakNode(Weak<RefCell<NodeData>>);

impl WeakNode {
    #[must_use]
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }
}

/// An in-memory document: a root element plus lookup helpers.
#[derive(Debug, Clone)]
pub struct Document {
    root: Node,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A fresh document with an empty `body` root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::element("", "body"),
        }
    }

    #[must_use]
    pub fn body(&self) -> Node {
        self.root.clone()
    }

    /// Minimal selector support: `#id` by id attribute, otherwise a tag
    /// name, depth-first.
    #[must_use]
    pub fn query_selector(&self, selector: &str) -> Option<Node> {
        fn search(node: &Node, selector: &str) -> Option<Node> {
            let matched = match selector.strip_prefix('#') {
                Some(id) => node.attribute("id").is_some_and(|have| have == id),
                None => node.tag().is_some_and(|tag| tag == selector),
            };
            if matched {
                return Some(node.clone());
            }
            node.children()
                .iter()
                .find_map(|child| search(child, selector))
        }
        search(&self.root, selector)
    }
}
