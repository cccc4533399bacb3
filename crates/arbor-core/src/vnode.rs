//! The virtual node tree model.
//!
//! A [`VNode`] is an immutable, in-memory description of a desired surface
//! node. Four kinds exist: elements, text, fragments (a logical grouping
//! with no surface element of its own), and raw-markup nodes whose children
//! are opaque to the diff engine.
//!
//! Children live in persistent vectors and the keyed-child index in a
//! persistent map, so a node untouched by one render survives by reference
//! into the next "previous tree" without recomputation downstream.
//!
//! # Surface-slot arithmetic
//!
//! A fragment materializes as a leading zero-width anchor text node followed
//! by its children, at every nesting level. [`VNode::advance`] is the number
//! of surface slots a node occupies among its siblings: 1 for anything but a
//! fragment, and `1 + children_count` for a fragment, where `children_count`
//! sums the `advance` of each child so nested anchors are counted too.

use im::{HashMap, Vector};

use crate::attribute::{self, Attr};

/// Void elements in the default (HTML) namespace.
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Whether `tag` is a void element (children suppressed, no closing tag).
///
/// Only meaningful in the default namespace; foreign namespaces have no
/// void elements.
#[must_use]
pub fn is_void_element(tag: &str, namespace: &str) -> bool {
    namespace.is_empty() && VOID_ELEMENTS.contains(&tag)
}

/// An immutable virtual tree node.
pub enum VNode<Msg> {
    /// A logical grouping of siblings with no surface element of its own.
    Fragment {
        key: String,
        children: Vector<VNode<Msg>>,
        /// Keyed index over `children`; always derivable from it.
        keyed_children: HashMap<String, VNode<Msg>>,
        /// Total surface slots the children expand to.
        children_count: usize,
    },
    /// A surface element.
    Element {
        key: String,
        namespace: String,
        tag: String,
        /// Normalized: unique names, sorted ascending.
        attributes: Vector<Attr<Msg>>,
        children: Vector<VNode<Msg>>,
        keyed_children: HashMap<String, VNode<Msg>>,
        self_closing: bool,
        void: bool,
    },
    /// A text node.
    Text { key: String, content: String },
    /// An element whose inner markup is opaque and never diffed as a tree.
    Raw {
        key: String,
        namespace: String,
        tag: String,
        attributes: Vector<Attr<Msg>>,
        inner_html: String,
    },
}

impl<Msg> Clone for VNode<Msg> {
    fn clone(&self) -> Self {
        match self {
            Self::Fragment {
                key,
                children,
                keyed_children,
                children_count,
            } => Self::Fragment {
                key: key.clone(),
                children: children.clone(),
                keyed_children: keyed_children.clone(),
                children_count: *children_count,
            },
            Self::Element {
                key,
                namespace,
                tag,
                attributes,
                children,
                keyed_children,
                self_closing,
                void,
            } => Self::Element {
                key: key.clone(),
                namespace: namespace.clone(),
                tag: tag.clone(),
                attributes: attributes.clone(),
                children: children.clone(),
                keyed_children: keyed_children.clone(),
                self_closing: *self_closing,
                void: *void,
            },
            Self::Text { key, content } => Self::Text {
                key: key.clone(),
                content: content.clone(),
            },
            Self::Raw {
                key,
                namespace,
                tag,
                attributes,
                inner_html,
            } => Self::Raw {
                key: key.clone(),
                namespace: namespace.clone(),
                tag: tag.clone(),
                attributes: attributes.clone(),
                inner_html: inner_html.clone(),
            },
        }
    }
}

impl<Msg> std::fmt::Debug for VNode<Msg> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fragment { key, children, .. } => f
                .debug_struct("Fragment")
                .field("key", key)
                .field("children", &children.iter().collect::<Vec<_>>())
                .finish_non_exhaustive(),
            Self::Element {
                key,
                tag,
                attributes,
                children,
                ..
            } => f
                .debug_struct("Element")
                .field("key", key)
                .field("tag", tag)
                .field("attributes", &attributes.iter().collect::<Vec<_>>())
                .field("children", &children.iter().collect::<Vec<_>>())
                .finish_non_exhaustive(),
            Self::Text { key, content } => f
                .debug_struct("Text")
                .field("key", key)
                .field("content", content)
                .finish(),
            Self::Raw {
                key,
                tag,
                inner_html,
                ..
            } => f
                .debug_struct("Raw")
                .field("key", key)
                .field("tag", tag)
                .field("inner_html", inner_html)
                .finish_non_exhaustive(),
        }
    }
}

/// Structural equality for tests and diff pruning; the keyed index is
/// derived state and event handlers compare by behavioral fields only.
impl<Msg> PartialEq for VNode<Msg> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Fragment { key, children, .. },
                Self::Fragment {
                    key: k2,
                    children: c2,
                    ..
                },
            ) => key == k2 && children == c2,
            (
                Self::Element {
                    key,
                    namespace,
                    tag,
                    attributes,
                    children,
                    ..
                },
                Self::Element {
                    key: k2,
                    namespace: n2,
                    tag: t2,
                    attributes: a2,
                    children: c2,
                    ..
                },
            ) => key == k2 && namespace == n2 && tag == t2 && attributes == a2 && children == c2,
            (
                Self::Text { key, content },
                Self::Text {
                    key: k2,
                    content: c2,
                },
            ) => key == k2 && content == c2,
            (
                Self::Raw {
                    key,
                    namespace,
                    tag,
                    attributes,
                    inner_html,
                },
                Self::Raw {
                    key: k2,
                    namespace: n2,
                    tag: t2,
                    attributes: a2,
                    inner_html: i2,
                },
            ) => key == k2 && namespace == n2 && tag == t2 && attributes == a2 && inner_html == i2,
            _ => false,
        }
    }
}

impl<Msg> VNode<Msg> {
    /// The node's stable key; empty means positional identity.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Fragment { key, .. }
            | Self::Element { key, .. }
            | Self::Text { key, .. }
            | Self::Raw { key, .. } => key,
        }
    }

    /// Surface slots this node occupies among its siblings.
    #[inline]
    #[must_use]
    pub fn advance(&self) -> usize {
        match self {
            Self::Fragment { children_count, .. } => 1 + children_count,
            _ => 1,
        }
    }

    /// The keyed-child index, when this node kind has children.
    #[must_use]
    pub fn keyed_children(&self) -> HashMap<String, VNode<Msg>> {
        match self {
            Self::Fragment { keyed_children, .. } | Self::Element { keyed_children, .. } => {
                keyed_children.clone()
            }
            _ => HashMap::new(),
        }
    }

    /// The node's children, when its kind has any.
    #[must_use]
    pub fn children(&self) -> Vector<VNode<Msg>> {
        match self {
            Self::Fragment { children, .. } | Self::Element { children, .. } => children.clone(),
            _ => Vector::new(),
        }
    }

    /// Rewrite every event handler's output through `f`.
    ///
    /// This is how nested component trees compose: a child tree producing
    /// `ChildMsg` is embedded with `child.map(Msg::Child)`.
    #[must_use]
    pub fn map<NewMsg, F>(self, f: F) -> VNode<NewMsg>
    where
        Msg: 'static,
        NewMsg: 'static,
        F: Fn(Msg) -> NewMsg + Clone + 'static,
    {
        match self {
            Self::Fragment { key, children, .. } => {
                let children: Vector<VNode<NewMsg>> =
                    children.into_iter().map(|c| c.map(f.clone())).collect();
                let keyed_children = index_children(&children);
                let children_count = count_surface_slots(&children);
                VNode::Fragment {
                    key,
                    children,
                    keyed_children,
                    children_count,
                }
            }
            Self::Element {
                key,
                namespace,
                tag,
                attributes,
                children,
                self_closing,
                void,
                ..
            } => {
                let children: Vector<VNode<NewMsg>> =
                    children.into_iter().map(|c| c.map(f.clone())).collect();
                let keyed_children = index_children(&children);
                VNode::Element {
                    key,
                    namespace,
                    tag,
                    attributes: attributes.into_iter().map(|a| a.map(f.clone())).collect(),
                    children,
                    keyed_children,
                    self_closing,
                    void,
                }
            }
            Self::Text { key, content } => VNode::Text { key, content },
            Self::Raw {
                key,
                namespace,
                tag,
                attributes,
                inner_html,
            } => VNode::Raw {
                key,
                namespace,
                tag,
                attributes: attributes.into_iter().map(|a| a.map(f.clone())).collect(),
                inner_html,
            },
        }
    }
}

/// Total surface slots a sibling list expands to.
///
/// Each child contributes its `advance`, so a nested fragment counts its
/// own anchor slot. This is the counting rule the diff and reconciler
/// agree on: both materialize an anchor for every fragment.
#[must_use]
pub fn count_surface_slots<Msg>(children: &Vector<VNode<Msg>>) -> usize {
    children.iter().map(VNode::advance).sum()
}

fn index_children<Msg>(children: &Vector<VNode<Msg>>) -> HashMap<String, VNode<Msg>> {
    let mut keyed = HashMap::new();
    for child in children {
        if !child.key().is_empty() {
            keyed.insert(child.key().to_owned(), child.clone());
        }
    }
    keyed
}

/// Construct an element in the default namespace.
#[must_use]
pub fn element<Msg>(
    tag: impl Into<String>,
    attrs: Vec<Attr<Msg>>,
    children: Vec<VNode<Msg>>,
) -> VNode<Msg> {
    element_ns(tag, "", attrs, children)
}

/// Construct an element in an explicit namespace.
#[must_use]
pub fn element_ns<Msg>(
    tag: impl Into<String>,
    namespace: impl Into<String>,
    attrs: Vec<Attr<Msg>>,
    children: Vec<VNode<Msg>>,
) -> VNode<Msg> {
    let tag = tag.into();
    let namespace = namespace.into();
    let void = is_void_element(&tag, &namespace);
    let children: Vector<VNode<Msg>> = if void {
        Vector::new()
    } else {
        children.into_iter().collect()
    };
    let keyed_children = index_children(&children);
    VNode::Element {
        key: String::new(),
        namespace,
        tag,
        attributes: attribute::normalize(attrs),
        children,
        keyed_children,
        self_closing: false,
        void,
    }
}

/// Construct a text node.
#[must_use]
pub fn text<Msg>(content: impl Into<String>) -> VNode<Msg> {
    VNode::Text {
        key: String::new(),
        content: content.into(),
    }
}

/// Construct a fragment.
#[must_use]
pub fn fragment<Msg>(children: Vec<VNode<Msg>>) -> VNode<Msg> {
    let children: Vector<VNode<Msg>> = children.into_iter().collect();
    let keyed_children = index_children(&children);
    let children_count = count_surface_slots(&children);
    VNode::Fragment {
        key: String::new(),
        children,
        keyed_children,
        children_count,
    }
}

/// Construct a raw-markup node whose inner markup is never diffed.
#[must_use]
pub fn raw<Msg>(
    tag: impl Into<String>,
    attrs: Vec<Attr<Msg>>,
    inner_html: impl Into<String>,
) -> VNode<Msg> {
    VNode::Raw {
        key: String::new(),
        namespace: String::new(),
        tag: tag.into(),
        attributes: attribute::normalize(attrs),
        inner_html: inner_html.into(),
    }
}

/// Return a copy of `node` stamped with `key`.
///
/// Stamping a fragment also stamps its children with compound keys
/// `"<key>::<child key or index>"` so uniqueness composes across nesting,
/// and rebuilds the keyed index to match.
#[must_use]
pub fn with_key<Msg>(node: VNode<Msg>, key: impl Into<String>) -> VNode<Msg> {
    let key = key.into();
    match node {
        VNode::Fragment { children, .. } => {
            let children: Vector<VNode<Msg>> = children
                .into_iter()
                .enumerate()
                .map(|(index, child)| {
                    let child_key = if child.key().is_empty() {
                        format!("{key}::{index}")
                    } else {
                        format!("{key}::{}", child.key())
                    };
                    with_key(child, child_key)
                })
                .collect();
            let keyed_children = index_children(&children);
            let children_count = count_surface_slots(&children);
            VNode::Fragment {
                key,
                children,
                keyed_children,
                children_count,
            }
        }
        VNode::Element {
            namespace,
            tag,
            attributes,
            children,
            keyed_children,
            self_closing,
            void,
            ..
        } => VNode::Element {
            key,
            namespace,
            tag,
            attributes,
            children,
            keyed_children,
            self_closing,
            void,
        },
        VNode::Text { content, .. } => VNode::Text { key, content },
        VNode::Raw {
            namespace,
            tag,
            attributes,
            inner_html,
            ..
        } => VNode::Raw {
            key,
            namespace,
            tag,
            attributes,
            inner_html,
        },
    }
}

/// Build a keyed sibling list from `(key, node)` pairs.
#[must_use]
pub fn keyed<Msg>(pairs: Vec<(String, VNode<Msg>)>) -> Vec<VNode<Msg>> {
    pairs
        .into_iter()
        .map(|(key, node)| with_key(node, key))
        .collect()
}
