//! Adoption of pre-existing surface markup.
//!
//! When the runtime mounts onto a node that already has children (server- or
//! hand-rendered markup), those children are converted into an initial
//! virtual tree so the first diff reconciles against reality instead of
//! blowing the content away. A `data-arbor-key` attribute, when present, is
//! adopted as the node's key and stripped from the live node.

use arbor_core::VNode;
use arbor_core::attribute::attribute;
use arbor_core::vnode::{self};

use crate::node::{KEY_ATTRIBUTE, Node};

/// Convert the existing children of `root` into a virtual tree.
///
/// Returns `None` when there is nothing to adopt (no children, or only
/// whitespace text). A single adopted child becomes the root of the tree;
/// several become a fragment. Children that do not survive adoption
/// (whitespace-only text) are also detached from the live surface, so
/// surface indices keep matching the virtual tree.
#[must_use]
pub fn virtualise<Msg>(root: &Node) -> Option<VNode<Msg>> {
    let mut children = virtualise_children(root);
    match children.len() {
        0 => None,
        1 => children.pop(),
        _ => Some(vnode::fragment(children)),
    }
}

fn virtualise_children<Msg>(node: &Node) -> Vec<VNode<Msg>> {
    let mut out = Vec::new();
    for child in node.children() {
        match virtualise_node(&child) {
            Some(vnode) => out.push(vnode),
            None => child.detach(),
        }
    }
    out
}

fn virtualise_node<Msg>(node: &Node) -> Option<VNode<Msg>> {
    if node.is_text() {
        let content = node.text_content().unwrap_or_default();
        if content.trim().is_empty() {
            return None;
        }
        return Some(vnode::text(content));
    }

    let tag = node.tag()?;
    let namespace = node.namespace().unwrap_or_default();

    let key = node.attribute(KEY_ATTRIBUTE).unwrap_or_default();
    if !key.is_empty() {
        node.remove_attribute(KEY_ATTRIBUTE);
        node.set_key(key.clone());
    }

    let attrs = node
        .attributes()
        .into_iter()
        .map(|(name, value)| attribute(name, value))
        .collect();

    let children = virtualise_children(node);

    let vnode = vnode::element_ns(tag, namespace, attrs, children);
    if key.is_empty() {
        Some(vnode)
    } else {
        Some(vnode::with_key(vnode, key))
    }
}
