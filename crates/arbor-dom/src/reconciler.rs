//! Applies patches to the surface and turns surface events into dispatches.
//!
//! The reconciler owns one mount point. `mount` materializes a virtual tree
//! beneath it (fragment anchors included); `push` replays a patch produced
//! by the diff engine. Index-bearing changes address the child list in
//! old-tree coordinates and arrive in right-to-left application order, so
//! each index is still valid when its change lands; child patches use
//! new-tree indices and apply after the structural changes and trailing
//! trim.
//!
//! A mount `offset` accounts for surface children that precede the managed
//! tree (pre-existing markup the runtime does not own). It shifts every
//! index at the mount root and is subtracted back out when dispatch builds
//! a structural path.

use serde_json::{Map, Value};
use web_time::Instant;

use arbor_core::{Attr, Path, VNode};
use arbor_diff::{Change, Patch};

use crate::node::{ListenerConfig, Node, WeakNode};

/// Errors raised while replaying a patch against the surface.
///
/// These indicate a surface that no longer matches the tree the patch was
/// diffed against; the runtime surfaces them instead of guessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// No child at the index a change addressed.
    MissingChild { index: usize },
    /// No child carrying the key a change addressed.
    MissingKey { key: String },
    /// A text edit addressed a non-text node.
    NotAText { index: usize },
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingChild { index } => {
                write!(f, "no surface child at index {index}")
            }
            Self::MissingKey { key } => {
                write!(f, "no surface child with key {key:?}")
            }
            Self::NotAText { index } => {
                write!(f, "surface child at index {index} is not a text node")
            }
        }
    }
}

impl std::error::Error for ReconcileError {}

pub type Result<T> = std::result::Result<T, ReconcileError>;

/// What the reconciler decided about one surface event.
#[derive(Debug)]
pub enum EventResponse {
    /// Deliver now.
    Dispatch {
        path: Path,
        name: String,
        payload: Value,
        immediate: bool,
    },
    /// Deliver after `delay_ms` of quiet, unless the token is invalidated
    /// by a newer firing or the node's removal.
    Schedule { delay_ms: u64, token: DebounceToken },
    /// Suppressed inside a throttle window. The listener's behavioral flags
    /// still apply to the suppressed firing.
    Throttled {
        prevent_default: bool,
        stop_propagation: bool,
    },
    /// No listener is attached, or the target sits outside the mount point.
    Drop,
}

/// A pending debounced dispatch. Valid while the node is alive and no newer
/// firing has advanced its sequence.
#[derive(Debug)]
pub struct DebounceToken {
    node: WeakNode,
    name: String,
    seq: u64,
    path: Path,
    payload: Value,
    immediate: bool,
}

/// Binds a mount point and replays patches against it.
#[derive(Debug, Clone)]
pub struct Reconciler {
    root: Node,
    offset: usize,
}

impl Reconciler {
    /// Manage the children of `root` from `offset` onward.
    #[must_use]
    pub fn new(root: Node, offset: usize) -> Self {
        Self { root, offset }
    }

    #[must_use]
    pub fn root(&self) -> Node {
        self.root.clone()
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Materialize `vnode` beneath the mount point.
    pub fn mount<Msg>(&self, vnode: &VNode<Msg>) {
        for node in create_subtree(vnode) {
            self.root.append_child(&node);
        }
    }

    /// Replay one patch.
    pub fn push<Msg>(&self, patch: &Patch<Msg>) -> Result<()> {
        self.apply(&self.root, patch, self.offset)
    }

    fn apply<Msg>(&self, node: &Node, patch: &Patch<Msg>, offset: usize) -> Result<()> {
        for change in &patch.changes {
            apply_change(node, change, offset)?;
        }
        if patch.removed > 0 {
            node.remove_trailing(patch.removed);
        }
        for child_patch in &patch.children {
            let index = child_patch.index + offset;
            let child = node
                .child_at(index)
                .ok_or(ReconcileError::MissingChild { index })?;
            self.apply(&child, child_patch, 0)?;
        }
        Ok(())
    }

    /// Decide what to do with an event observed at `target`.
    ///
    /// Applies throttle, then debounce, then hands back a dispatch carrying
    /// the structural path and the include-projected payload. Returns
    /// [`EventResponse::Drop`] when no listener is attached.
    #[must_use]
    pub fn event(&self, target: &Node, name: &str, payload: Value, now: Instant) -> EventResponse {
        let Some(config) = target.listener(name) else {
            return EventResponse::Drop;
        };
        let Some(path) = self.path_of(target) else {
            tracing::debug!(name, "event target is outside the mount point");
            return EventResponse::Drop;
        };
        let payload = project(payload, &config.include);

        if config.throttle > 0 {
            if let Some(last) = target.throttle_last(name) {
                let elapsed = now.saturating_duration_since(last).as_millis();
                if (elapsed as u64) < config.throttle {
                    tracing::trace!(name, "throttled");
                    return EventResponse::Throttled {
                        prevent_default: config.prevent_default,
                        stop_propagation: config.stop_propagation,
                    };
                }
            }
            target.record_throttle(name, now);
        }

        if config.debounce > 0 {
            let seq = target.bump_debounce(name);
            return EventResponse::Schedule {
                delay_ms: config.debounce,
                token: DebounceToken {
                    node: target.weak(),
                    name: name.to_owned(),
                    seq,
                    path,
                    payload,
                    immediate: config.immediate,
                },
            };
        }

        EventResponse::Dispatch {
            path,
            name: name.to_owned(),
            payload,
            immediate: config.immediate,
        }
    }

    /// Redeem a debounce token once its quiet period has elapsed.
    ///
    /// Yields `None` when the node has been removed or a newer firing
    /// restarted the clock.
    #[must_use]
    pub fn deliver(&self, token: DebounceToken) -> Option<EventResponse> {
        let node = token.node.upgrade()?;
        if node.debounce_seq(&token.name) != token.seq {
            return None;
        }
        Some(EventResponse::Dispatch {
            path: token.path,
            name: token.name,
            payload: token.payload,
            immediate: token.immediate,
        })
    }

    /// The structural path of `target` relative to the mount point.
    fn path_of(&self, target: &Node) -> Option<Path> {
        let mut segments: Vec<(usize, String)> = Vec::new();
        let mut node = target.clone();
        while node != self.root {
            let index = node.index_in_parent()?;
            let parent = node.parent()?;
            let index = if parent == self.root {
                index.checked_sub(self.offset)?
            } else {
                index
            };
            segments.push((index, node.key()));
            node = parent;
        }
        let mut path = Path::root();
        for (index, key) in segments.into_iter().rev() {
            path = path.add(index, &key);
        }
        Some(path)
    }
}

/// Materialize one virtual node as surface nodes.
///
/// Everything yields a single node except fragments, which expand to a
/// zero-width anchor text node followed by their (flattened) children.
fn create_subtree<Msg>(vnode: &VNode<Msg>) -> Vec<Node> {
    match vnode {
        VNode::Text { key, content } => {
            let node = Node::text(content.clone());
            node.set_key(key.clone());
            vec![node]
        }
        VNode::Element {
            key,
            namespace,
            tag,
            attributes,
            children,
            ..
        } => {
            let node = Node::element(namespace.clone(), tag.clone());
            node.set_key(key.clone());
            for attr in attributes {
                set_surface_attr(&node, attr);
            }
            for child in children {
                for created in create_subtree(child) {
                    node.append_child(&created);
                }
            }
            vec![node]
        }
        VNode::Fragment { key, children, .. } => {
            let anchor = Node::text("");
            anchor.set_key(key.clone());
            let mut nodes = vec![anchor];
            for child in children {
                nodes.extend(create_subtree(child));
            }
            nodes
        }
        VNode::Raw {
            key,
            namespace,
            tag,
            attributes,
            inner_html,
        } => {
            let node = Node::element(namespace.clone(), tag.clone());
            node.set_key(key.clone());
            for attr in attributes {
                set_surface_attr(&node, attr);
            }
            node.set_inner_html(inner_html.clone());
            vec![node]
        }
    }
}

fn set_surface_attr<Msg>(node: &Node, attr: &Attr<Msg>) {
    match attr {
        Attr::Attribute { name, value } => node.set_attribute(name.clone(), value.clone()),
        Attr::Property { name, value } => node.set_property(name.clone(), value.clone()),
        Attr::Event {
            name,
            include,
            prevent_default,
            stop_propagation,
            immediate,
            debounce,
            throttle,
            ..
        } => node.set_listener(
            name.clone(),
            ListenerConfig {
                include: include.clone(),
                prevent_default: *prevent_default,
                stop_propagation: *stop_propagation,
                immediate: *immediate,
                debounce: *debounce,
                throttle: *throttle,
            },
        ),
    }
}

fn remove_surface_attr<Msg>(node: &Node, attr: &Attr<Msg>) {
    match attr {
        Attr::Attribute { name, .. } => node.remove_attribute(name),
        Attr::Property { name, .. } => node.remove_property(name),
        Attr::Event { name, .. } => node.remove_listener(name),
    }
}

fn apply_change<Msg>(node: &Node, change: &Change<Msg>, offset: usize) -> Result<()> {
    match change {
        Change::ReplaceText { content } => {
            if !node.is_text() {
                return Err(ReconcileError::NotAText { index: 0 });
            }
            node.set_text(content.clone());
        }
        Change::ReplaceInnerHtml { inner_html } => {
            node.set_inner_html(inner_html.clone());
        }
        Change::Update { added, removed } => {
            for attr in removed {
                remove_surface_attr(node, attr);
            }
            for attr in added {
                set_surface_attr(node, attr);
            }
        }
        Change::Move { key, before, count } => {
            let child = node
                .keyed_child(key)
                .ok_or_else(|| ReconcileError::MissingKey { key: key.clone() })?;
            let start = child
                .index_in_parent()
                .ok_or_else(|| ReconcileError::MissingKey { key: key.clone() })?;
            let block: Vec<Node> = (start..start + count)
                .map(|index| {
                    node.child_at(index)
                        .ok_or(ReconcileError::MissingChild { index })
                })
                .collect::<Result<_>>()?;
            // The moved block always sits at or right of its destination,
            // so detaching it cannot shift the insertion point.
            let mut at = before + offset;
            for moved in block {
                moved.detach();
                node.insert_at(at, &moved);
                at += 1;
            }
        }
        Change::RemoveKey { key, count } => {
            let child = node
                .keyed_child(key)
                .ok_or_else(|| ReconcileError::MissingKey { key: key.clone() })?;
            let start = child
                .index_in_parent()
                .ok_or_else(|| ReconcileError::MissingKey { key: key.clone() })?;
            for _ in 0..*count {
                if node.remove_at(start).is_none() {
                    return Err(ReconcileError::MissingChild { index: start });
                }
            }
        }
        Change::Remove { from, count } => {
            let from = from + offset;
            for _ in 0..*count {
                if node.remove_at(from).is_none() {
                    return Err(ReconcileError::MissingChild { index: from });
                }
            }
        }
        Change::Replace { from, count, with } => {
            let from = from + offset;
            for _ in 0..*count {
                if node.remove_at(from).is_none() {
                    return Err(ReconcileError::MissingChild { index: from });
                }
            }
            let mut at = from;
            for created in create_subtree(with) {
                node.insert_at(at, &created);
                at += 1;
            }
        }
        Change::Insert { children, before } => {
            let mut at = before + offset;
            for child in children {
                for created in create_subtree(child) {
                    node.insert_at(at, &created);
                    at += 1;
                }
            }
        }
    }
    Ok(())
}

/// Project a payload down to the listed dot-separated field paths.
///
/// An empty include list forwards the payload untouched.
fn project(payload: Value, include: &[String]) -> Value {
    if include.is_empty() {
        return payload;
    }
    let mut out = Map::new();
    for spec in include {
        let mut source = &payload;
        let mut ok = true;
        for field in spec.split('.') {
            match source.get(field) {
                Some(next) => source = next,
                None => {
                    ok = false;
                    break;
                }
            }
        }
        if !ok {
            continue;
        }
        // Rebuild the nested shape so decoders see the original layout. A
        // spec that disagrees with an earlier one about whether a field is
        // a leaf or an object loses; first writer wins.
        let mut target = Some(&mut out);
        let fields: Vec<&str> = spec.split('.').collect();
        for field in &fields[..fields.len() - 1] {
            target = target.and_then(|map| {
                map.entry((*field).to_owned())
                    .or_insert_with(|| Value::Object(Map::new()))
                    .as_object_mut()
            });
        }
        if let (Some(map), Some(last)) = (target, fields.last()) {
            map.insert((*last).to_owned(), source.clone());
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn project_keeps_listed_paths_only() {
        let payload = json!({
            "target": { "value": "abc", "id": "x" },
            "timeStamp": 9,
        });
        let projected = project(payload, &["target.value".to_owned()]);
        assert_eq!(projected, json!({ "target": { "value": "abc" } }));
    }

    #[test]
    fn project_with_empty_include_passes_through() {
        let payload = json!({ "anything": true });
        assert_eq!(project(payload.clone(), &[]), payload);
    }

    #[test]
    fn project_skips_missing_paths() {
        let payload = json!({ "a": 1 });
        let projected = project(payload, &["b.c".to_owned(), "a".to_owned()]);
        assert_eq!(projected, json!({ "a": 1 }));
    }
}
