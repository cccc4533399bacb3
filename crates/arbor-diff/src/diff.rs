//! The keyed diff engine.
//!
//! [`diff`] compares an old and a new virtual tree and produces the edit
//! script that transforms one into the other, threading the [`EventTable`]
//! through so listener registrations track insertions and removals.
//!
//! # Sibling walk
//!
//! Each scope processes two sibling lists left to right, consuming from the
//! front, with keyed indices over both sides. `moved` records keys already
//! relocated by an emitted `Move`; `moved_offset` tracks the cumulative
//! drift between new-tree surface indices (`node_index`) and the old-tree
//! coordinates that index-bearing changes are expressed in. Emitted changes
//! are reversed into application order when a patch is built, so rightward
//! edits apply first and leftward indices stay valid (see `patch`).
//!
//! Element subtrees that produce no changes contribute nothing to the
//! patch; this pruning is what keeps large quiet trees cheap.

use std::collections::VecDeque;

use ahash::AHashSet;
use im::{HashMap, Vector};

use arbor_core::{Attr, Path, VNode};

use crate::events::{EventTable, Handler};
use crate::patch::{Change, Patch};

/// Attribute names force-synced whenever their element is controlled.
const CONTROLLED_NAMES: [&str; 3] = ["value", "checked", "selected"];

/// Properties resynced on every diff regardless of equality; the surface
/// mutates these behind the runtime's back on every scroll.
const ALWAYS_SYNC_PROPERTIES: [&str; 2] = ["scrollLeft", "scrollTop"];

/// The result of one diff cycle.
pub struct Diff<Msg> {
    /// Edit script rooted at the mount point.
    pub patch: Patch<Msg>,
    /// Event table after registrations and purges.
    pub events: EventTable<Msg>,
}

/// Diff `old` against `new`, updating listener registrations as it goes.
///
/// Both trees are read-only; children untouched by the walk are carried by
/// reference into the patch. The returned patch transforms a surface
/// currently rendering `old` into one rendering `new`.
#[must_use]
pub fn diff<Msg>(events: EventTable<Msg>, old: &VNode<Msg>, new: &VNode<Msg>) -> Diff<Msg> {
    let scope = Scope {
        old: VecDeque::from([old.clone()]),
        old_keyed: HashMap::new(),
        new: VecDeque::from([new.clone()]),
        new_keyed: HashMap::new(),
        node_index: 0,
        moved_offset: 0,
    };
    let outcome = diff_siblings(events, &Path::root(), scope, Vec::new());
    let mut changes = outcome.changes;
    changes.reverse();
    Diff {
        patch: Patch {
            index: 0,
            removed: outcome.removed,
            changes,
            children: outcome.children,
        },
        events: outcome.events,
    }
}

/// One sibling scope: the two lists plus the indices and counters that
/// govern it.
struct Scope<Msg> {
    old: VecDeque<VNode<Msg>>,
    old_keyed: HashMap<String, VNode<Msg>>,
    new: VecDeque<VNode<Msg>>,
    new_keyed: HashMap<String, VNode<Msg>>,
    /// Surface index of the current head, new-tree coordinates.
    node_index: usize,
    /// `node_index - moved_offset` is the old-tree coordinate.
    moved_offset: isize,
}

struct SiblingOutcome<Msg> {
    /// Emission order; callers reverse when building a patch.
    changes: Vec<Change<Msg>>,
    /// Nested patches, ascending by index.
    children: Vec<Patch<Msg>>,
    /// Stale trailing surface slots.
    removed: usize,
    events: EventTable<Msg>,
}

fn old_coord(node_index: usize, moved_offset: isize) -> usize {
    usize::try_from(node_index as isize - moved_offset).unwrap_or(0)
}

fn diff_siblings<Msg>(
    mut events: EventTable<Msg>,
    path: &Path,
    scope: Scope<Msg>,
    mut children: Vec<Patch<Msg>>,
) -> SiblingOutcome<Msg> {
    let Scope {
        mut old,
        old_keyed,
        mut new,
        new_keyed,
        mut node_index,
        mut moved_offset,
    } = scope;

    let mut changes: Vec<Change<Msg>> = Vec::new();
    let mut removed: usize = 0;
    let mut moved: AHashSet<String> = AHashSet::new();

    loop {
        match (old.pop_front(), new.pop_front()) {
            (None, None) => break,

            // New side exhausted: everything left on the old side is stale,
            // unless an earlier Move already relocated it.
            (Some(prev), None) => {
                if prev.key().is_empty() || !moved.contains(prev.key()) {
                    removed += prev.advance();
                    events = events.remove_child(path, old_coord(node_index, moved_offset), &prev);
                }
                // Keep old-tree coordinates advancing past this node.
                moved_offset -= prev.advance() as isize;
            }

            // Old side exhausted: insert the remaining new nodes as one batch.
            (None, Some(next)) => {
                let before = old_coord(node_index, moved_offset);
                let mut batch = vec![next];
                batch.extend(new.drain(..));
                let mut from = node_index;
                for node in &batch {
                    events = events.add_child(path, from, node);
                    from += node.advance();
                }
                changes.push(Change::Insert {
                    children: batch,
                    before,
                });
                break;
            }

            (Some(prev), Some(next)) if prev.key() != next.key() => {
                let matched = if next.key().is_empty() {
                    None
                } else {
                    old_keyed.get(next.key()).cloned()
                };
                let prev_in_new =
                    !prev.key().is_empty() && new_keyed.contains_key(prev.key());

                match (prev_in_new, matched) {
                    // Both sides participate in a reordering.
                    (true, Some(matched)) => {
                        if moved.contains(prev.key()) {
                            // Already relocated from the other direction:
                            // skip it here without double-counting.
                            moved_offset -= prev.advance() as isize;
                            new.push_front(next);
                        } else {
                            let count = matched.advance();
                            let before = old_coord(node_index, moved_offset);
                            tracing::trace!(key = next.key(), before, count, "keyed move");
                            changes.push(Change::Move {
                                key: next.key().to_owned(),
                                before,
                                count,
                            });
                            moved.insert(next.key().to_owned());
                            moved_offset += count as isize;
                            old.push_front(prev);
                            old.push_front(matched);
                            new.push_front(next);
                        }
                    }

                    // The old head matches nothing downstream: pure removal.
                    (false, Some(_)) => {
                        let count = prev.advance();
                        events =
                            events.remove_child(path, old_coord(node_index, moved_offset), &prev);
                        changes.push(Change::RemoveKey {
                            key: prev.key().to_owned(),
                            count,
                        });
                        moved_offset -= count as isize;
                        new.push_front(next);
                    }

                    // The new head matches nothing upstream: pure insertion.
                    (true, None) => {
                        let before = old_coord(node_index, moved_offset);
                        let count = next.advance();
                        events = events.add_child(path, node_index, &next);
                        changes.push(Change::Insert {
                            children: vec![next],
                            before,
                        });
                        moved_offset += count as isize;
                        node_index += count;
                        old.push_front(prev);
                    }

                    // Neither key matches the other side: direct replacement.
                    (false, None) => {
                        let (change, next_count) = replace_node(
                            &mut events,
                            path,
                            node_index,
                            moved_offset,
                            &prev,
                            &next,
                        );
                        moved_offset += next_count as isize - prev.advance() as isize;
                        node_index += next_count;
                        changes.push(change);
                    }
                }
            }

            // Same key: recurse by kind, or replace on a kind/tag mismatch.
            (Some(prev), Some(next)) => match (prev, next) {
                (
                    VNode::Fragment {
                        children: old_children,
                        keyed_children: old_keyed_children,
                        children_count: old_count,
                        ..
                    },
                    VNode::Fragment {
                        children: new_children,
                        keyed_children: new_keyed_children,
                        children_count: new_count,
                        ..
                    },
                ) => {
                    // Fragment children continue the parent's numbering,
                    // one past the fragment anchor, in a fresh move scope
                    // but with the surrounding offset carried through.
                    let inner = Scope {
                        old: old_children.iter().cloned().collect(),
                        old_keyed: old_keyed_children,
                        new: new_children.iter().cloned().collect(),
                        new_keyed: new_keyed_children,
                        node_index: node_index + 1,
                        moved_offset,
                    };
                    let outcome = diff_siblings(events, path, inner, children);
                    events = outcome.events;
                    children = outcome.children;
                    changes.extend(outcome.changes);
                    if outcome.removed > 0 {
                        // A fragment has no surface node of its own, so its
                        // trailing stale slots become an explicit Remove in
                        // the parent, expressed in old-tree coordinates.
                        let from = old_coord(node_index + 1, moved_offset) + old_count
                            - outcome.removed;
                        changes.push(Change::Remove {
                            from,
                            count: outcome.removed,
                        });
                    }
                    moved_offset += new_count as isize - old_count as isize;
                    node_index += 1 + new_count;
                }

                (
                    VNode::Element {
                        namespace: old_ns,
                        tag: old_tag,
                        attributes: old_attrs,
                        children: old_children,
                        keyed_children: old_keyed_children,
                        ..
                    },
                    VNode::Element {
                        key,
                        namespace: new_ns,
                        tag: new_tag,
                        attributes: new_attrs,
                        children: new_children,
                        keyed_children: new_keyed_children,
                        ..
                    },
                ) if old_tag == new_tag && old_ns == new_ns => {
                    let child_path = path.add(node_index, &key);
                    let attr_diff = diff_attributes(events, &child_path, &old_attrs, &new_attrs);
                    events = attr_diff.events;
                    let inner = Scope {
                        old: old_children.iter().cloned().collect(),
                        old_keyed: old_keyed_children,
                        new: new_children.iter().cloned().collect(),
                        new_keyed: new_keyed_children,
                        node_index: 0,
                        moved_offset: 0,
                    };
                    let outcome = diff_siblings(events, &child_path, inner, Vec::new());
                    events = outcome.events;

                    let mut patch_changes = outcome.changes;
                    if !attr_diff.added.is_empty() || !attr_diff.removed.is_empty() {
                        patch_changes.push(Change::Update {
                            added: attr_diff.added,
                            removed: attr_diff.removed,
                        });
                    }
                    if !patch_changes.is_empty()
                        || !outcome.children.is_empty()
                        || outcome.removed > 0
                    {
                        patch_changes.reverse();
                        children.push(Patch {
                            index: node_index,
                            removed: outcome.removed,
                            changes: patch_changes,
                            children: outcome.children,
                        });
                    }
                    node_index += 1;
                }

                (
                    VNode::Text {
                        content: old_content,
                        ..
                    },
                    VNode::Text {
                        content: new_content,
                        ..
                    },
                ) => {
                    if old_content != new_content {
                        children.push(Patch {
                            index: node_index,
                            removed: 0,
                            changes: vec![Change::ReplaceText {
                                content: new_content,
                            }],
                            children: Vec::new(),
                        });
                    }
                    node_index += 1;
                }

                (
                    VNode::Raw {
                        namespace: old_ns,
                        tag: old_tag,
                        attributes: old_attrs,
                        inner_html: old_html,
                        ..
                    },
                    VNode::Raw {
                        key,
                        namespace: new_ns,
                        tag: new_tag,
                        attributes: new_attrs,
                        inner_html: new_html,
                    },
                ) if old_tag == new_tag && old_ns == new_ns => {
                    let child_path = path.add(node_index, &key);
                    let attr_diff = diff_attributes(events, &child_path, &old_attrs, &new_attrs);
                    events = attr_diff.events;
                    let mut patch_changes = Vec::new();
                    if old_html != new_html {
                        patch_changes.push(Change::ReplaceInnerHtml {
                            inner_html: new_html,
                        });
                    }
                    if !attr_diff.added.is_empty() || !attr_diff.removed.is_empty() {
                        patch_changes.push(Change::Update {
                            added: attr_diff.added,
                            removed: attr_diff.removed,
                        });
                    }
                    if !patch_changes.is_empty() {
                        children.push(Patch {
                            index: node_index,
                            removed: 0,
                            changes: patch_changes,
                            children: Vec::new(),
                        });
                    }
                    node_index += 1;
                }

                // Equal keys but incompatible kind, tag, or namespace.
                (prev, next) => {
                    let (change, next_count) =
                        replace_node(&mut events, path, node_index, moved_offset, &prev, &next);
                    moved_offset += next_count as isize - prev.advance() as isize;
                    node_index += next_count;
                    changes.push(change);
                }
            },
        }
    }

    SiblingOutcome {
        changes,
        children,
        removed,
        events,
    }
}

/// Tear down `prev` and stand up `next` in its place.
fn replace_node<Msg>(
    events: &mut EventTable<Msg>,
    path: &Path,
    node_index: usize,
    moved_offset: isize,
    prev: &VNode<Msg>,
    next: &VNode<Msg>,
) -> (Change<Msg>, usize) {
    let from = old_coord(node_index, moved_offset);
    tracing::trace!(from, "replacing node");
    let table = std::mem::take(events);
    let table = table.remove_child(path, from, prev);
    *events = table.add_child(path, node_index, next);
    (
        Change::Replace {
            from,
            count: prev.advance(),
            with: next.clone(),
        },
        next.advance(),
    )
}

/// Outcome of one attribute merge-walk.
struct AttrDiff<Msg> {
    added: Vec<Attr<Msg>>,
    removed: Vec<Attr<Msg>>,
    events: EventTable<Msg>,
}

/// Merge-walk two name-sorted attribute lists.
///
/// The controlled override is the one deliberate exception to pure
/// equality-based skipping: once a form control has dispatched an input or
/// change event, its `value`/`checked`/`selected` must be re-asserted every
/// render to win against out-of-band surface edits.
fn diff_attributes<Msg>(
    mut events: EventTable<Msg>,
    path: &Path,
    old: &Vector<Attr<Msg>>,
    new: &Vector<Attr<Msg>>,
) -> AttrDiff<Msg> {
    let mut added: Vec<Attr<Msg>> = Vec::new();
    let mut removed: Vec<Attr<Msg>> = Vec::new();
    let controlled = events.has_dispatched_path(path);

    let (mut i, mut j) = (0usize, 0usize);
    loop {
        let pair = match (old.get(i), new.get(j)) {
            (None, None) => break,
            (Some(o), None) => {
                i += 1;
                (Some(o), None)
            }
            (None, Some(n)) => {
                j += 1;
                (None, Some(n))
            }
            (Some(o), Some(n)) => match o.name().cmp(n.name()) {
                std::cmp::Ordering::Less => {
                    i += 1;
                    (Some(o), None)
                }
                std::cmp::Ordering::Greater => {
                    j += 1;
                    (None, Some(n))
                }
                std::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                    (Some(o), Some(n))
                }
            },
        };

        match pair {
            (Some(o), None) => {
                if let Attr::Event { name, .. } = o {
                    events = events.remove(path, name);
                }
                removed.push(o.clone());
            }
            (None, Some(n)) => {
                if let Attr::Event {
                    name,
                    handler,
                    prevent_default,
                    stop_propagation,
                    ..
                } = n
                {
                    events = events.add(
                        path,
                        name,
                        Handler {
                            decoder: handler.clone(),
                            prevent_default: *prevent_default,
                            stop_propagation: *stop_propagation,
                        },
                    );
                }
                added.push(n.clone());
            }
            (Some(o), Some(n)) => match (o, n) {
                (
                    Attr::Attribute { name, value },
                    Attr::Attribute {
                        value: new_value, ..
                    },
                ) => {
                    let force = controlled && CONTROLLED_NAMES.contains(&name.as_str());
                    if value != new_value || force {
                        added.push(n.clone());
                    }
                }
                (
                    Attr::Property { name, value },
                    Attr::Property {
                        value: new_value, ..
                    },
                ) => {
                    let always = ALWAYS_SYNC_PROPERTIES.contains(&name.as_str());
                    let force = controlled && CONTROLLED_NAMES.contains(&name.as_str());
                    if always || force || value != new_value {
                        added.push(n.clone());
                    }
                }
                (
                    Attr::Event { .. },
                    Attr::Event {
                        name,
                        handler,
                        prevent_default,
                        stop_propagation,
                        ..
                    },
                ) => {
                    // Same name, same path: re-point the table at the new
                    // decoder without listener churn on the surface.
                    events = events.add(
                        path,
                        name,
                        Handler {
                            decoder: handler.clone(),
                            prevent_default: *prevent_default,
                            stop_propagation: *stop_propagation,
                        },
                    );
                    if o != n {
                        added.push(n.clone());
                    }
                }
                // Kind changed under the same name.
                (o, n) => {
                    if let Attr::Event { name, .. } = o {
                        events = events.remove(path, name);
                    }
                    removed.push(o.clone());
                    if let Attr::Event {
                        name,
                        handler,
                        prevent_default,
                        stop_propagation,
                        ..
                    } = n
                    {
                        events = events.add(
                            path,
                            name,
                            Handler {
                                decoder: handler.clone(),
                                prevent_default: *prevent_default,
                                stop_propagation: *stop_propagation,
                            },
                        );
                    }
                    added.push(n.clone());
                }
            },
            (None, None) => break,
        }
    }

    AttrDiff {
        added,
        removed,
        events,
    }
}
