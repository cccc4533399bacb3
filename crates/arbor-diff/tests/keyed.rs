//! Keyed sibling diffing: moves, insertions, removals, and the offset
//! arithmetic tying them together.

use arbor_core::html::{div, li, p, text, ul};
use arbor_core::vnode::{self, VNode};
use arbor_diff::{Change, EventTable, diff};

type Msg = ();
type Node = VNode<Msg>;

fn keyed_list(keys: &[&str]) -> Node {
    ul(
        vec![],
        vnode::keyed(
            keys.iter()
                .map(|key| ((*key).to_owned(), li(vec![], vec![text(*key)])))
                .collect(),
        ),
    )
}

/// Diff two keyed lists and return the `ul`'s own change list.
fn list_changes(old: &[&str], new: &[&str]) -> Vec<Change<Msg>> {
    let outcome = diff(EventTable::new(), &keyed_list(old), &keyed_list(new));
    let mut children = outcome.patch.children;
    match children.pop() {
        Some(patch) => patch.changes,
        None => Vec::new(),
    }
}

#[test]
fn identical_trees_produce_an_empty_patch() {
    let tree = keyed_list(&["a", "b", "c"]);
    let outcome = diff(EventTable::new(), &tree, &tree);
    assert!(outcome.patch.is_empty());
}

#[test]
fn rotation_to_the_front_is_a_single_move() {
    let changes = list_changes(&["a", "b", "c"], &["c", "a", "b"]);
    assert_eq!(changes.len(), 1);
    assert!(matches!(
        &changes[0],
        Change::Move { key, before: 0, count: 1 } if key == "c"
    ));
}

#[test]
fn rotation_to_the_back_needs_two_moves() {
    // [a, b, c] -> [b, c, a]: b and c each jump over a. Changes are stored
    // in application order, so replaying them left to right lands on the
    // target list.
    let changes = list_changes(&["a", "b", "c"], &["b", "c", "a"]);
    assert_eq!(changes.len(), 2);

    let mut surface: Vec<&str> = vec!["a", "b", "c"];
    for change in &changes {
        let Change::Move { key, before, count } = change else {
            panic!("a pure permutation must produce only moves, got {change:?}");
        };
        assert_eq!(*count, 1);
        let at = surface
            .iter()
            .position(|k| *k == key.as_str())
            .unwrap_or_else(|| panic!("moved key {key} must exist on the surface"));
        let moved = surface.remove(at);
        surface.insert(*before, moved);
    }
    assert_eq!(surface, vec!["b", "c", "a"]);
}

#[test]
fn insertion_at_the_front_is_a_single_insert() {
    let changes = list_changes(&["b"], &["a", "b"]);
    assert_eq!(changes.len(), 1);
    assert!(matches!(
        &changes[0],
        Change::Insert { children, before: 0 } if children.len() == 1 && children[0].key() == "a"
    ));
}

#[test]
fn trailing_insertions_batch_into_one_change() {
    let changes = list_changes(&["a"], &["a", "b", "c"]);
    assert_eq!(changes.len(), 1);
    assert!(matches!(
        &changes[0],
        Change::Insert { children, before: 1 } if children.len() == 2
    ));
}

#[test]
fn removal_at_the_front_is_a_keyed_removal() {
    let changes = list_changes(&["a", "b"], &["b"]);
    assert_eq!(changes.len(), 1);
    assert!(matches!(
        &changes[0],
        Change::RemoveKey { key, count: 1 } if key == "a"
    ));
}

#[test]
fn stale_copy_of_a_moved_key_is_skipped_without_double_counting() {
    // [a, b, c] -> [b, a, c]: one Move relocates b to the front. The walk
    // later reaches b's stale old position while c heads the new side; that
    // copy must be skipped, not moved or removed again.
    let changes = list_changes(&["a", "b", "c"], &["b", "a", "c"]);
    assert_eq!(changes.len(), 1);
    assert!(matches!(
        &changes[0],
        Change::Move { key, before: 0, count: 1 } if key == "b"
    ));
}

#[test]
fn siblings_after_a_skipped_stale_copy_keep_their_coordinates() {
    // Same reorder with a trailing text edit: skipping b's stale copy must
    // roll the offset back so the tail is still addressed correctly.
    let with_tail = |keys: &[&str], content: &str| -> Node {
        let mut children = vnode::keyed(
            keys.iter()
                .map(|key| ((*key).to_owned(), li(vec![], vec![text(*key)])))
                .collect(),
        );
        children.push(text(content));
        div(vec![], children)
    };
    let old = with_tail(&["a", "b", "c"], "tail");
    let new = with_tail(&["b", "a", "c"], "new-tail");

    let outcome = diff(EventTable::new(), &old, &new);
    let patch = &outcome.patch.children[0];
    assert_eq!(patch.changes.len(), 1);
    assert!(matches!(
        &patch.changes[0],
        Change::Move { key, before: 0, count: 1 } if key == "b"
    ));
    assert_eq!(patch.children.len(), 1);
    assert_eq!(patch.children[0].index, 3);
    assert!(matches!(
        &patch.children[0].changes[0],
        Change::ReplaceText { content } if content == "new-tail"
    ));
}

#[test]
fn trailing_stale_nodes_trim_via_the_removed_count() {
    let old: Node = div(vec![], vec![p(vec![], vec![]), p(vec![], vec![]), p(vec![], vec![])]);
    let new = div(vec![], vec![p(vec![], vec![])]);
    let outcome = diff(EventTable::new(), &old, &new);
    let patch = &outcome.patch.children[0];
    assert_eq!(patch.removed, 2);
    assert!(patch.changes.is_empty());
}

#[test]
fn trailing_trim_combines_with_an_in_place_text_edit() {
    // [a, b] -> [x]: the surviving slot is edited in place and the stale
    // trailing node is trimmed through the removed count, not a change.
    let old: Node = div(vec![], vec![text("a"), text("b")]);
    let new = div(vec![], vec![text("x")]);
    let outcome = diff(EventTable::new(), &old, &new);
    let patch = &outcome.patch.children[0];
    assert_eq!(patch.removed, 1);
    assert!(patch.changes.is_empty());
    assert_eq!(patch.children.len(), 1);
    assert_eq!(patch.children[0].index, 0);
    assert!(matches!(
        &patch.children[0].changes[0],
        Change::ReplaceText { content } if content == "x"
    ));
}

#[test]
fn unkeyed_kind_mismatch_replaces_in_place() {
    let old: Node = div(vec![], vec![text("plain")]);
    let new = div(vec![], vec![p(vec![], vec![text("wrapped")])]);
    let outcome = diff(EventTable::new(), &old, &new);
    let patch = &outcome.patch.children[0];
    assert_eq!(patch.changes.len(), 1);
    assert!(matches!(
        &patch.changes[0],
        Change::Replace {
            from: 0,
            count: 1,
            with: VNode::Element { tag, .. },
        } if tag == "p"
    ));
}

#[test]
fn replacement_after_an_insert_uses_old_tree_coordinates() {
    // [x(keyed), text] -> [y(keyed), x(keyed), other-text]: y inserts at
    // old coordinate 0, the text replacement still addresses old slot 1.
    let old: Node = div(
        vec![],
        vec![
            vnode::with_key(li(vec![], vec![]), "x"),
            text("before"),
        ],
    );
    let new = div(
        vec![],
        vec![
            vnode::with_key(li(vec![], vec![]), "y"),
            vnode::with_key(li(vec![], vec![]), "x"),
            text("after"),
        ],
    );
    let outcome = diff(EventTable::new(), &old, &new);
    let patch = &outcome.patch.children[0];
    assert!(matches!(
        &patch.changes[0],
        Change::Insert { before: 0, .. }
    ));
    // The text node is positionally matched, so its edit is a nested
    // ReplaceText patch at the new-tree index 2.
    assert_eq!(patch.children.len(), 1);
    assert_eq!(patch.children[0].index, 2);
    assert!(matches!(
        &patch.children[0].changes[0],
        Change::ReplaceText { content } if content == "after"
    ));
}

#[test]
fn text_edit_is_a_nested_replace_text() {
    let old: Node = div(vec![], vec![text("morning")]);
    let new = div(vec![], vec![text("evening")]);
    let outcome = diff(EventTable::new(), &old, &new);
    let inner = &outcome.patch.children[0].children[0];
    assert_eq!(inner.index, 0);
    assert!(matches!(
        &inner.changes[0],
        Change::ReplaceText { content } if content == "evening"
    ));
}

#[test]
fn quiet_subtrees_contribute_no_patches() {
    let old: Node = div(
        vec![],
        vec![
            div(vec![], vec![text("stable")]),
            div(vec![], vec![text("old")]),
        ],
    );
    let new = div(
        vec![],
        vec![
            div(vec![], vec![text("stable")]),
            div(vec![], vec![text("new")]),
        ],
    );
    let outcome = diff(EventTable::new(), &old, &new);
    let patch = &outcome.patch.children[0];
    // Only the changed child shows up, addressed by its index.
    assert_eq!(patch.children.len(), 1);
    assert_eq!(patch.children[0].index, 1);
}
