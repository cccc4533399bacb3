//! Fragment diffing: anchor-offset numbering, change splicing into the
//! parent, and explicit removal of a shrinking fragment's stale slots.

use arbor_core::html::{div, text};
use arbor_core::vnode::{self, VNode};
use arbor_diff::{Change, EventTable, diff};

type Msg = ();
type Node = VNode<Msg>;

fn frag(children: Vec<Node>) -> Node {
    vnode::fragment(children)
}

#[test]
fn fragment_shrink_becomes_an_explicit_remove_in_the_parent() {
    // Surface: [anchor, "a", "b", "tail"] -> [anchor, "a", "tail"].
    let old = div(vec![], vec![frag(vec![text("a"), text("b")]), text("tail")]);
    let new = div(vec![], vec![frag(vec![text("a")]), text("tail")]);
    let outcome = diff(EventTable::new(), &old, &new);
    let patch = &outcome.patch.children[0];
    assert_eq!(patch.changes.len(), 1);
    assert!(matches!(
        &patch.changes[0],
        Change::Remove { from: 2, count: 1 }
    ));
    // The removal lives in the parent's change list; nothing is attributed
    // to a fragment node, which has no surface element of its own.
    assert_eq!(patch.removed, 0);
}

#[test]
fn fragment_growth_inserts_past_the_anchor() {
    // Surface: [anchor, "a", "tail"] -> [anchor, "a", "b", "tail"].
    let old = div(vec![], vec![frag(vec![text("a")]), text("tail")]);
    let new = div(vec![], vec![frag(vec![text("a"), text("b")]), text("tail")]);
    let outcome = diff(EventTable::new(), &old, &new);
    let patch = &outcome.patch.children[0];
    assert_eq!(patch.changes.len(), 1);
    assert!(matches!(
        &patch.changes[0],
        Change::Insert { children, before: 2 } if children.len() == 1
    ));
}

#[test]
fn fragment_child_edits_flatten_into_the_parent() {
    let old = div(vec![], vec![frag(vec![text("x"), text("y")])]);
    let new = div(vec![], vec![frag(vec![text("x"), text("z")])]);
    let outcome = diff(EventTable::new(), &old, &new);
    let patch = &outcome.patch.children[0];
    assert!(patch.changes.is_empty());
    // The edited text is addressed by its flat surface index: anchor at 0,
    // "x" at 1, "y" at 2.
    assert_eq!(patch.children.len(), 1);
    assert_eq!(patch.children[0].index, 2);
    assert!(matches!(
        &patch.children[0].changes[0],
        Change::ReplaceText { content } if content == "z"
    ));
}

#[test]
fn siblings_after_a_shrinking_fragment_keep_correct_coordinates() {
    // The fragment loses one slot; the trailing text also changes. Its
    // nested patch must use new-tree numbering while the Remove uses
    // old-tree numbering.
    let old = div(
        vec![],
        vec![frag(vec![text("a"), text("b")]), text("old-tail")],
    );
    let new = div(vec![], vec![frag(vec![text("a")]), text("new-tail")]);
    let outcome = diff(EventTable::new(), &old, &new);
    let patch = &outcome.patch.children[0];
    assert!(matches!(
        &patch.changes[0],
        Change::Remove { from: 2, count: 1 }
    ));
    // New surface: [anchor, "a", tail] so the tail patch sits at index 2.
    assert_eq!(patch.children.len(), 1);
    assert_eq!(patch.children[0].index, 2);
    assert!(matches!(
        &patch.children[0].changes[0],
        Change::ReplaceText { content } if content == "new-tail"
    ));
}

#[test]
fn keyed_fragments_move_as_a_block() {
    // Two keyed fragments swap; the move must carry every surface slot the
    // fragment occupies, anchor included.
    let old = div(
        vec![],
        vec![
            vnode::with_key(frag(vec![text("1"), text("2")]), "first"),
            vnode::with_key(frag(vec![text("3")]), "second"),
        ],
    );
    let new = div(
        vec![],
        vec![
            vnode::with_key(frag(vec![text("3")]), "second"),
            vnode::with_key(frag(vec![text("1"), text("2")]), "first"),
        ],
    );
    let outcome = diff(EventTable::new(), &old, &new);
    let patch = &outcome.patch.children[0];
    assert_eq!(patch.changes.len(), 1);
    // "second" spans its anchor plus one child: two slots.
    assert!(matches!(
        &patch.changes[0],
        Change::Move { key, before: 0, count: 2 } if key == "second"
    ));
}

#[test]
fn nested_fragment_slots_count_recursively() {
    let nested = frag(vec![text("p"), text("q")]);
    let outer = vnode::with_key(frag(vec![text("lead"), nested]), "block");
    // The nested fragment occupies its own anchor plus two children
    // (advance 3), so the outer counts 1 + 3 = 4 child slots and spans
    // 1 + 4 = 5 with its own anchor.
    assert_eq!(outer.advance(), 5);
}

#[test]
fn sibling_after_a_nested_fragment_is_addressed_past_both_anchors() {
    // Surface: [anchor, "a", anchor, "p", "q", tail]; the tail sits at
    // index 5 only if the nested fragment's anchor is counted.
    let old = div(
        vec![],
        vec![
            frag(vec![text("a"), frag(vec![text("p"), text("q")])]),
            text("tail"),
        ],
    );
    let new = div(
        vec![],
        vec![
            frag(vec![text("a"), frag(vec![text("p"), text("q")])]),
            text("new-tail"),
        ],
    );
    let outcome = diff(EventTable::new(), &old, &new);
    let patch = &outcome.patch.children[0];
    assert!(patch.changes.is_empty());
    assert_eq!(patch.children.len(), 1);
    assert_eq!(patch.children[0].index, 5);
    assert!(matches!(
        &patch.children[0].changes[0],
        Change::ReplaceText { content } if content == "new-tail"
    ));
}
