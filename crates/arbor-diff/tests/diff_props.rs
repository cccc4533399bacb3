//! Property tests for the diff engine.
//!
//! The keyed properties replay the emitted changes against a model of the
//! surface (a flat list of keys) and check the result matches the target
//! ordering regardless of the permutation.

use proptest::prelude::*;

use arbor_core::Attr;
use arbor_core::attribute::{attribute, class, id};
use arbor_core::html::{div, li, span, text, ul};
use arbor_core::vnode::{self, VNode};
use arbor_diff::{Change, EventTable, diff};

type Msg = ();
type Node = VNode<Msg>;

fn keyed_list(keys: &[String]) -> Node {
    ul(
        vec![],
        vnode::keyed(
            keys.iter()
                .map(|key| (key.clone(), li(vec![], vec![text(key.clone())])))
                .collect(),
        ),
    )
}

/// Replay a change list against a flat key model of the `ul`'s children.
fn replay(surface: &mut Vec<String>, changes: &[Change<Msg>], removed: usize) {
    for change in changes {
        match change {
            Change::Move { key, before, count } => {
                assert_eq!(*count, 1, "list items span one slot");
                let at = surface
                    .iter()
                    .position(|k| k == key)
                    .expect("moved key must be on the surface");
                let node = surface.remove(at);
                surface.insert(*before, node);
            }
            Change::RemoveKey { key, .. } => {
                let at = surface
                    .iter()
                    .position(|k| k == key)
                    .expect("removed key must be on the surface");
                surface.remove(at);
            }
            Change::Insert { children, before } => {
                for (offset, child) in children.iter().enumerate() {
                    surface.insert(before + offset, child.key().to_owned());
                }
            }
            Change::Replace { from, count, with } => {
                surface.splice(*from..*from + *count, [with.key().to_owned()]);
            }
            Change::Remove { from, count } => {
                surface.drain(*from..*from + *count);
            }
            other => panic!("keyed list diffs never emit {other:?}"),
        }
    }
    surface.truncate(surface.len() - removed);
}

/// Distinct keys drawn from a small alphabet, in arbitrary order.
fn key_lists() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    let pool: Vec<String> = ('a'..='h').map(|c| c.to_string()).collect();
    let subset = || proptest::sample::subsequence(pool.clone(), 0..=8).prop_shuffle();
    (subset(), subset())
}

fn attr_sets() -> impl Strategy<Value = Vec<Attr<Msg>>> {
    proptest::sample::subsequence(
        vec![
            class("wide"),
            class("tall"),
            id("anchor"),
            attribute("title", "hint"),
            attribute("lang", "en"),
        ],
        0..=3,
    )
}

/// Arbitrary trees over the whole node grammar: text, attributed elements,
/// fragments (nested), and keyed element lists.
fn trees() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        "[a-z]{1,6}".prop_map(|content| -> Node { text(content) }),
        attr_sets().prop_map(|attrs| -> Node { span(attrs, vec![]) }),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        let key_pool: Vec<String> = ('a'..='f').map(|c| c.to_string()).collect();
        prop_oneof![
            (attr_sets(), prop::collection::vec(inner.clone(), 0..4))
                .prop_map(|(attrs, children)| div(attrs, children)),
            prop::collection::vec(inner.clone(), 0..4).prop_map(vnode::fragment),
            (
                proptest::sample::subsequence(key_pool, 0..=4).prop_shuffle(),
                prop::collection::vec(inner, 4),
            )
                .prop_map(|(keys, pool)| {
                    ul(
                        vec![],
                        keys.into_iter()
                            .zip(pool)
                            .map(|(key, child)| {
                                vnode::with_key(li(vec![], vec![child]), key)
                            })
                            .collect(),
                    )
                }),
        ]
    })
}

proptest! {
    #[test]
    fn diffing_a_tree_against_itself_is_empty((old, _) in key_lists()) {
        let tree = keyed_list(&old);
        let outcome = diff(EventTable::new(), &tree, &tree);
        prop_assert!(outcome.patch.is_empty());
    }

    #[test]
    fn diffing_any_generated_tree_against_itself_is_empty(tree in trees()) {
        let root = div(vec![], vec![tree]);
        let outcome = diff(EventTable::new(), &root, &root);
        prop_assert!(outcome.patch.is_empty());
    }

    #[test]
    fn replaying_changes_reaches_the_target_ordering((old, new) in key_lists()) {
        let old_tree = keyed_list(&old);
        let new_tree = keyed_list(&new);
        let outcome = diff(EventTable::new(), &old_tree, &new_tree);

        let mut surface = old.clone();
        if let Some(patch) = outcome.patch.children.first() {
            replay(&mut surface, &patch.changes, patch.removed);
        }
        prop_assert_eq!(surface, new);
    }

    #[test]
    fn reverse_then_forward_round_trips((old, new) in key_lists()) {
        let old_tree = keyed_list(&old);
        let new_tree = keyed_list(&new);

        let forward = diff(EventTable::new(), &old_tree, &new_tree);
        let backward = diff(forward.events, &new_tree, &old_tree);

        let mut surface = new.clone();
        if let Some(patch) = backward.patch.children.first() {
            replay(&mut surface, &patch.changes, patch.removed);
        }
        prop_assert_eq!(surface, old);
    }
}
