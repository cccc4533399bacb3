//! Property tests: for arbitrary tree transitions, pushing the diffed patch
//! leaves the surface identical to a fresh mount of the target tree.

use proptest::prelude::*;

use arbor_core::attribute::{attribute, class, id};
use arbor_core::html::{div, li, span, text, ul};
use arbor_core::vnode::{self};
use arbor_core::{Attr, VNode};
use arbor_diff::{EventTable, diff};
use arbor_dom::{Document, Reconciler};

type Msg = ();

fn keyed_list(keys: &[String]) -> VNode<Msg> {
    ul(
        vec![],
        vnode::keyed(
            keys.iter()
                .map(|key| (key.clone(), li(vec![], vec![text(key.clone())])))
                .collect(),
        ),
    )
}

fn mount(tree: &VNode<Msg>) -> (Document, Reconciler) {
    let doc = Document::new();
    let rec = Reconciler::new(doc.body(), 0);
    rec.mount(tree);
    (doc, rec)
}

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

/// Arbitrary trees mixing text, attributed elements, nested fragments, and
/// keyed element lists. Markup comparison is order-safe: a node stores its
/// attributes name-sorted, so patched and fresh surfaces serialize alike.
fn trees() -> impl Strategy<Value = VNode<Msg>> {
    let leaf = prop_oneof![
        "[a-z]{1,6}".prop_map(|content| -> VNode<Msg> { text(content) }),
        attr_sets().prop_map(|attrs| -> VNode<Msg> { span(attrs, vec![]) }),
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
    fn patched_surface_matches_fresh_mount((old, new) in key_lists()) {
        let old_tree = keyed_list(&old);
        let new_tree = keyed_list(&new);

        let (doc, rec) = mount(&old_tree);
        let outcome = diff(EventTable::new(), &old_tree, &new_tree);
        rec.push(&outcome.patch).expect("patch must apply cleanly");

        let (want, _) = mount(&new_tree);
        prop_assert_eq!(doc.body().to_markup(), want.body().to_markup());
    }

    #[test]
    fn any_tree_transition_matches_a_fresh_mount((old, new) in (trees(), trees())) {
        let old_tree = div(vec![], vec![old]);
        let new_tree = div(vec![], vec![new]);

        let (doc, rec) = mount(&old_tree);
        let outcome = diff(EventTable::new(), &old_tree, &new_tree);
        rec.push(&outcome.patch).expect("patch must apply cleanly");

        let (want, _) = mount(&new_tree);
        prop_assert_eq!(doc.body().to_markup(), want.body().to_markup());
    }

    #[test]
    fn surviving_keys_keep_their_surface_nodes((old, new) in key_lists()) {
        let old_tree = keyed_list(&old);
        let new_tree = keyed_list(&new);

        let (doc, rec) = mount(&old_tree);
        let list = doc.body().child_at(0).expect("ul must be mounted");
        let before: Vec<(String, arbor_dom::Node)> = list
            .children()
            .into_iter()
            .map(|node| (node.key(), node))
            .collect();

        let outcome = diff(EventTable::new(), &old_tree, &new_tree);
        rec.push(&outcome.patch).expect("patch must apply cleanly");

        for (key, node) in before {
            if new.contains(&key) {
                let survivor = list.keyed_child(&key).expect("surviving key present");
                prop_assert_eq!(survivor, node);
            }
        }
    }
}
