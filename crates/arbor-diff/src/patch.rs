//! The edit script produced by diffing.
//!
//! A [`Patch`] describes edits local to one surface node: an ordered list of
//! [`Change`]s against its child list and attributes, a count of stale
//! trailing children to trim, and nested patches for structurally-unchanged
//! descendants that contain changed descendants.
//!
//! # Index coordinates
//!
//! `changes` are stored in application order. Each index-bearing change
//! (`Insert`, `Remove`, `Replace`, `Move`'s `before`) addresses the child
//! list *as it stood before this patch's changes began*, i.e. old-tree
//! coordinates: the diff engine emits changes walking left to right and the
//! stored order is the reverse, so rightward edits apply first and never
//! invalidate the indices of edits to their left. `children` patches address
//! the child list *after* changes and trailing trim, i.e. new-tree indices.

use arbor_core::VNode;

/// Edits local to one surface node.
pub struct Patch<Msg> {
    /// This node's index among its parent's children (new-tree coordinates).
    pub index: usize,
    /// Stale trailing children to remove after `changes` apply.
    pub removed: usize,
    /// Structural and attribute edits, in application order.
    pub changes: Vec<Change<Msg>>,
    /// Nested patches, ascending by `index`.
    pub children: Vec<Patch<Msg>>,
}

impl<Msg> Patch<Msg> {
    /// A patch with no effect at `index`.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            removed: 0,
            changes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Whether applying this patch would do nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed == 0 && self.changes.is_empty() && self.children.is_empty()
    }
}

impl<Msg> std::fmt::Debug for Patch<Msg> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Patch")
            .field("index", &self.index)
            .field("removed", &self.removed)
            .field("changes", &self.changes)
            .field("children", &self.children)
            .finish()
    }
}

/// One structural or attribute edit.
pub enum Change<Msg> {
    /// Replace the text content of this (text) node.
    ReplaceText { content: String },
    /// Replace the opaque inner markup of this (raw) node.
    ReplaceInnerHtml { inner_html: String },
    /// Add and remove attributes on this node.
    Update {
        added: Vec<arbor_core::Attr<Msg>>,
        removed: Vec<arbor_core::Attr<Msg>>,
    },
    /// Move the keyed child (and its `count` surface slots) before `before`.
    Move {
        key: String,
        before: usize,
        count: usize,
    },
    /// Remove the keyed child and its `count` surface slots.
    RemoveKey { key: String, count: usize },
    /// Remove `count` children starting at `from`.
    Remove { from: usize, count: usize },
    /// Replace `count` children starting at `from` with a fresh subtree.
    Replace {
        from: usize,
        count: usize,
        with: VNode<Msg>,
    },
    /// Insert fresh subtrees before `before`.
    Insert {
        children: Vec<VNode<Msg>>,
        before: usize,
    },
}

impl<Msg> std::fmt::Debug for Change<Msg> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReplaceText { content } => {
                f.debug_struct("ReplaceText").field("content", content).finish()
            }
            Self::ReplaceInnerHtml { inner_html } => f
                .debug_struct("ReplaceInnerHtml")
                .field("inner_html", inner_html)
                .finish(),
            Self::Update { added, removed } => f
                .debug_struct("Update")
                .field("added", added)
                .field("removed", removed)
                .finish(),
            Self::Move { key, before, count } => f
                .debug_struct("Move")
                .field("key", key)
                .field("before", before)
                .field("count", count)
                .finish(),
            Self::RemoveKey { key, count } => f
                .debug_struct("RemoveKey")
                .field("key", key)
                .field("count", count)
                .finish(),
            Self::Remove { from, count } => f
                .debug_struct("Remove")
                .field("from", from)
                .field("count", count)
                .finish(),
            Self::Replace { from, count, with } => f
                .debug_struct("Replace")
                .field("from", from)
                .field("count", count)
                .field("with", with)
                .finish(),
            Self::Insert { children, before } => f
                .debug_struct("Insert")
                .field("children", children)
                .field("before", before)
                .finish(),
        }
    }
}
