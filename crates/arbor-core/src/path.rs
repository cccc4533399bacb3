//! Structural addresses for nodes in a virtual tree.
//!
//! A [`Path`] names a node by the route from the mount root down to it: at
//! each level either the child's stable key (when it has one) or its surface
//! index among its siblings. Paths are reverse-linked so that extending a
//! path while walking down the tree is O(1) and shares the parent spine.
//!
//! Paths only become strings at event-registration and lookup time. Each
//! segment kind is prefixed with a distinct separator byte so a literal key
//! can never collide with an index: `"1"` the key and `1` the index produce
//! different strings.

use std::fmt;
use std::rc::Rc;

/// Separator preceding an index segment.
pub const SEPARATOR_INDEX: char = '\u{1}';
/// Separator preceding a key segment.
pub const SEPARATOR_KEY: char = '\u{2}';
/// Separator between a node path and an event name.
pub const SEPARATOR_EVENT: char = '\u{3}';

/// A reverse-linked structural address.
///
/// Cloning is cheap: segments are shared through `Rc`.
#[derive(Debug, Clone)]
pub enum Path {
    /// The mount root.
    Root,
    /// A keyed child of `parent`.
    Key { parent: Rc<Path>, key: String },
    /// A positional child of `parent`.
    Index { parent: Rc<Path>, index: usize },
}

impl Path {
    /// The root path.
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self::Root
    }

    /// Extend this path with one child segment.
    ///
    /// A non-empty `key` takes precedence over the positional `index`.
    #[must_use]
    pub fn add(&self, index: usize, key: &str) -> Self {
        let parent = Rc::new(self.clone());
        if key.is_empty() {
            Self::Index { parent, index }
        } else {
            Self::Key {
                parent,
                key: key.to_owned(),
            }
        }
    }

    /// Render the path as its string identity.
    #[must_use]
    pub fn to_key(&self) -> String {
        let mut out = String::new();
        self.write(&mut out);
        out
    }

    /// The event-table key for `event` fired at this node.
    #[must_use]
    pub fn event(&self, event: &str) -> String {
        let mut out = self.to_key();
        out.push(SEPARATOR_EVENT);
        out.push_str(event);
        out
    }

    /// Whether any candidate identity sits at or below this path.
    ///
    /// Used for controlled-input detection: a form control is controlled
    /// when some previously-dispatched path lies within its subtree.
    #[must_use]
    pub fn matches_any<'a, I>(&self, candidates: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        let prefix = self.to_key();
        candidates.into_iter().any(|candidate| {
            candidate == &prefix
                || (candidate.starts_with(&prefix)
                    && candidate[prefix.len()..].starts_with(is_separator))
        })
    }

    fn write(&self, out: &mut String) {
        match self {
            Self::Root => {}
            Self::Key { parent, key } => {
                parent.write(out);
                out.push(SEPARATOR_KEY);
                out.push_str(key);
            }
            Self::Index { parent, index } => {
                parent.write(out);
                out.push(SEPARATOR_INDEX);
                out.push_str(&index.to_string());
            }
        }
    }
}

fn is_separator(c: char) -> bool {
    c == SEPARATOR_INDEX || c == SEPARATOR_KEY || c == SEPARATOR_EVENT
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_key())
    }
}
