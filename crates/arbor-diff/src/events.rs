//! The event table: structural path × event name → registered handler.
//!
//! The table is threaded through the diff by value (persistent maps make
//! that cheap) and rebuilt incrementally as the diff proceeds: inserted
//! subtrees register their listeners, removed subtrees purge theirs.
//!
//! The table also remembers which paths dispatched an event. Two sets
//! rotate once per diff cycle: `dispatched_paths` always reflects the
//! *previous completed* cycle and backs controlled-input detection, while
//! `next_dispatched_paths` accumulates the cycle in progress.

use im::{HashMap, HashSet};
use serde_json::Value;

use arbor_core::decode::Decoded;
use arbor_core::{Attr, DecodeError, Decoder, Path, VNode};

/// A listener registered at one path.
pub struct Handler<Msg> {
    /// Decoder producing the message from the raw payload.
    pub decoder: Decoder<Msg>,
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

impl<Msg> Clone for Handler<Msg> {
    fn clone(&self) -> Self {
        Self {
            decoder: self.decoder.clone(),
            prevent_default: self.prevent_default,
            stop_propagation: self.stop_propagation,
        }
    }
}

impl<Msg> std::fmt::Debug for Handler<Msg> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler")
            .field("prevent_default", &self.prevent_default)
            .field("stop_propagation", &self.stop_propagation)
            .finish_non_exhaustive()
    }
}

/// Immutable-update event registry for one mounted tree.
pub struct EventTable<Msg> {
    handlers: HashMap<String, Handler<Msg>>,
    dispatched_paths: HashSet<String>,
    next_dispatched_paths: HashSet<String>,
}

impl<Msg> Clone for EventTable<Msg> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
            dispatched_paths: self.dispatched_paths.clone(),
            next_dispatched_paths: self.next_dispatched_paths.clone(),
        }
    }
}

impl<Msg> Default for EventTable<Msg> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Msg> std::fmt::Debug for EventTable<Msg> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTable")
            .field("handlers", &self.handlers.len())
            .field("dispatched_paths", &self.dispatched_paths.len())
            .field("next_dispatched_paths", &self.next_dispatched_paths.len())
            .finish()
    }
}

impl<Msg> EventTable<Msg> {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            dispatched_paths: HashSet::new(),
            next_dispatched_paths: HashSet::new(),
        }
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Rotate the dispatched-path sets. Called once per diff cycle so
    /// `dispatched_paths` always reflects the previous completed cycle.
    #[must_use]
    pub fn tick(self) -> Self {
        Self {
            handlers: self.handlers,
            dispatched_paths: self.next_dispatched_paths,
            next_dispatched_paths: HashSet::new(),
        }
    }

    /// Register (or re-point) the handler for `name` at `path`.
    #[must_use]
    pub fn add(mut self, path: &Path, name: &str, handler: Handler<Msg>) -> Self {
        self.handlers.insert(path.event(name), handler);
        self
    }

    /// Drop the handler for `name` at `path`.
    #[must_use]
    pub fn remove(mut self, path: &Path, name: &str) -> Self {
        self.handlers.remove(&path.event(name));
        self
    }

    /// Whether a handler exists for `name` at `path`.
    #[must_use]
    pub fn has(&self, path: &Path, name: &str) -> bool {
        self.handlers.contains_key(&path.event(name))
    }

    /// The `(prevent_default, stop_propagation)` flags of the handler at
    /// `path`/`name`, for the host to honor when it relays the event.
    #[must_use]
    pub fn flags(&self, path: &Path, name: &str) -> Option<(bool, bool)> {
        self.handlers
            .get(&path.event(name))
            .map(|handler| (handler.prevent_default, handler.stop_propagation))
    }

    /// Whether an event dispatched at or below `path` during the previous
    /// completed cycle (the controlled-input test).
    #[must_use]
    pub fn has_dispatched_path(&self, path: &Path) -> bool {
        path.matches_any(self.dispatched_paths.iter())
    }

    /// Look up the handler at `path`/`name` and run its decoder.
    ///
    /// Records the path into the building set regardless of decode success;
    /// a miss (no handler) records nothing and yields no error beyond `None`.
    #[must_use]
    pub fn handle(
        mut self,
        path: &Path,
        name: &str,
        payload: &Value,
    ) -> (Self, Option<Decoded<Msg>>) {
        match self.handlers.get(&path.event(name)) {
            Some(handler) => {
                let outcome = handler.decoder.run(payload);
                self.next_dispatched_paths.insert(path.to_key());
                (self, Some(outcome))
            }
            None => (self, None),
        }
    }

    /// Register every listener in `child`'s subtree.
    ///
    /// `index` is the child's surface index within the parent at `path`.
    /// Fragments are transparent: their children register under the parent
    /// path at successive indices, skipping the fragment anchor slot.
    #[must_use]
    pub fn add_child(self, path: &Path, index: usize, child: &VNode<Msg>) -> Self {
        match child {
            VNode::Element {
                key,
                attributes,
                children,
                ..
            } => {
                let child_path = path.add(index, key);
                let mut table = self.add_attrs(&child_path, attributes);
                table = table.add_children(&child_path, 0, children.iter());
                table
            }
            VNode::Fragment { children, .. } => {
                self.add_children(path, index + 1, children.iter())
            }
            VNode::Raw {
                key, attributes, ..
            } => {
                let child_path = path.add(index, key);
                self.add_attrs(&child_path, attributes)
            }
            VNode::Text { .. } => self,
        }
    }

    /// Register a run of siblings starting at surface index `from`.
    #[must_use]
    pub fn add_children<'a, I>(mut self, path: &Path, mut from: usize, children: I) -> Self
    where
        I: IntoIterator<Item = &'a VNode<Msg>>,
        Msg: 'a,
    {
        for child in children {
            self = self.add_child(path, from, child);
            from += child.advance();
        }
        self
    }

    /// Purge every listener in `child`'s subtree.
    #[must_use]
    pub fn remove_child(self, path: &Path, index: usize, child: &VNode<Msg>) -> Self {
        match child {
            VNode::Element {
                key,
                attributes,
                children,
                ..
            } => {
                let child_path = path.add(index, key);
                let mut table = self.remove_attrs(&child_path, attributes);
                table = table.remove_children(&child_path, 0, children.iter());
                table
            }
            VNode::Fragment { children, .. } => {
                self.remove_children(path, index + 1, children.iter())
            }
            VNode::Raw {
                key, attributes, ..
            } => {
                let child_path = path.add(index, key);
                self.remove_attrs(&child_path, attributes)
            }
            VNode::Text { .. } => self,
        }
    }

    /// Purge a run of siblings starting at surface index `from`.
    #[must_use]
    pub fn remove_children<'a, I>(mut self, path: &Path, mut from: usize, children: I) -> Self
    where
        I: IntoIterator<Item = &'a VNode<Msg>>,
        Msg: 'a,
    {
        for child in children {
            self = self.remove_child(path, from, child);
            from += child.advance();
        }
        self
    }

    fn add_attrs<'a, I>(mut self, path: &Path, attrs: I) -> Self
    where
        I: IntoIterator<Item = &'a Attr<Msg>>,
        Msg: 'a,
    {
        for attr in attrs {
            if let Attr::Event {
                name,
                handler,
                prevent_default,
                stop_propagation,
                ..
            } = attr
            {
                self = self.add(
                    path,
                    name,
                    Handler {
                        decoder: handler.clone(),
                        prevent_default: *prevent_default,
                        stop_propagation: *stop_propagation,
                    },
                );
            }
        }
        self
    }

    fn remove_attrs<'a, I>(mut self, path: &Path, attrs: I) -> Self
    where
        I: IntoIterator<Item = &'a Attr<Msg>>,
        Msg: 'a,
    {
        for attr in attrs {
            if let Attr::Event { name, .. } = attr {
                self = self.remove(path, name);
            }
        }
        self
    }
}

/// Convenience for tests and the runtime: a decode failure shaped like the
/// one a missing handler would never produce.
#[must_use]
pub fn no_handler_error(path: &Path, name: &str) -> DecodeError {
    DecodeError {
        expected: format!("a handler for \"{name}\""),
        found: "nothing registered".to_owned(),
        path: vec![path.to_key()],
    }
}
