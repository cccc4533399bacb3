#![forbid(unsafe_code)]

//! Rendering surface and reconciler for Arbor.
//!
//! - [`node`] — the in-memory surface: shared-mutable node handles with
//!   parent links, attributes, properties, listeners, and the reconciler's
//!   per-node bookkeeping (keys, keyed index, debounce/throttle state).
//! - [`reconciler`] — mounts virtual trees, replays patches, and turns raw
//!   surface events into dispatch decisions (immediate, scheduled, or
//!   dropped).
//! - [`virtualise`] — adopts pre-existing markup into an initial virtual
//!   tree when mounting onto a non-empty node.

pub mod node;
pub mod reconciler;
pub mod virtualise;

pub use node::{Document, KEY_ATTRIBUTE, ListenerConfig, Node};
pub use reconciler::{DebounceToken, EventResponse, ReconcileError, Reconciler};
pub use virtualise::virtualise;
