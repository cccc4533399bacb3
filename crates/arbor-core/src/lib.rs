#![forbid(unsafe_code)]

//! Virtual node model, attributes, and event decoders for Arbor.
//!
//! This crate is the vocabulary the rest of the runtime speaks:
//!
//! - [`vnode`] — the immutable virtual tree (element / text / fragment /
//!   raw-markup), built on persistent vectors and maps so unchanged subtrees
//!   are shared by reference across renders.
//! - [`attribute`] — attributes, properties, and event listeners, plus the
//!   normalization pass that makes attribute lists diffable.
//! - [`event`] — listener constructors and debounce/throttle modifiers.
//! - [`decode`] — composable decoders that turn dynamic event payloads into
//!   typed messages, failing softly with structured errors.
//! - [`path`] — structural addresses used as event-table identities.
//! - [`html`] — constructor sugar for common elements.

pub mod attribute;
pub mod decode;
pub mod event;
pub mod html;
pub mod path;
pub mod vnode;

pub use attribute::Attr;
pub use decode::{DecodeError, DecodeErrors, Decoder};
pub use path::Path;
pub use vnode::VNode;
