#![forbid(unsafe_code)]

//! Keyed tree diffing and event bookkeeping for Arbor.
//!
//! Given the previous and next virtual trees, [`diff`] produces a [`Patch`]
//! (a minimal edit script over surface nodes) and the updated [`EventTable`]
//! (the registry mapping structural paths to listener decoders). The two
//! travel together because structural edits are exactly the points where
//! listeners appear and disappear.

pub mod diff;
pub mod events;
pub mod patch;

pub use diff::{Diff, diff};
pub use events::{EventTable, Handler};
pub use patch::{Change, Patch};
