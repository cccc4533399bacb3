#![forbid(unsafe_code)]

//! Bag-of-orbs: a small push-your-luck game built on the Arbor runtime.
//!
//! The model draws orbs from a shrinking bag; point orbs score through a
//! multiplier, damage orbs cost health, and the run ends on an empty bag or
//! zero health. It exists to exercise the full stack: keyed lists for the
//! draw log, click handlers, and screen swaps that replace whole subtrees.

pub mod game;
pub mod view;

pub use game::{Config, Draw, Game, Msg, Orb, Screen};
