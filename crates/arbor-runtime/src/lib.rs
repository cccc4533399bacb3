#![forbid(unsafe_code)]

//! The Arbor runtime: scheduler, effects, and the render loop.
//!
//! Applications implement [`App`] (`init` / `update` / `view`) and are
//! driven by a [`Runtime`] bound to a surface node. The host feeds it raw
//! surface events and clock ticks; the runtime keeps the surface in sync
//! with `view` through the diff engine and reconciler, batching renders to
//! frame boundaries except where immediate events demand otherwise.

pub mod effect;
pub mod runtime;
pub mod scheduler;

pub use effect::{ActionContext, Effect};
pub use runtime::{App, DispatchFlags, Runtime, StartError};
pub use scheduler::{Scheduler, TimerHandle};
