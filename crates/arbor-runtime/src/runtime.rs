//! The runtime loop: model, view, diff, patch, repeat.
//!
//! A [`Runtime`] owns an application's model, the previous virtual tree,
//! the event table, and the reconciler bound to the mount point. Messages
//! are queued and drained strictly in arrival order by a worklist; nothing
//! in the loop recurses into `update`.
//!
//! Rendering is batched: ordinary dispatches mark the model dirty and
//! schedule one frame-aligned render; immediate dispatches (input-family
//! events, so controlled inputs never lag a keystroke) render synchronously
//! and invalidate any scheduled frame render through a render epoch
//! counter. Decode failures drop the dispatch and log at `debug`.

use std::collections::VecDeque;

use serde_json::Value;
use web_time::{Duration, Instant};

use arbor_core::{Path, VNode};
use arbor_diff::{EventTable, diff};
use arbor_dom::{DebounceToken, Document, EventResponse, Node, Reconciler, virtualise};

use crate::effect::{ActionContext, Effect, Thunk};
use crate::scheduler::Scheduler;

/// An Arbor application: a model plus the three pure-ish entrypoints.
pub trait App: Sized + 'static {
    type Msg: 'static;
    type Flags;

    fn init(flags: Self::Flags) -> (Self, Effect<Self::Msg>);
    fn update(&mut self, msg: Self::Msg) -> Effect<Self::Msg>;
    fn view(&self) -> VNode<Self::Msg>;
}

/// Why `start` refused to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    /// No document is available in this environment.
    NotABrowser,
    /// The selector matched nothing in the document.
    ElementNotFound { selector: String },
}

impl std::fmt::Display for StartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotABrowser => f.write_str("no document available in this environment"),
            Self::ElementNotFound { selector } => {
                write!(f, "no element matches selector {selector:?}")
            }
        }
    }
}

impl std::error::Error for StartError {}

/// Flags of the listener that saw an event, for the host to honor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchFlags {
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

enum Task<Msg> {
    /// A frame-aligned render; stale when the epoch has moved on.
    Render { epoch: u64 },
    /// A debounce quiet period elapsed.
    Debounce(DebounceToken),
    /// After-paint effect thunks.
    AfterPaint(Vec<Thunk<Msg>>),
}

/// A running application; the handle the host drives.
pub struct Runtime<A: App> {
    model: A,
    prev: VNode<A::Msg>,
    events: EventTable<A::Msg>,
    reconciler: Reconciler,
    scheduler: Scheduler<Task<A::Msg>>,
    queue: VecDeque<(A::Msg, bool)>,
    emitted: Vec<(String, Value)>,
    pending_before: Vec<Thunk<A::Msg>>,
    pending_after: Vec<Thunk<A::Msg>>,
    render_epoch: u64,
    render_scheduled: bool,
    dirty: bool,
    draining: bool,
}

impl<A: App> Runtime<A> {
    /// Mount an application onto the element `selector` matches.
    ///
    /// A non-empty mount point is virtualised first, so pre-rendered markup
    /// is adopted and reconciled instead of discarded. Headless hosts pass
    /// `None` and get [`StartError::NotABrowser`].
    pub fn start(
        document: Option<&Document>,
        selector: &str,
        flags: A::Flags,
    ) -> Result<Self, StartError> {
        let document = document.ok_or(StartError::NotABrowser)?;
        let root = document
            .query_selector(selector)
            .ok_or_else(|| StartError::ElementNotFound {
                selector: selector.to_owned(),
            })?;

        let (model, effect) = A::init(flags);
        let initial = model.view();
        let reconciler = Reconciler::new(root.clone(), 0);

        let events = match virtualise::<A::Msg>(&root) {
            Some(adopted) => {
                tracing::debug!(selector, "adopting pre-existing markup");
                let outcome = diff(EventTable::new(), &adopted, &initial);
                if let Err(error) = reconciler.push(&outcome.patch) {
                    tracing::error!(%error, "initial reconcile failed");
                }
                outcome.events
            }
            None => {
                reconciler.mount(&initial);
                EventTable::new().add_child(&Path::root(), 0, &initial)
            }
        };

        let mut runtime = Self {
            model,
            prev: initial,
            events,
            reconciler,
            scheduler: Scheduler::new(),
            queue: VecDeque::new(),
            emitted: Vec::new(),
            pending_before: Vec::new(),
            pending_after: Vec::new(),
            render_epoch: 0,
            render_scheduled: false,
            dirty: false,
            draining: false,
        };
        runtime.absorb(effect);
        // The mount itself counts as a paint for the init effect's phases.
        runtime.flush_paint_phases();
        runtime.pump(false);
        Ok(runtime)
    }

    /// The mount root on the surface.
    #[must_use]
    pub fn root(&self) -> Node {
        self.reconciler.root()
    }

    /// The current model, read-only.
    #[must_use]
    pub fn model(&self) -> &A {
        &self.model
    }

    /// Queue a message from the host; renders on the next frame tick.
    pub fn dispatch(&mut self, msg: A::Msg) {
        self.queue.push_back((msg, false));
        self.pump(false);
    }

    /// Events the application emitted for the host since the last call.
    #[must_use]
    pub fn take_emitted(&mut self) -> Vec<(String, Value)> {
        std::mem::take(&mut self.emitted)
    }

    /// Relay a raw surface event observed at `target`.
    ///
    /// Returns the matched listener's behavioral flags so the host can
    /// apply them, or `None` when nothing was listening.
    pub fn surface_event(
        &mut self,
        target: &Node,
        name: &str,
        payload: Value,
        now: Instant,
    ) -> Option<DispatchFlags> {
        match self.reconciler.event(target, name, payload, now) {
            EventResponse::Dispatch {
                path,
                name,
                payload,
                immediate,
            } => self.deliver(path, &name, &payload, immediate),
            EventResponse::Schedule { delay_ms, token } => {
                self.scheduler.schedule_timer(
                    now,
                    Duration::from_millis(delay_ms),
                    Task::Debounce(token),
                );
                None
            }
            EventResponse::Throttled {
                prevent_default,
                stop_propagation,
            } => Some(DispatchFlags {
                prevent_default,
                stop_propagation,
            }),
            EventResponse::Drop => None,
        }
    }

    /// Advance the scheduler: debounce deliveries, frame renders, and
    /// after-paint work that has come due at `now`.
    pub fn tick(&mut self, now: Instant) {
        for task in self.scheduler.tick(now) {
            match task {
                Task::Render { epoch } => {
                    if epoch == self.render_epoch && self.dirty {
                        self.render();
                    }
                }
                Task::Debounce(token) => {
                    if let Some(EventResponse::Dispatch {
                        path,
                        name,
                        payload,
                        immediate,
                    }) = self.reconciler.deliver(token)
                    {
                        let _ = self.deliver(path, &name, &payload, immediate);
                    }
                }
                Task::AfterPaint(thunks) => {
                    self.run_thunks(thunks);
                    self.pump(true);
                }
            }
        }
    }

    /// Whether the scheduler has pending work.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle() && self.queue.is_empty()
    }

    fn deliver(
        &mut self,
        path: Path,
        name: &str,
        payload: &Value,
        immediate: bool,
    ) -> Option<DispatchFlags> {
        let flags = self
            .events
            .flags(&path, name)
            .map(|(prevent_default, stop_propagation)| DispatchFlags {
                prevent_default,
                stop_propagation,
            });
        let (events, outcome) = std::mem::take(&mut self.events).handle(&path, name, payload);
        self.events = events;
        match outcome {
            Some(Ok(msg)) => {
                self.queue.push_back((msg, immediate));
                self.pump(false);
            }
            Some(Err(errors)) => {
                tracing::debug!(%path, name, ?errors, "dropping undecodable event");
            }
            None => {}
        }
        flags
    }

    /// Drain the message queue; render synchronously when asked to (or when
    /// any drained message was immediate), otherwise schedule one frame
    /// render.
    fn pump(&mut self, force_render: bool) {
        if self.draining {
            return;
        }
        self.draining = true;
        let mut render_now = force_render;
        loop {
            while let Some((msg, immediate)) = self.queue.pop_front() {
                let effect = self.model.update(msg);
                self.absorb(effect);
                self.dirty = true;
                render_now |= immediate;
            }
            if render_now && self.dirty {
                self.render();
                render_now = false;
                // Before-paint thunks may have queued more messages.
                if !self.queue.is_empty() {
                    continue;
                }
            }
            break;
        }
        if self.dirty {
            self.schedule_render();
        }
        self.draining = false;
    }

    fn schedule_render(&mut self) {
        if self.render_scheduled {
            return;
        }
        self.render_scheduled = true;
        self.scheduler.request_frame(Task::Render {
            epoch: self.render_epoch,
        });
    }

    fn render(&mut self) {
        // Invalidates any scheduled frame render.
        self.render_epoch += 1;
        self.render_scheduled = false;
        self.dirty = false;

        let next = self.model.view();
        let events = std::mem::take(&mut self.events).tick();
        let outcome = diff(events, &self.prev, &next);
        self.events = outcome.events;
        if let Err(error) = self.reconciler.push(&outcome.patch) {
            tracing::error!(%error, "patch failed to apply");
        }
        self.prev = next;
        self.flush_paint_phases();
    }

    fn flush_paint_phases(&mut self) {
        let before = std::mem::take(&mut self.pending_before);
        self.run_thunks(before);
        let after = std::mem::take(&mut self.pending_after);
        if !after.is_empty() {
            self.scheduler.enqueue_microtask(Task::AfterPaint(after));
        }
    }

    fn absorb(&mut self, effect: Effect<A::Msg>) {
        self.run_thunks(effect.synchronous);
        self.pending_before.extend(effect.before_paint);
        self.pending_after.extend(effect.after_paint);
    }

    fn run_thunks(&mut self, thunks: Vec<Thunk<A::Msg>>) {
        if thunks.is_empty() {
            return;
        }
        let mut staged: Vec<(A::Msg, bool)> = Vec::new();
        {
            let mut ctx = ActionContext {
                messages: &mut staged,
                emitted: &mut self.emitted,
                root: self.reconciler.root(),
            };
            for thunk in thunks {
                thunk(&mut ctx);
            }
        }
        self.queue.extend(staged);
    }
}
