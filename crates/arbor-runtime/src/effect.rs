//! Managed side effects.
//!
//! An [`Effect`] is what `init` and `update` hand back besides the model:
//! lists of thunks the runtime runs at defined points of the render cycle.
//! `synchronous` thunks run while the message queue drains, `before_paint`
//! thunks run right after a patch lands (same tick), `after_paint` thunks
//! run as a microtask afterwards.
//!
//! Thunks talk back through an [`ActionContext`]: dispatching messages
//! (queued, never recursive), emitting named host events, and reaching the
//! mount root.

use serde_json::Value;

use arbor_dom::Node;

/// A deferred action with runtime access.
pub type Thunk<Msg> = Box<dyn FnOnce(&mut ActionContext<Msg>)>;

/// What an effect thunk is allowed to do.
pub struct ActionContext<'a, Msg> {
    pub(crate) messages: &'a mut Vec<(Msg, bool)>,
    pub(crate) emitted: &'a mut Vec<(String, Value)>,
    pub(crate) root: Node,
}

impl<Msg> ActionContext<'_, Msg> {
    /// Queue `msg` for the runtime. `immediate` forces a synchronous
    /// render once the queue drains.
    pub fn dispatch(&mut self, msg: Msg, immediate: bool) {
        self.messages.push((msg, immediate));
    }

    /// Emit a named event for the host embedding the application.
    pub fn emit(&mut self, name: impl Into<String>, data: Value) {
        self.emitted.push((name.into(), data));
    }

    /// The mount root on the surface.
    #[must_use]
    pub fn root(&self) -> Node {
        self.root.clone()
    }
}

/// Side effects returned from `init` and `update`.
pub struct Effect<Msg> {
    pub(crate) synchronous: Vec<Thunk<Msg>>,
    pub(crate) before_paint: Vec<Thunk<Msg>>,
    pub(crate) after_paint: Vec<Thunk<Msg>>,
}

impl<Msg> Default for Effect<Msg> {
    fn default() -> Self {
        Self::none()
    }
}

impl<Msg> std::fmt::Debug for Effect<Msg> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("synchronous", &self.synchronous.len())
            .field("before_paint", &self.before_paint.len())
            .field("after_paint", &self.after_paint.len())
            .finish()
    }
}

impl<Msg> Effect<Msg> {
    /// No effect.
    #[must_use]
    pub fn none() -> Self {
        Self {
            synchronous: Vec::new(),
            before_paint: Vec::new(),
            after_paint: Vec::new(),
        }
    }

    /// Run `thunk` while the message queue drains.
    #[must_use]
    pub fn from(thunk: impl FnOnce(&mut ActionContext<Msg>) + 'static) -> Self {
        Self {
            synchronous: vec![Box::new(thunk)],
            before_paint: Vec::new(),
            after_paint: Vec::new(),
        }
    }

    /// Run `thunk` right after the next patch lands, inside the same tick.
    #[must_use]
    pub fn before_paint(thunk: impl FnOnce(&mut ActionContext<Msg>) + 'static) -> Self {
        Self {
            synchronous: Vec::new(),
            before_paint: vec![Box::new(thunk)],
            after_paint: Vec::new(),
        }
    }

    /// Run `thunk` as a microtask after the next patch lands.
    #[must_use]
    pub fn after_paint(thunk: impl FnOnce(&mut ActionContext<Msg>) + 'static) -> Self {
        Self {
            synchronous: Vec::new(),
            before_paint: Vec::new(),
            after_paint: vec![Box::new(thunk)],
        }
    }

    /// Queue a message as an effect.
    #[must_use]
    pub fn dispatch(msg: Msg) -> Self
    where
        Msg: 'static,
    {
        Self::from(move |ctx| ctx.dispatch(msg, false))
    }

    /// Combine several effects, preserving per-phase order.
    #[must_use]
    pub fn batch(effects: impl IntoIterator<Item = Self>) -> Self {
        let mut out = Self::none();
        for effect in effects {
            out.synchronous.extend(effect.synchronous);
            out.before_paint.extend(effect.before_paint);
            out.after_paint.extend(effect.after_paint);
        }
        out
    }

    /// Whether this effect does anything at all.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.synchronous.is_empty() && self.before_paint.is_empty() && self.after_paint.is_empty()
    }

    /// Rewrite the message type, for embedding child components.
    #[must_use]
    pub fn map<NewMsg, F>(self, f: F) -> Effect<NewMsg>
    where
        Msg: 'static,
        NewMsg: 'static,
        F: Fn(Msg) -> NewMsg + Clone + 'static,
    {
        Effect {
            synchronous: map_thunks(self.synchronous, f.clone()),
            before_paint: map_thunks(self.before_paint, f.clone()),
            after_paint: map_thunks(self.after_paint, f),
        }
    }
}

fn map_thunks<Msg, NewMsg, F>(thunks: Vec<Thunk<Msg>>, f: F) -> Vec<Thunk<NewMsg>>
where
    Msg: 'static,
    NewMsg: 'static,
    F: Fn(Msg) -> NewMsg + Clone + 'static,
{
    thunks
        .into_iter()
        .map(|thunk| -> Thunk<NewMsg> {
            let f = f.clone();
            Box::new(move |ctx: &mut ActionContext<NewMsg>| {
                let mut messages: Vec<(Msg, bool)> = Vec::new();
                let mut inner = ActionContext {
                    messages: &mut messages,
                    emitted: ctx.emitted,
                    root: ctx.root.clone(),
                };
                thunk(&mut inner);
                for (msg, immediate) in messages {
                    ctx.messages.push((f(msg), immediate));
                }
            })
        })
        .collect()
}
