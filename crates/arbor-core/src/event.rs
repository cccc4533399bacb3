//! Event-listener attribute constructors and modifiers.
//!
//! `on("click", decoder)` builds an [`Attr::Event`]; the named helpers cover
//! the handful of events applications reach for daily. Input-family events
//! (`input`, `change`, focus/blur, `select`) are marked *immediate*: their
//! dispatch bypasses frame-aligned render batching so controlled inputs
//! never lag a keystroke behind the surface.

use crate::attribute::Attr;
use crate::decode::{self, Decoder};

/// Events whose dispatch forces a synchronous re-render.
pub const IMMEDIATE_EVENTS: [&str; 7] = [
    "input", "change", "focus", "focusin", "focusout", "blur", "select",
];

/// Whether `name` belongs to the immediate family.
#[inline]
#[must_use]
pub fn is_immediate_event(name: &str) -> bool {
    IMMEDIATE_EVENTS.contains(&name)
}

/// Listen for `name`, decoding the payload with `handler`.
pub fn on<Msg: 'static>(name: impl Into<String>, handler: Decoder<Msg>) -> Attr<Msg> {
    let name = name.into();
    let immediate = is_immediate_event(&name);
    Attr::Event {
        name,
        handler,
        include: Vec::new(),
        prevent_default: false,
        stop_propagation: false,
        immediate,
        debounce: 0,
        throttle: 0,
    }
}

/// Dispatch a fixed message on `click`.
pub fn on_click<Msg: Clone + 'static>(msg: Msg) -> Attr<Msg> {
    on("click", Decoder::succeed(msg))
}

/// Dispatch a fixed message on `mousedown`.
pub fn on_mouse_down<Msg: Clone + 'static>(msg: Msg) -> Attr<Msg> {
    on("mousedown", Decoder::succeed(msg))
}

/// Decode the input's current value on `input`.
pub fn on_input<Msg: 'static>(to_msg: impl Fn(String) -> Msg + 'static) -> Attr<Msg> {
    on(
        "input",
        Decoder::at(&["target", "value"], decode::string()).map(to_msg),
    )
}

/// Decode the control's checked state on `change`.
pub fn on_check<Msg: 'static>(to_msg: impl Fn(bool) -> Msg + 'static) -> Attr<Msg> {
    on(
        "change",
        Decoder::at(&["target", "checked"], decode::bool()).map(to_msg),
    )
}

/// Decode the pressed key on `keydown`.
pub fn on_keydown<Msg: 'static>(to_msg: impl Fn(String) -> Msg + 'static) -> Attr<Msg> {
    on("keydown", Decoder::field("key", decode::string()).map(to_msg))
}

/// Mark an event listener as preventing the surface default action.
#[must_use]
pub fn prevent_default<Msg>(attr: Attr<Msg>) -> Attr<Msg> {
    match attr {
        Attr::Event {
            prevent_default: _,
            name,
            handler,
            include,
            stop_propagation,
            immediate,
            debounce,
            throttle,
        } => Attr::Event {
            name,
            handler,
            include,
            prevent_default: true,
            stop_propagation,
            immediate,
            debounce,
            throttle,
        },
        other => other,
    }
}

/// Mark an event listener as stopping propagation.
#[must_use]
pub fn stop_propagation<Msg>(attr: Attr<Msg>) -> Attr<Msg> {
    match attr {
        Attr::Event {
            stop_propagation: _,
            name,
            handler,
            include,
            prevent_default,
            immediate,
            debounce,
            throttle,
        } => Attr::Event {
            name,
            handler,
            include,
            prevent_default,
            stop_propagation: true,
            immediate,
            debounce,
            throttle,
        },
        other => other,
    }
}

/// Delay dispatch until `ms` of quiet have elapsed since the last firing.
#[must_use]
pub fn debounce<Msg>(attr: Attr<Msg>, ms: u64) -> Attr<Msg> {
    match attr {
        Attr::Event {
            debounce: _,
            name,
            handler,
            include,
            prevent_default,
            stop_propagation,
            immediate,
            throttle,
        } => Attr::Event {
            name,
            handler,
            include,
            prevent_default,
            stop_propagation,
            immediate,
            debounce: ms,
            throttle,
        },
        other => other,
    }
}

/// Drop firings arriving within `ms` of the last accepted one.
#[must_use]
pub fn throttle<Msg>(attr: Attr<Msg>, ms: u64) -> Attr<Msg> {
    match attr {
        Attr::Event {
            throttle: _,
            name,
            handler,
            include,
            prevent_default,
            stop_propagation,
            immediate,
            debounce,
        } => Attr::Event {
            name,
            handler,
            include,
            prevent_default,
            stop_propagation,
            immediate,
            debounce,
            throttle: ms,
        },
        other => other,
    }
}

/// Restrict the payload fields forwarded to the decoder.
#[must_use]
pub fn include<Msg>(attr: Attr<Msg>, paths: Vec<String>) -> Attr<Msg> {
    match attr {
        Attr::Event {
            include: _,
            name,
            handler,
            prevent_default,
            stop_propagation,
            immediate,
            debounce,
            throttle,
        } => Attr::Event {
            name,
            handler,
            include: paths,
            prevent_default,
            stop_propagation,
            immediate,
            debounce,
            throttle,
        },
        other => other,
    }
}
