//! Element attributes, properties, and event listeners.
//!
//! An [`Attr`] is one entry in an element's attribute list. Plain attributes
//! map to surface attributes and compare by string equality; properties map
//! to in-memory surface properties and compare by deep (structural) equality;
//! events register a decoder in the event table along with the behavioral
//! flags the reconciler needs at dispatch time.
//!
//! Attribute lists are normalized once at element construction: duplicates
//! of `class` and `style` merge, empty names and empty class/style values
//! drop, and the result is sorted by name so the diff engine can walk two
//! lists merge-style.

use std::cmp::Ordering;

use im::Vector;
use serde_json::Value;

use crate::decode::Decoder;

/// One entry in an element's attribute list.
///
/// `Clone` and `Debug` are implemented by hand so they do not demand
/// anything of `Msg`: the only `Msg` lives behind the `Rc`-shared decoder.
pub enum Attr<Msg> {
    /// A plain surface attribute, compared by string equality.
    Attribute { name: String, value: String },
    /// An in-memory surface property, compared by deep equality.
    Property { name: String, value: Value },
    /// An event listener.
    Event {
        name: String,
        handler: Decoder<Msg>,
        /// Payload paths the surface should project into the decoder input.
        include: Vec<String>,
        prevent_default: bool,
        stop_propagation: bool,
        /// Bypass frame-aligned render batching when this event dispatches.
        immediate: bool,
        /// Quiet-period delay in milliseconds; 0 disables.
        debounce: u64,
        /// Rate-limit window in milliseconds; 0 disables.
        throttle: u64,
    },
}

impl<Msg> Clone for Attr<Msg> {
    fn clone(&self) -> Self {
        match self {
            Self::Attribute { name, value } => Self::Attribute {
                name: name.clone(),
                value: value.clone(),
            },
            Self::Property { name, value } => Self::Property {
                name: name.clone(),
                value: value.clone(),
            },
            Self::Event {
                name,
                handler,
                include,
                prevent_default,
                stop_propagation,
                immediate,
                debounce,
                throttle,
            } => Self::Event {
                name: name.clone(),
                handler: handler.clone(),
                include: include.clone(),
                prevent_default: *prevent_default,
                stop_propagation: *stop_propagation,
                immediate: *immediate,
                debounce: *debounce,
                throttle: *throttle,
            },
        }
    }
}

impl<Msg> std::fmt::Debug for Attr<Msg> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attribute { name, value } => f
                .debug_struct("Attribute")
                .field("name", name)
                .field("value", value)
                .finish(),
            Self::Property { name, value } => f
                .debug_struct("Property")
                .field("name", name)
                .field("value", value)
                .finish(),
            Self::Event {
                name,
                prevent_default,
                stop_propagation,
                immediate,
                debounce,
                throttle,
                ..
            } => f
                .debug_struct("Event")
                .field("name", name)
                .field("prevent_default", prevent_default)
                .field("stop_propagation", stop_propagation)
                .field("immediate", immediate)
                .field("debounce", debounce)
                .field("throttle", throttle)
                .finish_non_exhaustive(),
        }
    }
}

impl<Msg> Attr<Msg> {
    /// The attribute's name, whichever kind it is.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Attribute { name, .. } | Self::Property { name, .. } | Self::Event { name, .. } => {
                name
            }
        }
    }

    /// Rewrite an event handler's output type; other kinds pass through.
    pub fn map<NewMsg, F>(self, f: F) -> Attr<NewMsg>
    where
        Msg: 'static,
        NewMsg: 'static,
        F: Fn(Msg) -> NewMsg + 'static,
    {
        match self {
            Self::Attribute { name, value } => Attr::Attribute { name, value },
            Self::Property { name, value } => Attr::Property { name, value },
            Self::Event {
                name,
                handler,
                include,
                prevent_default,
                stop_propagation,
                immediate,
                debounce,
                throttle,
            } => Attr::Event {
                name,
                handler: handler.map(f),
                include,
                prevent_default,
                stop_propagation,
                immediate,
                debounce,
                throttle,
            },
        }
    }
}

/// Equality for diffing purposes.
///
/// Event handlers are functions and cannot be compared; two events are equal
/// when their behavioral fields are equal. The diff engine always re-points
/// the event table at the newest handler regardless.
impl<Msg> PartialEq for Attr<Msg> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Attribute { name, value },
                Self::Attribute {
                    name: n2,
                    value: v2,
                },
            ) => name == n2 && value == v2,
            (
                Self::Property { name, value },
                Self::Property {
                    name: n2,
                    value: v2,
                },
            ) => name == n2 && value == v2,
            (
                Self::Event {
                    name,
                    include,
                    prevent_default,
                    stop_propagation,
                    immediate,
                    debounce,
                    throttle,
                    ..
                },
                Self::Event {
                    name: n2,
                    include: i2,
                    prevent_default: p2,
                    stop_propagation: s2,
                    immediate: im2,
                    debounce: d2,
                    throttle: t2,
                    ..
                },
            ) => {
                name == n2
                    && include == i2
                    && prevent_default == p2
                    && stop_propagation == s2
                    && immediate == im2
                    && debounce == d2
                    && throttle == t2
            }
            _ => false,
        }
    }
}

/// Build a plain attribute.
pub fn attribute<Msg>(name: impl Into<String>, value: impl Into<String>) -> Attr<Msg> {
    Attr::Attribute {
        name: name.into(),
        value: value.into(),
    }
}

/// Build a property.
pub fn property<Msg>(name: impl Into<String>, value: Value) -> Attr<Msg> {
    Attr::Property {
        name: name.into(),
        value,
    }
}

/// The `class` attribute.
pub fn class<Msg>(value: impl Into<String>) -> Attr<Msg> {
    attribute("class", value)
}

/// The `style` attribute.
pub fn style<Msg>(value: impl Into<String>) -> Attr<Msg> {
    attribute("style", value)
}

/// The `id` attribute.
pub fn id<Msg>(value: impl Into<String>) -> Attr<Msg> {
    attribute("id", value)
}

/// The `value` attribute (controlled form inputs).
pub fn value<Msg>(value: impl Into<String>) -> Attr<Msg> {
    attribute("value", value)
}

/// The `checked` attribute (controlled checkboxes).
pub fn checked<Msg>(is_checked: bool) -> Attr<Msg> {
    attribute("checked", if is_checked { "true" } else { "" })
}

/// The `disabled` attribute.
pub fn disabled<Msg>(is_disabled: bool) -> Attr<Msg> {
    attribute("disabled", if is_disabled { "true" } else { "" })
}

/// Normalize an attribute list for diffing.
///
/// Stable-sorts by name (duplicates become adjacent), merges adjacent
/// duplicate `class` (space-joined) and `style` (`;`-joined) attributes in
/// encounter order, drops empty names and empty class/style values, and
/// deduplicates any other repeated name by keeping the last occurrence.
/// The result has unique names in ascending order; normalizing an already
/// normalized list is a no-op.
#[must_use]
pub fn normalize<Msg>(attrs: Vec<Attr<Msg>>) -> Vector<Attr<Msg>> {
    let mut attrs: Vec<Attr<Msg>> = attrs
        .into_iter()
        .filter(|attr| !attr.name().is_empty())
        .filter(|attr| match attr {
            Attr::Attribute { name, value } => {
                !((name == "class" || name == "style") && value.is_empty())
            }
            _ => true,
        })
        .collect();
    attrs.sort_by(|a, b| a.name().cmp(b.name()));

    enum Action {
        MergeWith(char),
        ReplacePrevious,
        Push,
    }

    let mut out: Vector<Attr<Msg>> = Vector::new();
    for attr in attrs {
        let action = match (out.back(), &attr) {
            (
                Some(Attr::Attribute { name, .. }),
                Attr::Attribute { name: next, .. },
            ) if name == next && name == "class" => Action::MergeWith(' '),
            (
                Some(Attr::Attribute { name, .. }),
                Attr::Attribute { name: next, .. },
            ) if name == next && name == "style" => Action::MergeWith(';'),
            // Repeated name of any other kind: last write wins.
            (Some(prev), next) if prev.name() == next.name() => Action::ReplacePrevious,
            _ => Action::Push,
        };
        match action {
            Action::MergeWith(joiner) => {
                let Attr::Attribute {
                    value: next_value, ..
                } = &attr
                else {
                    unreachable!("merge action only chosen for plain attributes");
                };
                if let Some(Attr::Attribute { value, .. }) = out.back_mut() {
                    value.push(joiner);
                    value.push_str(next_value);
                }
            }
            Action::ReplacePrevious => {
                out.pop_back();
                out.push_back(attr);
            }
            Action::Push => out.push_back(attr),
        }
    }
    out
}

/// Merge-walk comparison key used by the diff engine.
#[inline]
#[must_use]
pub fn compare_names<Msg>(a: &Attr<Msg>, b: &Attr<Msg>) -> Ordering {
    a.name().cmp(b.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    type A = Attr<()>;

    fn names<Msg>(attrs: &Vector<Attr<Msg>>) -> Vec<&str> {
        attrs.iter().map(Attr::name).collect()
    }

    #[test]
    fn classes_concatenate_in_encounter_order() {
        let out = normalize::<()>(vec![class("a"), id("x"), class("b")]);
        assert!(out.iter().any(|attr| matches!(
            attr,
            Attr::Attribute { name, value } if name == "class" && value == "a b"
        )));
    }

    #[test]
    fn styles_concatenate_with_semicolons() {
        let out = normalize::<()>(vec![style("x:1"), style("y:2")]);
        assert_eq!(out.len(), 1);
        assert!(matches!(
            &out[0],
            Attr::Attribute { name, value } if name == "style" && value == "x:1;y:2"
        ));
    }

    #[test]
    fn output_is_sorted_by_name() {
        let out = normalize::<()>(vec![id("x"), class("a"), attribute("alt", "pic")]);
        assert_eq!(names(&out), vec!["alt", "class", "id"]);
    }

    #[test]
    fn empty_names_and_empty_class_drop() {
        let out = normalize::<()>(vec![attribute("", "junk"), class(""), style(""), id("keep")]);
        assert_eq!(names(&out), vec!["id"]);
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize::<()>(vec![class("a"), class("b"), id("x"), style("p:1")]);
        let twice = normalize::<()>(once.iter().cloned().collect());
        assert_eq!(once, twice);
    }

    #[test]
    fn repeated_plain_name_keeps_last() {
        let out: Vector<A> = normalize(vec![attribute("title", "old"), attribute("title", "new")]);
        assert_eq!(out.len(), 1);
        assert!(matches!(
            &out[0],
            Attr::Attribute { value, .. } if value == "new"
        ));
    }
}
