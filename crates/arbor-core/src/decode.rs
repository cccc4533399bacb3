//! Decoders for structured event payloads.
//!
//! Event handlers do not receive raw payloads directly; they declare a
//! [`Decoder`] that extracts a typed message from a dynamic
//! [`serde_json::Value`]. A decoder either produces a value or a structured
//! list of [`DecodeError`]s naming what was expected, what was found, and
//! where. Decode failure is never fatal: the runtime drops the dispatch and
//! carries on.

use std::rc::Rc;

use serde_json::Value;

/// A single decode failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// The shape the decoder was looking for.
    pub expected: String,
    /// A short classification of what was actually there.
    pub found: String,
    /// The field path from the payload root to the failure site.
    pub path: Vec<String>,
}

impl DecodeError {
    /// Build an error at the payload root.
    #[must_use]
    pub fn new(expected: impl Into<String>, found: &Value) -> Self {
        Self {
            expected: expected.into(),
            found: classify(found).to_owned(),
            path: Vec::new(),
        }
    }

    fn push_path(mut self, segment: &str) -> Self {
        self.path.insert(0, segment.to_owned());
        self
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "expected {} but found {} at /{}",
            self.expected,
            self.found,
            self.path.join("/")
        )
    }
}

/// All failures produced by one decode attempt.
pub type DecodeErrors = Vec<DecodeError>;

/// Result of running a decoder.
pub type Decoded<T> = Result<T, DecodeErrors>;

/// Short human label for a payload's shape, used in error messages.
#[must_use]
pub fn classify(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "Int",
        Value::Number(_) => "Float",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

/// A composable payload decoder.
///
/// Decoders are cheap to clone (the inner function is `Rc`-shared) so they
/// can live inside virtual-node attributes that are cloned across renders.
pub struct Decoder<T> {
    run: Rc<dyn Fn(&Value) -> Decoded<T>>,
}

impl<T> Clone for Decoder<T> {
    fn clone(&self) -> Self {
        Self {
            run: Rc::clone(&self.run),
        }
    }
}

impl<T> std::fmt::Debug for Decoder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Decoder(..)")
    }
}

impl<T> Decoder<T> {
    /// Run this decoder against a payload.
    pub fn run(&self, value: &Value) -> Decoded<T> {
        (self.run)(value)
    }
}

impl<T: 'static> Decoder<T> {
    /// Wrap a decode function.
    pub fn new(run: impl Fn(&Value) -> Decoded<T> + 'static) -> Self {
        Self { run: Rc::new(run) }
    }

    /// Always succeed with a fixed value, ignoring the payload.
    pub fn succeed(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(move |_| Ok(value.clone()))
    }

    /// Always fail with the given expectation.
    pub fn fail(expected: impl Into<String>) -> Self {
        let expected = expected.into();
        Self::new(move |value| Err(vec![DecodeError::new(expected.clone(), value)]))
    }

    /// Transform the decoded value.
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Decoder<U> {
        Decoder::new(move |value| self.run(value).map(&f))
    }

    /// Chain a decoder that depends on the first result.
    pub fn then<U: 'static>(self, f: impl Fn(T) -> Decoder<U> + 'static) -> Decoder<U> {
        Decoder::new(move |value| self.run(value).and_then(|t| f(t).run(value)))
    }

    /// Decode a named field of an object payload.
    pub fn field(name: impl Into<String>, inner: Decoder<T>) -> Self {
        let name = name.into();
        Self::new(move |value| match value {
            Value::Object(map) => match map.get(&name) {
                Some(child) => inner
                    .run(child)
                    .map_err(|errors| errors.into_iter().map(|e| e.push_path(&name)).collect()),
                None => Err(vec![
                    DecodeError::new(format!("field \"{name}\""), value).push_path(&name),
                ]),
            },
            _ => Err(vec![DecodeError::new("Object", value)]),
        })
    }

    /// Decode a value several fields deep.
    pub fn at<S: AsRef<str>>(segments: &[S], inner: Decoder<T>) -> Self {
        let mut decoder = inner;
        for segment in segments.iter().rev() {
            decoder = Self::field(segment.as_ref(), decoder);
        }
        decoder
    }
}

/// Decode a string payload.
#[must_use]
pub fn string() -> Decoder<String> {
    Decoder::new(|value| match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(vec![DecodeError::new("String", value)]),
    })
}

/// Decode an integer payload.
#[must_use]
pub fn int() -> Decoder<i64> {
    Decoder::new(|value| match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| vec![DecodeError::new("Int", value)]),
        _ => Err(vec![DecodeError::new("Int", value)]),
    })
}

/// Decode a float payload (integers widen).
#[must_use]
pub fn float() -> Decoder<f64> {
    Decoder::new(|value| match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| vec![DecodeError::new("Float", value)]),
        _ => Err(vec![DecodeError::new("Float", value)]),
    })
}

/// Decode a boolean payload.
#[must_use]
pub fn bool() -> Decoder<bool> {
    Decoder::new(|value| match value {
        Value::Bool(b) => Ok(*b),
        _ => Err(vec![DecodeError::new("Bool", value)]),
    })
}
