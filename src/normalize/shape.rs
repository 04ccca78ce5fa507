// src/normalize/shape.rs
use serde_json::{Map, Value};

/// Run-time shape of a `parts` or `sections` field.
///
/// Upstream filings come from at least two generators, one emitting keyed
/// objects and one emitting arrays, so both normalizers classify their input
/// once here and match on the result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape<'a> {
    /// Field absent or `null`.
    Missing,
    /// Already an ordered array.
    List(&'a [Value]),
    /// Keyed object, iterated in insertion order.
    Map(&'a Map<String, Value>),
    /// Any scalar: string, number or bool.
    Other(&'a Value),
}

impl<'a> Shape<'a> {
    pub fn of(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => Shape::Missing,
            Some(Value::Array(items)) => Shape::List(items),
            Some(Value::Object(map)) => Shape::Map(map),
            Some(other) => Shape::Other(other),
        }
    }
}

/// A field counts as usefully present when it exists, is not `null` and is
/// not the empty string.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.is_empty(),
        Some(_) => true,
    }
}

/// Short JSON type name for log lines.
pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
