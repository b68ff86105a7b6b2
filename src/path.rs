//! Dot-notation lookups into nested JSON objects.
//!
//! A path such as `"address.city.name"` is split on `.` and resolved one key at
//! a time. Lookups never mutate the tree they walk.

use crate::errors::PathError;
use serde_json::{Map, Value};

/// Returns the JSON type name used in [`PathError`] messages.
pub(crate) const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Resolves a non-empty `path` against `root` without cloning.
///
/// Returns `Ok(None)` as soon as a key is missing; deeper segments are not
/// inspected. Fails only when a segment has to be looked up inside a value that
/// is not an object.
pub(crate) fn lookup_ref<'a>(
    root: &'a Map<String, Value>,
    path: &str,
) -> Result<Option<&'a Value>, PathError> {
    let mut segments = path.split('.').peekable();
    let mut walked: Vec<&str> = Vec::new();
    let mut current = root;

    while let Some(segment) = segments.next() {
        let Some(value) = current.get(segment) else {
            return Ok(None);
        };
        walked.push(segment);

        let Some(next_segment) = segments.peek() else {
            return Ok(Some(value));
        };

        match value {
            Value::Object(map) => current = map,
            other => {
                return Err(PathError::NotTraversable {
                    segment: (*next_segment).to_string(),
                    path: walked.join("."),
                    found: json_type_name(other),
                });
            }
        }
    }

    // `split` always yields at least one segment, so the loop returns first.
    Ok(None)
}

/// Resolves `path` against `root`, falling back to `default` for missing keys.
///
/// An empty path returns the whole of `root`.
pub(crate) fn lookup(
    root: &Map<String, Value>,
    path: &str,
    default: Value,
) -> Result<Value, PathError> {
    if path.is_empty() {
        return Ok(Value::Object(root.clone()));
    }

    Ok(lookup_ref(root, path)?.cloned().unwrap_or(default))
}
