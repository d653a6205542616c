use serde_json::{Map, Value};

use crate::document::{is_empty_object, ArrayFields};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Builds the canonical form of `tree`.
///
/// - object keys are sorted ascending, empty objects stay objects
/// - properties named in `array_fields` are always arrays (`null` and `{}`
///   become `[]`, anything else that is not an array is wrapped)
/// - array elements that canonicalize to `{}` are dropped
///
/// The input is never modified and the output only depends on the input
/// tree and `array_fields`.
pub fn canonicalize(tree: &Value, array_fields: &ArrayFields) -> Value {
    return match tree {
        Value::Object(map) => canonicalize_object(map, array_fields),
        Value::Array(items) => canonicalize_array(items, array_fields),
        scalar => scalar.clone(),
    };
}

fn canonicalize_object(map: &Map<String, Value>, array_fields: &ArrayFields) -> Value {
    if map.is_empty() {
        return Value::Object(Map::new());
    }

    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    let mut canonical = Map::with_capacity(map.len());
    for key in keys {
        let value = canonicalize(&map[key], array_fields);
        let value = if array_fields.contains(key) {
            force_array(value)
        } else {
            value
        };
        canonical.insert(key.clone(), value);
    }

    return Value::Object(canonical);
}

fn canonicalize_array(items: &[Value], array_fields: &ArrayFields) -> Value {
    let canonical = items
        .iter()
        .map(|item| canonicalize(item, array_fields))
        .filter(|item| !is_empty_object(item))
        .collect();

    return Value::Array(canonical);
}

fn force_array(value: Value) -> Value {
    return match value {
        Value::Array(items) => Value::Array(items),
        Value::Null => Value::Array(Vec::new()),
        Value::Object(map) if map.is_empty() => Value::Array(Vec::new()),
        other => Value::Array(vec![other]),
    };
}

/// Canonical, human-readable JSON text with a trailing newline.
pub fn to_canonical_json(tree: &Value, array_fields: &ArrayFields) -> Result<String, Error> {
    let canonical = canonicalize(tree, array_fields);
    let mut text = serde_json::to_string_pretty(&canonical)?;
    text.push('\n');

    return Ok(text);
}
