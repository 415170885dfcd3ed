//! Usage-metric normalization.
//!
//! Providers report token accounting in shapes of their own choosing,
//! sometimes with nested detail objects or empty fields. Everything that is
//! stored or returned goes through [`normalize`] first, which guarantees a
//! JSON map whose leaves are booleans, numbers or strings, nested only in
//! lists and maps.
//!
//! Rules:
//! - bool, number, string, list and map values are kept (recursively)
//! - any other leaf (`null`, which is what serde produces for `None`, unit
//!   and non-finite floats) becomes its string representation
//! - a missing report (top-level `null`) becomes an empty map
//! - any other non-map top level is wrapped as `{"value": ...}`
//! - an object that cannot be serialized at all becomes `{"raw": "<Debug>"}`
//!
//! Normalizing already-normalized data is a no-op.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// A JSON-safe usage mapping.
pub type UsageMap = Map<String, Value>;

/// Key used when the top-level usage value is not a map.
pub const WRAPPED_KEY: &str = "value";

/// Key used when the usage object could not be serialized.
pub const RAW_KEY: &str = "raw";

/// Normalize any serializable usage object. Never fails.
pub fn normalize<T>(usage: &T) -> UsageMap
where
    T: Serialize + fmt::Debug + ?Sized,
{
    match serde_json::to_value(usage) {
        Ok(value) => normalize_value(value),
        Err(e) => {
            tracing::debug!(error = %e, "usage object not serializable, keeping debug form");
            let mut map = Map::new();
            map.insert(RAW_KEY.to_string(), Value::String(format!("{:?}", usage)));
            map
        }
    }
}

/// Normalize a JSON value already decoded from a provider response.
pub fn normalize_value(value: Value) -> UsageMap {
    match value {
        Value::Null => Map::new(),
        value => wrap(normalize_node(value)),
    }
}

fn wrap(value: Value) -> UsageMap {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert(WRAPPED_KEY.to_string(), other);
            map
        }
    }
}

fn normalize_node(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_node).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, normalize_node(value)))
                .collect(),
        ),
        Value::Null => Value::String(Value::Null.to_string()),
        primitive => primitive,
    }
}

/// True when `value` only contains bool/number/string leaves inside lists and maps.
pub fn is_normalized(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => items.iter().all(is_normalized),
        Value::Object(map) => map.values().all(is_normalized),
        Value::Bool(_) | Value::Number(_) | Value::String(_) => true,
    }
}
