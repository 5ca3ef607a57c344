//! Conversion between Firestore's typed REST values and plain JSON.
//!
//! Firestore wraps every value in a single-key object naming its type, e.g.
//! `{"integerValue": "42"}` or `{"mapValue": {"fields": {...}}}`. The rest of
//! the storefront works on plain `serde_json::Value`s; this module is the only
//! place that knows the wrapped form.
//!
//! Timestamps, references and bytes decode to strings. Integers are sent as
//! strings by Firestore and decode to JSON numbers.

use serde_json::{Map, Number, Value};

/// Decode a document's `fields` object.
#[must_use]
pub fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

/// Decode one typed value. Unknown shapes decode to `null`.
#[must_use]
pub fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => decode_integer(inner),
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        "geoPointValue" => inner.clone(),
        _ => Value::Null,
    }
}

fn decode_integer(inner: &Value) -> Value {
    match inner {
        Value::String(s) => s
            .parse::<i64>()
            .map_or(Value::Null, |n| Value::Number(n.into())),
        Value::Number(n) => Value::Number(n.clone()),
        _ => Value::Null,
    }
}

/// Encode plain JSON fields for a write.
#[must_use]
pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// Encode one plain JSON value.
///
/// Numbers that fit an `i64` become `integerValue`, everything else numeric
/// becomes `doubleValue`.
#[must_use]
pub fn encode_value(value: &Value) -> Value {
    let mut wrapped = Map::with_capacity(1);
    match value {
        Value::Null => {
            wrapped.insert("nullValue".into(), Value::Null);
        }
        Value::Bool(b) => {
            wrapped.insert("booleanValue".into(), Value::Bool(*b));
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                wrapped.insert("integerValue".into(), Value::String(i.to_string()));
            } else {
                let double = n.as_f64().unwrap_or_default();
                wrapped.insert("doubleValue".into(), Value::from(double));
            }
        }
        Value::String(s) => {
            wrapped.insert("stringValue".into(), Value::String(s.clone()));
        }
        Value::Array(items) => {
            let values = items.iter().map(encode_value).collect();
            let mut array = Map::with_capacity(1);
            array.insert("values".into(), Value::Array(values));
            wrapped.insert("arrayValue".into(), Value::Object(array));
        }
        Value::Object(fields) => {
            let mut map = Map::with_capacity(1);
            map.insert("fields".into(), Value::Object(encode_fields(fields)));
            wrapped.insert("mapValue".into(), Value::Object(map));
        }
    }
    Value::Object(wrapped)
}
