use serde_json::{Map, Value};
use thiserror::Error;

/// A decoded change notification: a schema-less, string-keyed JSON object.
///
/// The bridge never interprets the keys; the inventory trigger happens to send
/// `{"event": ..., "data": {...}}` but any object is accepted.
pub type Notification = Map<String, Value>;

/// Why a channel payload was rejected
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Decode a raw channel payload into a [`Notification`].
pub fn decode(payload: &str) -> Result<Notification, DecodeError> {
    match serde_json::from_str::<Value>(payload)? {
        Value::Object(map) => Ok(map),
        other => Err(DecodeError::NotAnObject(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
