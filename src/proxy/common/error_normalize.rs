// Error normalization
// Turns any error-like JSON value (typically a serialized SdkError) into a redacted, loggable shape.

use serde::Serialize;
use serde_json::{Map, Value};

use super::redact::redact_str;

/// Fields lifted into typed slots; everything else lands in `extra`.
const KNOWN_FIELDS: [&str; 6] = ["name", "message", "stack", "code", "status", "response"];

/// Status can live under either name; first numeric wins.
const STATUS_FIELDS: [&str; 2] = ["status", "statusCode"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    /// Remaining fields, shallow-copied. Strings are redacted; nested values are not.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NormalizedError {
    pub fn message_or_unknown(&self) -> &str {
        self.message.as_deref().unwrap_or("Unknown error")
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Normalizes an arbitrary error value. Never panics.
pub fn normalize(err: &Value) -> NormalizedError {
    let obj = match err {
        Value::Object(obj) => obj,
        Value::Null => return NormalizedError::default(),
        other => {
            return NormalizedError {
                message: text_of(other).map(|s| redact_str(&s)),
                ..Default::default()
            }
        }
    };

    let mut extra = Map::new();
    for (key, value) in obj {
        if KNOWN_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let copied = match value {
            Value::String(s) => Value::String(redact_str(s)),
            other => other.clone(),
        };
        extra.insert(key.clone(), copied);
    }

    NormalizedError {
        name: non_null(obj.get("name")),
        message: obj.get("message").and_then(text_of).map(|s| redact_str(&s)),
        stack: obj.get("stack").and_then(text_of).map(|s| redact_str(&s)),
        code: non_null(obj.get("code")),
        status: STATUS_FIELDS
            .iter()
            .find_map(|field| obj.get(*field).and_then(status_of)),
        response: obj.get("response").and_then(normalize_response),
        extra,
    }
}

/// Transport-level response: keep the useful parts, redact textual payloads.
fn normalize_response(response: &Value) -> Option<Value> {
    match response {
        Value::Null => None,
        Value::Object(obj) => {
            let mut out = Map::new();
            for (from, to) in [
                ("status", "status"),
                ("statusText", "statusText"),
                ("headers", "headers"),
            ] {
                if let Some(v) = non_null(obj.get(from)) {
                    out.insert(to.to_string(), v);
                }
            }
            for field in ["data", "body"] {
                match obj.get(field) {
                    Some(Value::String(s)) => {
                        out.insert(field.to_string(), Value::String(redact_str(s)));
                    }
                    Some(Value::Null) | None => {}
                    Some(other) => {
                        out.insert(field.to_string(), other.clone());
                    }
                }
            }
            Some(Value::Object(out))
        }
        Value::String(s) => Some(Value::String(redact_str(s))),
        other => Some(other.clone()),
    }
}

fn non_null(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn status_of(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
