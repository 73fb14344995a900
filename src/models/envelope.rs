//! The `{ success, data | error }` wrapper every API response carries.

use serde_json::Value;

pub const UNAUTHORIZED: &str = "Unauthorized";

/// Decoded view of an API response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success { data: Value },
    Error { error: String },
    /// Valid JSON that is not a recognisable envelope.
    Other(Value),
}

impl Envelope {
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(body)?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        match value.get("success").and_then(Value::as_bool) {
            Some(true) if value.get("data").is_some() => Envelope::Success {
                data: value.get("data").cloned().unwrap_or(Value::Null),
            },
            Some(false) => match value.get("error").and_then(Value::as_str) {
                Some(error) => Envelope::Error {
                    error: error.to_string(),
                },
                None => Envelope::Other(value),
            },
            _ => Envelope::Other(value),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Envelope::Error { error } if error == UNAUTHORIZED)
    }
}

/// JavaScript-style truthiness, which is what the app's clients rely on.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Whether a raw JSON body carries a truthy `data` field, envelope or not.
pub fn has_data(value: &Value) -> bool {
    value.get("data").map(is_truthy).unwrap_or(false)
}
