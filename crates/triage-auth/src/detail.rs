//! Normalization of backend error bodies
//!
//! The backend reports failures as `{"detail": ...}` where `detail` is one of:
//! - a plain string (`HTTPException(detail="...")`)
//! - an object carrying a `message` field
//! - a list of field errors (request validation, status 422)
//!
//! Anything else, including non-JSON bodies, is `ErrorDetail::Unknown`.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

/// One entry of a validation error list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldError {
    /// Location of the offending value, e.g. `["body", "email"]`
    #[serde(default)]
    pub loc: Vec<Value>,
    pub msg: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl FieldError {
    /// Dotted field path, skipping the leading `body`/`query` segment.
    pub fn field(&self) -> String {
        self.loc
            .iter()
            .skip_while(|v| matches!(v.as_str(), Some("body" | "query" | "path")))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field();
        if field.is_empty() {
            write!(f, "{}", self.msg)
        } else {
            write!(f, "{field}: {}", self.msg)
        }
    }
}

/// Parsed `detail` of an error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorDetail {
    Message(String),
    Validation(Vec<FieldError>),
    Unknown,
}

impl ErrorDetail {
    /// Parse a raw response body.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_value(&value),
            Err(_) => ErrorDetail::Unknown,
        }
    }

    pub fn from_value(value: &Value) -> Self {
        match value.get("detail") {
            Some(Value::String(message)) => ErrorDetail::Message(message.clone()),
            Some(Value::Object(map)) => match map.get("message") {
                Some(Value::String(message)) => ErrorDetail::Message(message.clone()),
                _ => ErrorDetail::Unknown,
            },
            Some(Value::Array(items)) => {
                let errors: Vec<FieldError> = items
                    .iter()
                    .filter_map(|item| FieldError::deserialize(item).ok())
                    .collect();
                if errors.is_empty() {
                    ErrorDetail::Unknown
                } else {
                    ErrorDetail::Validation(errors)
                }
            }
            _ => ErrorDetail::Unknown,
        }
    }

    /// Human-readable message, if the body carried one.
    pub fn message(&self) -> Option<String> {
        match self {
            ErrorDetail::Message(message) => Some(message.clone()),
            ErrorDetail::Validation(errors) => Some(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            ErrorDetail::Unknown => None,
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{message}"),
            None => write!(f, "no detail"),
        }
    }
}
