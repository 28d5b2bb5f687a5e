use std::collections::BTreeMap;

use coachdesk_auth::AuthError;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors returned by API calls
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-success status
    #[error("{message} (Status: {status})")]
    Http {
        status: StatusCode,
        message: String,
        details: Option<Value>,
        /// The parsed error body, when it was JSON
        body: Option<Value>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ApiError {
    /// Build an error from a non-success response body.
    ///
    /// JSON bodies contribute `error` or `message` and `details`; anything
    /// else falls back to the status line.
    pub fn from_response(status: StatusCode, text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(body) => {
                let message = body
                    .get("error")
                    .and_then(Value::as_str)
                    .or_else(|| body.get("message").and_then(Value::as_str))
                    .map(str::to_string)
                    .unwrap_or_else(|| status_line(status));
                let details = body.get("details").filter(|d| !d.is_null()).cloned();
                ApiError::Http {
                    status,
                    message,
                    details,
                    body: Some(body),
                }
            }
            Err(_) => ApiError::Http {
                status,
                message: status_line(status),
                details: None,
                body: None,
            },
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Network(err) => err.status(),
            _ => None,
        }
    }

    pub fn details(&self) -> Option<&Value> {
        match self {
            ApiError::Http { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    /// Field-level messages for form display.
    ///
    /// Accepts `details` as an object (`{"name": "required"}`) or as an array
    /// of `{field|path|param, message|msg}` records, and falls back to a
    /// top-level `errors` array in the same format.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        let (details, body) = match self {
            ApiError::Http { details, body, .. } => (details.as_ref(), body.as_ref()),
            _ => return BTreeMap::new(),
        };

        let mut fields = BTreeMap::new();
        if let Some(details) = details {
            collect_field_errors(details, &mut fields);
        }
        if fields.is_empty() {
            if let Some(errors) = body.and_then(|b| b.get("errors")) {
                collect_field_errors(errors, &mut fields);
            }
        }
        fields
    }
}

fn collect_field_errors(value: &Value, fields: &mut BTreeMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (field, message) in map {
                if let Some(message) = message_text(message) {
                    fields.insert(field.clone(), message);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                let field = ["field", "path", "param"]
                    .iter()
                    .find_map(|key| item.get(*key).and_then(Value::as_str));
                let message = ["message", "msg"]
                    .iter()
                    .find_map(|key| item.get(*key).and_then(Value::as_str));
                if let (Some(field), Some(message)) = (field, message) {
                    fields
                        .entry(field.to_string())
                        .or_insert_with(|| message.to_string());
                }
            }
        }
        _ => {}
    }
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(message_text),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

pub(crate) fn status_line(status: StatusCode) -> String {
    format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Status")
    )
}
