//! Request execution and response normalization

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::ApiClient;

/// A success body after envelope unwrapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    pub message: Option<String>,
}

/// Helper for building and executing one authenticated request
pub struct FetchBuilder<'a> {
    api: &'a ApiClient,
    method: Method,
    path: String,
    body: Option<Vec<u8>>,
}

impl<'a> FetchBuilder<'a> {
    pub(crate) fn new(api: &'a ApiClient, method: Method, path: &str) -> Self {
        Self {
            api,
            method,
            path: path.to_string(),
            body: None,
        }
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Execute the request and decode the (unwrapped) payload
    pub async fn execute<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        Ok(self.execute_envelope::<T>().await?.data)
    }

    /// Execute the request, keeping the envelope's `message`
    pub async fn execute_envelope<T: DeserializeOwned>(self) -> Result<Envelope<T>, ApiError> {
        let envelope = self.execute_value().await?;
        Ok(Envelope {
            data: serde_json::from_value(envelope.data)?,
            message: envelope.message,
        })
    }

    async fn execute_value(self) -> Result<Envelope<Value>, ApiError> {
        // No token, no request.
        let token = self.api.auth().bearer_token()?;
        let url = self.api.endpoint(&self.path)?;
        debug!("{} {}", self.method, url);

        let mut request = self
            .api
            .http_client()
            .request(self.method.clone(), url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(body) = self.body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                self.api.auth().mark_expired();
            }
            debug!("{} {} failed with {}", self.method, self.path, status);
            return Err(ApiError::from_response(status, &text));
        }

        Ok(unwrap_envelope(parse_body(&text)))
    }
}

/// Empty bodies become `null`; non-JSON text is kept as a string.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// `{data, message}` envelopes are unwrapped to `data`; anything else is a
/// bare payload.
pub(crate) fn unwrap_envelope(value: Value) -> Envelope<Value> {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            let message = map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string);
            let data = map.remove("data").unwrap_or(Value::Null);
            Envelope { data, message }
        }
        other => Envelope {
            data: other,
            message: None,
        },
    }
}
