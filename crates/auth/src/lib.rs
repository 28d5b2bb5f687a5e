//! Authentication for the coachdesk client
//!
//! This crate holds the bearer token issued by the login endpoint, persists
//! it through a [`TokenStore`], and tracks the [`AuthState`] lifecycle:
//! anonymous, authenticated, expired.

mod error;
mod session;
mod store;

pub use error::AuthError;
pub use session::{Session, TokenClaims};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, DEFAULT_STORAGE_KEY};

use std::sync::{Arc, RwLock};

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Where the client stands with respect to authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated(Session),
    Expired(Session),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Anonymous => None,
            AuthState::Authenticated(session) | AuthState::Expired(session) => Some(session),
        }
    }

    fn from_session(session: Session) -> Self {
        if session.is_expired() {
            AuthState::Expired(session)
        } else {
            AuthState::Authenticated(session)
        }
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Auth context shared by every API call
pub struct AuthContext {
    base_url: String,
    http_client: Client,
    store: Arc<dyn TokenStore>,
    state: RwLock<AuthState>,
}

impl AuthContext {
    /// Create an auth context, restoring any token persisted in `store`.
    ///
    /// A persisted token that cannot be read or decoded is removed from the
    /// store and the context starts anonymous.
    pub fn new(base_url: &str, http_client: Client, store: Arc<dyn TokenStore>) -> Self {
        let state = match store.load() {
            Ok(Some(token)) => match Session::from_token(&token) {
                Ok(session) => AuthState::from_session(session),
                Err(err) => {
                    warn!("discarding unreadable persisted token: {}", err);
                    if let Err(err) = store.clear() {
                        warn!("failed to clear persisted token: {}", err);
                    }
                    AuthState::Anonymous
                }
            },
            Ok(None) => AuthState::Anonymous,
            Err(err) => {
                warn!("failed to read persisted token: {}", err);
                if let Err(err) = store.clear() {
                    warn!("failed to clear persisted token: {}", err);
                }
                AuthState::Anonymous
            }
        };

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            store,
            state: RwLock::new(state),
        }
    }

    /// The current state, with expiry evaluated against the clock
    pub fn state(&self) -> AuthState {
        self.refresh_expiry();
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn session(&self) -> Option<Session> {
        self.state().session().cloned()
    }

    /// Log in with username (email) and password.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let url = format!("{}/api/v2/login", self.base_url);
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| error_message(&body))
                .unwrap_or_else(|| status_line(status));
            return Err(AuthError::LoginRejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = serde_json::from_str(&text)?;
        let token = extract_token(&body).ok_or(AuthError::MissingToken)?;
        let session = self.adopt_token(token)?;

        info!(
            "logged in as {}",
            session.claims.username.as_deref().unwrap_or(username)
        );
        Ok(session)
    }

    /// Decode, persist, and install a token obtained elsewhere.
    pub fn adopt_token(&self, token: &str) -> Result<Session, AuthError> {
        let session = Session::from_token(token)?;
        self.store.save(token)?;

        let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        *guard = AuthState::from_session(session.clone());
        Ok(session)
    }

    /// Forget the token locally and in the store.
    pub fn logout(&self) -> Result<(), AuthError> {
        {
            let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
            *guard = AuthState::Anonymous;
        }
        self.store.clear()?;
        info!("logged out");
        Ok(())
    }

    /// The token to attach to a request. Fails before any network call when
    /// there is no usable token.
    pub fn bearer_token(&self) -> Result<String, AuthError> {
        match self.state() {
            AuthState::Authenticated(session) => Ok(session.token),
            AuthState::Expired(_) => Err(AuthError::SessionExpired),
            AuthState::Anonymous => Err(AuthError::NotAuthenticated),
        }
    }

    /// Record that the server rejected the current token.
    pub fn mark_expired(&self) {
        let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        if let AuthState::Authenticated(session) = &*guard {
            warn!("server rejected the bearer token, session marked expired");
            *guard = AuthState::Expired(session.clone());
        }
    }

    fn refresh_expiry(&self) {
        let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        if let AuthState::Authenticated(session) = &*guard {
            if session.is_expired() {
                debug!("bearer token expired");
                *guard = AuthState::Expired(session.clone());
            }
        }
    }
}

fn extract_token(body: &Value) -> Option<&str> {
    body.get("data")
        .filter(|data| data.is_object())
        .and_then(token_field)
        .or_else(|| token_field(body))
}

fn token_field(payload: &Value) -> Option<&str> {
    ["token", "accessToken", "access_token"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
}

fn error_message(body: &Value) -> Option<String> {
    body.get("error")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn status_line(status: reqwest::StatusCode) -> String {
    format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Status")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_is_found_in_envelope_or_bare_body() {
        assert_eq!(extract_token(&json!({ "data": { "token": "a" } })), Some("a"));
        assert_eq!(extract_token(&json!({ "token": "b", "message": "ok" })), Some("b"));
        assert_eq!(extract_token(&json!({ "accessToken": "c" })), Some("c"));
        assert_eq!(
            extract_token(&json!({ "data": { "userId": 3 }, "token": "d" })),
            Some("d")
        );
        assert_eq!(extract_token(&json!({ "data": "nope" })), None);
    }

    #[test]
    fn undecodable_persisted_token_is_cleared() {
        let store = Arc::new(MemoryTokenStore::with_token("garbage"));
        let auth = AuthContext::new("http://localhost", Client::new(), store.clone());

        assert_eq!(auth.state(), AuthState::Anonymous);
        assert_eq!(store.load().unwrap(), None);
    }
}
