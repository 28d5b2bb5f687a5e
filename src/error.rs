//! Error handling for the coachdesk client

use std::fmt;

use coachdesk_api::ApiError;
use coachdesk_auth::AuthError;
use coachdesk_editor::{EditorError, WizardError};
use thiserror::Error;

/// Unified error type for the coachdesk client
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Wizard(#[from] WizardError),

    /// Building the HTTP client failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A program file could not be turned into a draft
    #[error("Import error: {0}")]
    Import(String),
}

impl Error {
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    pub fn import<T: fmt::Display>(msg: T) -> Self {
        Error::Import(msg.to_string())
    }

    /// Whether the stored session needs a fresh login
    pub fn needs_login(&self) -> bool {
        matches!(
            self,
            Error::Auth(AuthError::NotAuthenticated | AuthError::SessionExpired)
                | Error::Api(ApiError::Auth(
                    AuthError::NotAuthenticated | AuthError::SessionExpired
                ))
        ) || matches!(
            self,
            Error::Api(err) if err.status() == Some(reqwest::StatusCode::UNAUTHORIZED)
        )
    }
}
