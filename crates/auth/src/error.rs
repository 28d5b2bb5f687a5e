use thiserror::Error;

/// Errors raised by the auth context
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Login rejected ({status}): {message}")]
    LoginRejected { status: u16, message: String },

    #[error("Login response did not contain a token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Token storage error: {0}")]
    StorageError(#[from] std::io::Error),
}
