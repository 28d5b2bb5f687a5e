//! Configuration options for the coachdesk client

use std::path::PathBuf;
use std::time::Duration;

use coachdesk_auth::DEFAULT_STORAGE_KEY;

use crate::error::Error;

pub const ENV_API_URL: &str = "COACHDESK_API_URL";
pub const ENV_TOKEN_PATH: &str = "COACHDESK_TOKEN_PATH";
pub const ENV_TIMEOUT_SECS: &str = "COACHDESK_TIMEOUT_SECS";
pub const ENV_STORAGE_KEY: &str = "COACHDESK_STORAGE_KEY";

/// Where the bearer token is kept between runs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TokenStoreKind {
    /// Lost when the process exits
    #[default]
    Memory,
    /// A JSON file of key/value pairs
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    /// Server root, without the `/api/v2` prefix
    pub base_url: String,

    /// `None` disables the timeout
    pub request_timeout: Option<Duration>,

    pub token_store: TokenStoreKind,

    /// Key the token is stored under in a file store
    pub storage_key: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            token_store: TokenStoreKind::Memory,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl ClientOptions {
    pub fn new(base_url: &str) -> Self {
        Self::default().with_base_url(base_url)
    }

    pub fn with_base_url(mut self, value: &str) -> Self {
        self.base_url = value.to_string();
        self
    }

    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    pub fn with_token_store(mut self, value: TokenStoreKind) -> Self {
        self.token_store = value;
        self
    }

    /// Shorthand for a file token store at `path`
    pub fn with_token_file(self, path: impl Into<PathBuf>) -> Self {
        self.with_token_store(TokenStoreKind::File(path.into()))
    }

    pub fn with_storage_key(mut self, value: &str) -> Self {
        self.storage_key = value.to_string();
        self
    }

    /// Read options from `COACHDESK_*` environment variables.
    ///
    /// `COACHDESK_API_URL` is required. A timeout of `0` disables it.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars<F>(var: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = var(ENV_API_URL)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                Error::config(format!("{} environment variable not found", ENV_API_URL))
            })?;
        let mut options = Self::new(base_url.trim());

        if let Some(path) = var(ENV_TOKEN_PATH).filter(|value| !value.is_empty()) {
            options = options.with_token_file(path);
        }
        if let Some(secs) = var(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::config(format!(
                    "{} must be a number of seconds, got {:?}",
                    ENV_TIMEOUT_SECS, secs
                ))
            })?;
            options = options.with_request_timeout((secs > 0).then(|| Duration::from_secs(secs)));
        }
        if let Some(key) = var(ENV_STORAGE_KEY).filter(|value| !value.is_empty()) {
            options = options.with_storage_key(&key);
        }

        Ok(options)
    }
}
