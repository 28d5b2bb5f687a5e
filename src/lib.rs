//! Coachdesk client library
//!
//! A Rust client for the coaching platform's admin API. It bundles the
//! authentication context, the typed REST client and the workout editing
//! tools behind one [`Coachdesk`] handle.
//!
//! - [`auth`] re-exports `coachdesk-auth`: login, token storage, session state.
//! - [`api`] re-exports `coachdesk-api`: endpoints, models, wire adapters.
//! - [`editor`] re-exports `coachdesk-editor`: superset editor, program
//!   wizard, validation and submission.

pub mod config;
pub mod error;
pub mod import;
mod selection;

pub use coachdesk_api as api;
pub use coachdesk_auth as auth;
pub use coachdesk_editor as editor;
pub use selection::WorkoutSelector;

use std::sync::Arc;

use coachdesk_api::ApiClient;
use coachdesk_auth::{AuthContext, FileTokenStore, MemoryTokenStore, Session, TokenStore};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::{ClientOptions, TokenStoreKind};
use crate::error::Error;

/// The main entry point for the coachdesk client
#[derive(Clone)]
pub struct Coachdesk {
    options: ClientOptions,
    auth: Arc<AuthContext>,
    api: ApiClient,
}

impl Coachdesk {
    /// Create a client from `options`.
    ///
    /// A persisted token is picked up from the configured store.
    ///
    /// # Example
    ///
    /// ```
    /// use coachdesk::{config::ClientOptions, Coachdesk};
    ///
    /// let client = Coachdesk::new(ClientOptions::new("https://coach.example.com")).unwrap();
    /// assert!(!client.auth().is_authenticated());
    /// ```
    pub fn new(options: ClientOptions) -> Result<Self, Error> {
        Url::parse(&options.base_url)?;

        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let store: Arc<dyn TokenStore> = match &options.token_store {
            TokenStoreKind::Memory => Arc::new(MemoryTokenStore::new()),
            TokenStoreKind::File(path) => {
                debug!("using token file {}", path.display());
                Arc::new(FileTokenStore::with_key(path.clone(), &options.storage_key))
            }
        };

        let auth = Arc::new(AuthContext::new(&options.base_url, http_client.clone(), store));
        let api = ApiClient::new(&options.base_url, http_client, Arc::clone(&auth))?;

        Ok(Self { options, auth, api })
    }

    /// Create a client configured from `COACHDESK_*` environment variables
    pub fn from_env() -> Result<Self, Error> {
        Self::new(ClientOptions::from_env()?)
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, Error> {
        Ok(self.auth.login(username, password).await?)
    }

    pub fn logout(&self) -> Result<(), Error> {
        Ok(self.auth.logout()?)
    }

    /// A selector whose picks supersede each other
    pub fn workout_selector(&self) -> WorkoutSelector {
        WorkoutSelector::new(self.api.clone())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::{ClientOptions, TokenStoreKind};
    pub use crate::error::Error;
    pub use crate::{Coachdesk, WorkoutSelector};
    pub use coachdesk_api::{ApiClient, ApiError, ProgramApi};
    pub use coachdesk_auth::{AuthContext, AuthState};
    pub use coachdesk_editor::{ProgramWizard, SubmissionOutcome, WorkoutEditor};
}
