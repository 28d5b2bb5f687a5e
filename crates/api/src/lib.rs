//! Coaching platform REST client for Rust
//!
//! This crate wraps the `/api/v2` surface: users, programs, workouts,
//! exercises, muscle groups and baselines. Every call attaches the bearer
//! token held by a shared [`AuthContext`], unwraps `{data, message}`
//! envelopes, and normalizes error bodies into [`ApiError`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use coachdesk_api::ApiClient;
//! use coachdesk_auth::{AuthContext, MemoryTokenStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let http = reqwest::Client::new();
//! let auth = Arc::new(AuthContext::new(
//!     "https://coach.example.com",
//!     http.clone(),
//!     Arc::new(MemoryTokenStore::new()),
//! ));
//! auth.login("coach@example.com", "secret").await?;
//!
//! let api = ApiClient::new("https://coach.example.com", http, auth)?;
//! for program in api.list_programs().await? {
//!     println!("{} ({})", program.name, program.program_type);
//! }
//! # Ok(())
//! # }
//! ```

mod endpoints;
mod error;
mod fetch;
mod generation;
mod ids;
mod models;
pub mod wire;

pub use error::ApiError;
pub use fetch::{Envelope, FetchBuilder};
pub use generation::{RequestGeneration, RequestTicket};
pub use ids::{ExerciseId, MuscleGroupId, ProgramId, UserId, WorkoutId};
pub use models::*;
pub use wire::{
    CreateProgramRequest, CreateProgramWithWorkouts, ExerciseInput, ExerciseParams, NewWorkout,
    SupersetPair, UpsertWorkoutExercises,
};

use std::sync::Arc;

use async_trait::async_trait;
use coachdesk_auth::AuthContext;
use reqwest::{Client, Method};
use url::Url;

/// Versioned path prefix of every endpoint
pub const API_PREFIX: &str = "/api/v2";

/// Client for the coaching platform API
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http_client: Client,
    auth: Arc<AuthContext>,
}

impl ApiClient {
    /// Create a client for the API served at `base_url`.
    pub fn new(
        base_url: &str,
        http_client: Client,
        auth: Arc<AuthContext>,
    ) -> Result<Self, ApiError> {
        Url::parse(base_url)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            auth,
        })
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!("{}{}{}", self.base_url, API_PREFIX, path))?)
    }

    pub fn request(&self, method: Method, path: &str) -> FetchBuilder<'_> {
        FetchBuilder::new(self, method, path)
    }

    pub(crate) fn get(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::GET, path)
    }

    pub(crate) fn post(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::POST, path)
    }

    pub(crate) fn put(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::PUT, path)
    }

    pub(crate) fn delete(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::DELETE, path)
    }
}

/// The calls a multi-step program submission is made of.
///
/// Submission code depends on this trait rather than on [`ApiClient`] so the
/// sequence can be driven against any implementation.
#[async_trait]
pub trait ProgramApi: Send + Sync {
    async fn create_program_with_workouts(
        &self,
        request: &CreateProgramWithWorkouts,
    ) -> Result<Program, ApiError>;

    async fn upsert_workout_exercises(
        &self,
        request: &UpsertWorkoutExercises,
    ) -> Result<(), ApiError>;

    async fn create_baselines(
        &self,
        program_id: ProgramId,
        baselines: &[Baseline],
    ) -> Result<Vec<Baseline>, ApiError>;
}

#[async_trait]
impl ProgramApi for ApiClient {
    async fn create_program_with_workouts(
        &self,
        request: &CreateProgramWithWorkouts,
    ) -> Result<Program, ApiError> {
        ApiClient::create_program_with_workouts(self, request).await
    }

    async fn upsert_workout_exercises(
        &self,
        request: &UpsertWorkoutExercises,
    ) -> Result<(), ApiError> {
        ApiClient::upsert_workout_exercises(self, request).await
    }

    async fn create_baselines(
        &self,
        program_id: ProgramId,
        baselines: &[Baseline],
    ) -> Result<Vec<Baseline>, ApiError> {
        ApiClient::create_baselines(self, program_id, baselines).await
    }
}
