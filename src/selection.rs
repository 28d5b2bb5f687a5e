//! Loading the workout a user picks
//!
//! Picking workouts quickly issues overlapping fetches. Only the most recent
//! pick produces an editor; anything answered after a newer pick is dropped.

use coachdesk_api::{ApiClient, RequestGeneration, WorkoutId};
use coachdesk_editor::WorkoutEditor;
use tracing::debug;

use crate::error::Error;

#[derive(Clone)]
pub struct WorkoutSelector {
    api: ApiClient,
    generation: RequestGeneration,
}

impl WorkoutSelector {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            generation: RequestGeneration::new(),
        }
    }

    /// Fetch the exercises of `workout_id` into an editor.
    ///
    /// Returns `Ok(None)` when another selection was made while this one was
    /// in flight, whether this fetch succeeded or not.
    pub async fn select(&self, workout_id: WorkoutId) -> Result<Option<WorkoutEditor>, Error> {
        let ticket = self.generation.issue();
        let result = self.api.list_workout_exercises(workout_id).await;

        if !self.generation.is_current(ticket) {
            debug!("selection of workout {} was superseded", workout_id);
            return Ok(None);
        }
        let entries = result?;
        Ok(self.generation.accept(ticket, WorkoutEditor::from_entries(entries)))
    }

    /// Drop whatever selection is in flight.
    pub fn clear(&self) {
        self.generation.issue();
    }
}
