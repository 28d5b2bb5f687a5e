use serde_json::Value;

use crate::wire::WorkoutExerciseListWire;
use crate::{ApiClient, ApiError, UpsertWorkoutExercises, WorkoutExercise, WorkoutId};

impl ApiClient {
    /// The workout's exercises in display order
    pub async fn list_workout_exercises(
        &self,
        id: WorkoutId,
    ) -> Result<Vec<WorkoutExercise>, ApiError> {
        let listing: WorkoutExerciseListWire = self
            .get(&format!("/workouts/{}/exercises", id))
            .execute()
            .await?;
        Ok(listing.into())
    }

    /// Replace the workout's exercise list and supersets wholesale
    pub async fn upsert_workout_exercises(
        &self,
        request: &UpsertWorkoutExercises,
    ) -> Result<(), ApiError> {
        self.post("/exercises/upsertExercisesToWorkout")
            .json(request)?
            .execute::<Value>()
            .await?;
        Ok(())
    }
}
