use serde_json::Value;

use crate::wire::{ExerciseWire, MuscleGroupWire};
use crate::{ApiClient, ApiError, Exercise, ExerciseId, ExerciseInput, MuscleGroup};

impl ApiClient {
    pub async fn list_exercises(&self) -> Result<Vec<Exercise>, ApiError> {
        let exercises: Vec<ExerciseWire> = self.get("/exercises").execute().await?;
        Ok(exercises.into_iter().map(Exercise::from).collect())
    }

    pub async fn get_exercise(&self, id: ExerciseId) -> Result<Exercise, ApiError> {
        let exercise: ExerciseWire = self.get(&format!("/exercises/{}", id)).execute().await?;
        Ok(exercise.into())
    }

    pub async fn create_exercise(&self, input: &ExerciseInput) -> Result<Exercise, ApiError> {
        let exercise: ExerciseWire = self.post("/exercises").json(input)?.execute().await?;
        Ok(exercise.into())
    }

    pub async fn update_exercise(
        &self,
        id: ExerciseId,
        input: &ExerciseInput,
    ) -> Result<Exercise, ApiError> {
        let exercise: ExerciseWire = self
            .put(&format!("/exercises/{}", id))
            .json(input)?
            .execute()
            .await?;
        Ok(exercise.into())
    }

    pub async fn delete_exercise(&self, id: ExerciseId) -> Result<(), ApiError> {
        self.delete(&format!("/exercises/{}", id))
            .execute::<Value>()
            .await?;
        Ok(())
    }

    pub async fn list_muscle_groups(&self) -> Result<Vec<MuscleGroup>, ApiError> {
        let groups: Vec<MuscleGroupWire> = self.get("/muscle-groups").execute().await?;
        Ok(groups.into_iter().map(MuscleGroup::from).collect())
    }
}
