use serde_json::Value;

use crate::wire::{CreatedProgramWire, ProgramWire, WorkoutWire};
use crate::{
    ApiClient, ApiError, CreateProgramRequest, CreateProgramWithWorkouts, Program, ProgramId,
    Workout,
};

impl ApiClient {
    pub async fn list_programs(&self) -> Result<Vec<Program>, ApiError> {
        let programs: Vec<ProgramWire> = self.get("/programs").execute().await?;
        Ok(programs.into_iter().map(Program::from).collect())
    }

    pub async fn get_program(&self, id: ProgramId) -> Result<Program, ApiError> {
        let program: ProgramWire = self.get(&format!("/programs/{}", id)).execute().await?;
        Ok(program.into())
    }

    /// Create a program without workouts
    pub async fn create_program(
        &self,
        request: &CreateProgramRequest,
    ) -> Result<Program, ApiError> {
        let program: CreatedProgramWire = self.post("/programs").json(request)?.execute().await?;
        Ok(program.into())
    }

    pub async fn update_program(
        &self,
        id: ProgramId,
        request: &CreateProgramRequest,
    ) -> Result<Program, ApiError> {
        let program: CreatedProgramWire = self
            .put(&format!("/programs/{}", id))
            .json(request)?
            .execute()
            .await?;
        Ok(program.into())
    }

    pub async fn delete_program(&self, id: ProgramId) -> Result<(), ApiError> {
        self.delete(&format!("/programs/{}", id))
            .execute::<Value>()
            .await?;
        Ok(())
    }

    /// Create a program and its (empty) workouts in one call. The returned
    /// workouts are in request order.
    pub async fn create_program_with_workouts(
        &self,
        request: &CreateProgramWithWorkouts,
    ) -> Result<Program, ApiError> {
        let program: CreatedProgramWire = self
            .post("/programs/create-with-workouts")
            .json(request)?
            .execute()
            .await?;
        Ok(program.into())
    }

    pub async fn list_program_workouts(&self, id: ProgramId) -> Result<Vec<Workout>, ApiError> {
        let workouts: Vec<WorkoutWire> = self
            .get(&format!("/programs/{}/workouts", id))
            .execute()
            .await?;
        Ok(workouts.into_iter().map(Workout::from).collect())
    }
}
