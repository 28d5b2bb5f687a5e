//! Program submission
//!
//! Creating a program takes several independent calls and the server offers
//! no transaction across them. Each committed call is recorded so that a
//! failure part way through is reported as such, and so that running the
//! submission again picks up where it stopped instead of creating a second
//! program.

use std::collections::BTreeMap;
use std::fmt;

use coachdesk_api::{
    ApiError, Baseline, CreateProgramWithWorkouts, NewWorkout, Program, ProgramApi, ProgramType,
    Workout, WorkoutId,
};
use tracing::{info, warn};

use crate::editor::WorkoutEditor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStep {
    CreateProgram,
    /// `workout_id` is absent when the server never created the workout
    UpsertExercises {
        workout_index: usize,
        workout_id: Option<WorkoutId>,
    },
    CreateBaselines,
}

impl fmt::Display for SubmissionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionStep::CreateProgram => f.write_str("create program"),
            SubmissionStep::UpsertExercises {
                workout_index,
                workout_id: Some(id),
            } => write!(f, "save exercises of workout {} (#{})", workout_index + 1, id),
            SubmissionStep::UpsertExercises { workout_index, .. } => {
                write!(f, "save exercises of workout {}", workout_index + 1)
            }
            SubmissionStep::CreateBaselines => f.write_str("create baselines"),
        }
    }
}

/// What the server has accepted so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionTracker {
    pub program: Option<Program>,
    pub saved_workouts: BTreeMap<usize, WorkoutId>,
    pub baselines_saved: bool,
}

impl SubmissionTracker {
    pub fn committed_steps(&self) -> Vec<SubmissionStep> {
        let mut steps = Vec::new();
        if self.program.is_some() {
            steps.push(SubmissionStep::CreateProgram);
        }
        steps.extend(
            self.saved_workouts
                .iter()
                .map(|(index, id)| SubmissionStep::UpsertExercises {
                    workout_index: *index,
                    workout_id: Some(*id),
                }),
        );
        if self.baselines_saved {
            steps.push(SubmissionStep::CreateBaselines);
        }
        steps
    }

    pub fn is_empty(&self) -> bool {
        self.program.is_none()
    }
}

#[derive(Debug)]
pub enum SubmissionOutcome {
    Completed {
        program: Program,
    },
    /// The program itself was not created. Nothing is committed.
    Rejected {
        error: ApiError,
    },
    /// The program exists but a later call failed
    PartiallyCommitted {
        program: Program,
        committed: Vec<SubmissionStep>,
        failed: SubmissionStep,
        error: ApiError,
    },
}

impl SubmissionOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, SubmissionOutcome::Completed { .. })
    }

    /// Everything but the baselines was saved
    pub fn is_baseline_warning(&self) -> bool {
        matches!(
            self,
            SubmissionOutcome::PartiallyCommitted {
                failed: SubmissionStep::CreateBaselines,
                ..
            }
        )
    }

    pub fn program(&self) -> Option<&Program> {
        match self {
            SubmissionOutcome::Completed { program }
            | SubmissionOutcome::PartiallyCommitted { program, .. } => Some(program),
            SubmissionOutcome::Rejected { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            SubmissionOutcome::Completed { .. } => None,
            SubmissionOutcome::Rejected { error }
            | SubmissionOutcome::PartiallyCommitted { error, .. } => Some(error),
        }
    }
}

/// A validated program ready to be sent
#[derive(Debug, Clone)]
pub struct ProgramSubmission {
    request: CreateProgramWithWorkouts,
    workouts: Vec<WorkoutEditor>,
    baselines: Vec<Baseline>,
    tracker: SubmissionTracker,
}

impl ProgramSubmission {
    /// `workouts[i]` holds the exercises of `request.workouts[i]`.
    pub fn new(
        request: CreateProgramWithWorkouts,
        workouts: Vec<WorkoutEditor>,
        baselines: Vec<Baseline>,
    ) -> Self {
        Self {
            request,
            workouts,
            baselines,
            tracker: SubmissionTracker::default(),
        }
    }

    pub fn request(&self) -> &CreateProgramWithWorkouts {
        &self.request
    }

    pub fn workouts(&self) -> &[WorkoutEditor] {
        &self.workouts
    }

    pub fn baselines(&self) -> &[Baseline] {
        &self.baselines
    }

    pub fn program_type(&self) -> ProgramType {
        self.request.program.program_type
    }

    pub fn tracker(&self) -> &SubmissionTracker {
        &self.tracker
    }

    /// Run every step not yet committed.
    ///
    /// Steps run in order: create the program with its workouts, save each
    /// workout's exercises, then create baselines for AUTOMATED programs.
    /// The first failure stops the run. Nothing already committed is undone.
    pub async fn run<A>(&mut self, api: &A) -> SubmissionOutcome
    where
        A: ProgramApi + ?Sized,
    {
        let program = match self.tracker.program.clone() {
            Some(program) => program,
            None => {
                info!(
                    "creating program {:?} with {} workouts",
                    self.request.program.name,
                    self.request.workouts.len()
                );
                match api.create_program_with_workouts(&self.request).await {
                    Ok(program) => {
                        info!("created program {}", program.id);
                        self.tracker.program = Some(program.clone());
                        program
                    }
                    Err(error) => {
                        warn!("program creation failed: {}", error);
                        return SubmissionOutcome::Rejected { error };
                    }
                }
            }
        };

        if program.workouts.len() > self.workouts.len() {
            warn!(
                "server created {} workouts for {} submitted",
                program.workouts.len(),
                self.workouts.len()
            );
        }

        let matched = match_workouts(&self.request.workouts, &program.workouts);
        for (index, editor) in self.workouts.iter().enumerate() {
            if self.tracker.saved_workouts.contains_key(&index) {
                continue;
            }

            let Some(workout) = matched.get(index).copied().flatten() else {
                let error = ApiError::UnexpectedResponse(format!(
                    "server returned {} workouts, expected {}",
                    program.workouts.len(),
                    self.workouts.len()
                ));
                let failed = SubmissionStep::UpsertExercises {
                    workout_index: index,
                    workout_id: None,
                };
                return self.partial(program, failed, error);
            };

            let payload = editor.save_payload(workout.id);
            match api.upsert_workout_exercises(&payload).await {
                Ok(()) => {
                    info!(
                        "saved {} exercises to workout {} ({})",
                        payload.exercises.len(),
                        workout.id,
                        workout.name
                    );
                    self.tracker.saved_workouts.insert(index, workout.id);
                }
                Err(error) => {
                    let failed = SubmissionStep::UpsertExercises {
                        workout_index: index,
                        workout_id: Some(workout.id),
                    };
                    return self.partial(program, failed, error);
                }
            }
        }

        if self.program_type() == ProgramType::Automated
            && !self.tracker.baselines_saved
            && !self.baselines.is_empty()
        {
            match api.create_baselines(program.id, &self.baselines).await {
                Ok(created) => {
                    info!("created {} baselines for program {}", created.len(), program.id);
                    self.tracker.baselines_saved = true;
                }
                Err(error) => {
                    return self.partial(program, SubmissionStep::CreateBaselines, error);
                }
            }
        }

        SubmissionOutcome::Completed { program }
    }

    fn partial(
        &self,
        program: Program,
        failed: SubmissionStep,
        error: ApiError,
    ) -> SubmissionOutcome {
        warn!(
            "program {} partially saved, {} failed: {}",
            program.id, failed, error
        );
        SubmissionOutcome::PartiallyCommitted {
            program,
            committed: self.tracker.committed_steps(),
            failed,
            error,
        }
    }
}

/// Pair each requested workout with the one the server created for it.
///
/// A name that is unique on both sides decides the match. The rest fall back
/// to their position among the workouts not matched by name.
fn match_workouts<'a>(
    requested: &[NewWorkout],
    created: &'a [Workout],
) -> Vec<Option<&'a Workout>> {
    let unique_match = |name: &str| {
        let name = name.trim();
        let requested_count = requested.iter().filter(|w| w.name.trim() == name).count();
        let mut same_name = created
            .iter()
            .enumerate()
            .filter(|(_, w)| w.name.trim() == name);
        match (requested_count, same_name.next(), same_name.next()) {
            (1, Some((index, _)), None) => Some(index),
            _ => None,
        }
    };

    let by_name: Vec<Option<usize>> = requested.iter().map(|w| unique_match(&w.name)).collect();
    let mut leftovers = (0..created.len()).filter(|i| !by_name.contains(&Some(*i)));

    by_name
        .iter()
        .map(|found| found.or_else(|| leftovers.next()).map(|i| &created[i]))
        .collect()
}
