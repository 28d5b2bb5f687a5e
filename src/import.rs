//! Program files
//!
//! A program file is a JSON description of a whole program that the CLI
//! feeds through the wizard. Exercises are referenced by id or by name and
//! resolved against the server's exercise catalog.
//!
//! ```json
//! {
//!   "name": "Hypertrophy A",
//!   "goal": "HYPERTROPHY",
//!   "programType": "AUTOMATED",
//!   "userId": 2,
//!   "startDate": "2024-01-01",
//!   "workouts": [
//!     {
//!       "name": "Push",
//!       "exercises": [
//!         { "exercise": "Bench Press", "sets": 4, "reps": 8, "weight": 60, "supersetWith": 7 },
//!         { "exercise": 7 }
//!       ]
//!     }
//!   ],
//!   "seedBaselines": true
//! }
//! ```

use chrono::NaiveDate;
use coachdesk_api::{Baseline, Exercise, ExerciseId, Goal, ProgramType, UserId};
use coachdesk_editor::{ExerciseDefaults, ProgramDraft, ProgramWizard, WorkoutDraft};
use serde::Deserialize;
use tracing::debug;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExerciseRef {
    Id(ExerciseId),
    Name(String),
}

impl ExerciseRef {
    pub fn resolve<'a>(&self, catalog: &'a [Exercise]) -> Result<&'a Exercise, Error> {
        let found = match self {
            ExerciseRef::Id(id) => catalog.iter().find(|e| e.id == *id),
            ExerciseRef::Name(name) => catalog
                .iter()
                .find(|e| e.name.trim().eq_ignore_ascii_case(name.trim())),
        };
        found.ok_or_else(|| match self {
            ExerciseRef::Id(id) => Error::import(format!("no exercise with id {}", id)),
            ExerciseRef::Name(name) => Error::import(format!("no exercise named {:?}", name)),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseEntryFile {
    pub exercise: ExerciseRef,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub superset_with: Option<ExerciseRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutFile {
    pub name: String,
    #[serde(default)]
    pub exercises: Vec<ExerciseEntryFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineFile {
    pub exercise: ExerciseRef,
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramFile {
    pub name: String,
    pub goal: Goal,
    #[serde(default)]
    pub program_type: ProgramType,
    pub user_id: Option<UserId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub workouts: Vec<WorkoutFile>,
    #[serde(default)]
    pub baselines: Vec<BaselineFile>,
    /// Fill baselines that are not listed from each exercise's parameters
    #[serde(default)]
    pub seed_baselines: bool,
    /// Parameters for entries that leave them out
    #[serde(default)]
    pub defaults: ExerciseDefaults,
}

impl ProgramFile {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }

    /// Resolve every exercise against `catalog` and load the result into a
    /// wizard. The wizard still has to accept the draft.
    pub fn into_wizard(self, catalog: &[Exercise]) -> Result<ProgramWizard, Error> {
        let mut draft = ProgramDraft::new(self.name, self.goal);
        draft.user_id = self.user_id;
        draft.start_date = self.start_date;
        draft.end_date = self.end_date;

        for workout in &self.workouts {
            draft.workouts.push(load_workout(workout, catalog, self.defaults)?);
        }

        let mut wizard = ProgramWizard::new(draft);
        wizard.set_program_type(self.program_type);
        for baseline in &self.baselines {
            let exercise = baseline.exercise.resolve(catalog)?;
            wizard.set_baseline(Baseline {
                exercise_id: exercise.id,
                sets: baseline.sets,
                reps: baseline.reps,
                weight: baseline.weight,
            });
        }
        if self.seed_baselines {
            let seeded = wizard.seed_baselines();
            debug!("seeded {} baselines", seeded);
        }
        Ok(wizard)
    }
}

fn load_workout(
    file: &WorkoutFile,
    catalog: &[Exercise],
    defaults: ExerciseDefaults,
) -> Result<WorkoutDraft, Error> {
    let mut workout = WorkoutDraft::new(file.name.clone());

    for entry in &file.exercises {
        let exercise = entry.exercise.resolve(catalog)?;
        let params = ExerciseDefaults {
            sets: entry.sets.unwrap_or(defaults.sets),
            reps: entry.reps.unwrap_or(defaults.reps),
            weight: entry.weight.unwrap_or(defaults.weight),
        };
        if !workout.exercises.add_exercise(exercise, params) {
            return Err(Error::import(format!(
                "{} is listed twice in workout {:?}",
                exercise.name, file.name
            )));
        }
    }

    for entry in &file.exercises {
        let Some(partner) = &entry.superset_with else {
            continue;
        };
        let id = entry.exercise.resolve(catalog)?.id;
        let partner = partner.resolve(catalog)?.id;
        let already = workout
            .exercises
            .get(id)
            .map_or(false, |e| e.superset_with == Some(partner));
        if !already {
            workout.exercises.pair(id, partner)?;
        }
    }

    Ok(workout)
}
