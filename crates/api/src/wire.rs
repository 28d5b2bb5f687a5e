//! Wire formats
//!
//! The server mixes two generations of field names (`firstName` and
//! `firstname`, `programType` and `program_type`, ...). Every response is
//! decoded into one of the `*Wire` types here, which accept each variant,
//! and then converted into the typed models. Request payloads are defined
//! here too, in the exact shape the server expects.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::{ExerciseId, MuscleGroupId, ProgramId, UserId, WorkoutId};
use crate::models::{
    Baseline, Equipment, Exercise, ExerciseCategory, Goal, MuscleGroup, Program, ProgramType,
    User, UserRole, Workout, WorkoutExercise,
};

// ---- requests ----

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProgramRequest {
    pub name: String,
    pub goal: Goal,
    pub program_type: ProgramType,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewWorkout {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateProgramWithWorkouts {
    #[serde(flatten)]
    pub program: CreateProgramRequest,
    pub workouts: Vec<NewWorkout>,
}

/// Per-entry parameters in an upsert payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseParams {
    pub id: ExerciseId,
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
}

/// One unordered superset pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupersetPair {
    pub first_exercise_id: ExerciseId,
    pub second_exercise_id: ExerciseId,
}

impl SupersetPair {
    pub fn contains(&self, id: ExerciseId) -> bool {
        self.first_exercise_id == id || self.second_exercise_id == id
    }

    /// Same pair regardless of order
    pub fn same_as(&self, a: ExerciseId, b: ExerciseId) -> bool {
        (self.first_exercise_id == a && self.second_exercise_id == b)
            || (self.first_exercise_id == b && self.second_exercise_id == a)
    }
}

/// Replaces a workout's whole exercise list and its supersets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpsertWorkoutExercises {
    pub workout_id: WorkoutId,
    pub exercises: Vec<ExerciseParams>,
    pub supersets: Vec<SupersetPair>,
}

/// Create/update body for catalogue exercises
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseInput {
    pub name: String,
    pub category: ExerciseCategory,
    pub equipment: Equipment,
    #[serde(default)]
    pub muscle_group_ids: Vec<MuscleGroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineInput {
    pub exercise_id: ExerciseId,
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
}

impl From<&Baseline> for BaselineInput {
    fn from(baseline: &Baseline) -> Self {
        Self {
            exercise_id: baseline.exercise_id,
            sets: baseline.sets,
            reps: baseline.reps,
            weight: baseline.weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkBaselines {
    pub baselines: Vec<BaselineInput>,
}

// ---- responses ----

#[derive(Debug, Clone, Deserialize)]
pub struct UserWire {
    pub id: UserId,
    #[serde(default, alias = "firstName", alias = "firstname")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName", alias = "lastname")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
}

impl From<UserWire> for User {
    fn from(wire: UserWire) -> Self {
        Self {
            id: wire.id,
            first_name: wire.first_name.unwrap_or_default(),
            last_name: wire.last_name.unwrap_or_default(),
            username: wire.username.or(wire.email).unwrap_or_default(),
            role: wire.role,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramWire {
    pub id: ProgramId,
    pub name: String,
    pub goal: Goal,
    #[serde(default, alias = "programType")]
    pub program_type: ProgramType,
    #[serde(alias = "startDate", deserialize_with = "de::date")]
    pub start_date: NaiveDate,
    #[serde(default, alias = "endDate", deserialize_with = "de::opt_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, alias = "userId")]
    pub user_id: Option<UserId>,
    #[serde(default, alias = "Workouts", deserialize_with = "de::null_default")]
    pub workouts: Vec<WorkoutWire>,
}

impl From<ProgramWire> for Program {
    fn from(wire: ProgramWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            goal: wire.goal,
            program_type: wire.program_type,
            start_date: wire.start_date,
            end_date: wire.end_date,
            user_id: wire.user_id,
            workouts: wire.workouts.into_iter().map(Workout::from).collect(),
        }
    }
}

/// `create-with-workouts` answers either with the program (workouts nested)
/// or with `{program, workouts}` side by side.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CreatedProgramWire {
    Split {
        program: ProgramWire,
        #[serde(default, deserialize_with = "de::null_default")]
        workouts: Vec<WorkoutWire>,
    },
    Nested(ProgramWire),
}

impl From<CreatedProgramWire> for Program {
    fn from(wire: CreatedProgramWire) -> Self {
        match wire {
            CreatedProgramWire::Split { mut program, workouts } => {
                if !workouts.is_empty() {
                    program.workouts = workouts;
                }
                program.into()
            }
            CreatedProgramWire::Nested(program) => program.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkoutWire {
    pub id: WorkoutId,
    pub name: String,
    #[serde(default, alias = "programId")]
    pub program_id: Option<ProgramId>,
    #[serde(
        default,
        alias = "workoutExercises",
        alias = "WorkoutExercises",
        deserialize_with = "de::null_default"
    )]
    pub exercises: Vec<WorkoutExerciseWire>,
}

impl From<WorkoutWire> for Workout {
    fn from(wire: WorkoutWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            program_id: wire.program_id,
            exercises: normalize_workout_exercises(wire.exercises, &[]),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseRefWire {
    pub id: ExerciseId,
    #[serde(default)]
    pub name: Option<String>,
}

/// One row of a workout's exercise list.
///
/// Flat rows carry the exercise id in `id`. Join rows carry their own row id
/// in `id` and the exercise in `exercise_id` or a nested `exercise`.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkoutExerciseWire {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, alias = "exerciseId")]
    pub exercise_id: Option<ExerciseId>,
    #[serde(default, alias = "Exercise")]
    pub exercise: Option<ExerciseRefWire>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sets: Option<u32>,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub weight: Option<f64>,
    #[serde(default, alias = "supersetWith")]
    pub superset_with: Option<i64>,
    #[serde(default, alias = "displayOrder", alias = "position")]
    pub order: Option<u32>,
}

impl WorkoutExerciseWire {
    fn exercise_id(&self) -> Option<ExerciseId> {
        self.exercise
            .as_ref()
            .map(|e| e.id)
            .or(self.exercise_id)
            .or(self.id.map(ExerciseId))
    }

    fn row_id(&self) -> Option<i64> {
        if self.exercise.is_some() || self.exercise_id.is_some() {
            self.id
        } else {
            None
        }
    }
}

/// `GET /workouts/{id}/exercises` answers with bare rows or with rows plus a
/// separate superset pair list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WorkoutExerciseListWire {
    Rows(Vec<WorkoutExerciseWire>),
    Listing {
        #[serde(default, deserialize_with = "de::null_default")]
        exercises: Vec<WorkoutExerciseWire>,
        #[serde(default, deserialize_with = "de::null_default")]
        supersets: Vec<SupersetPair>,
    },
}

impl From<WorkoutExerciseListWire> for Vec<WorkoutExercise> {
    fn from(wire: WorkoutExerciseListWire) -> Self {
        match wire {
            WorkoutExerciseListWire::Rows(rows) => normalize_workout_exercises(rows, &[]),
            WorkoutExerciseListWire::Listing { exercises, supersets } => {
                normalize_workout_exercises(exercises, &supersets)
            }
        }
    }
}

/// Convert rows into entries keyed by exercise id.
///
/// `superset_with` on a join row may name the partner's row id; it is
/// translated to the partner's exercise id. Pairs listed separately are
/// applied on top. Rows without any resolvable exercise id are dropped.
/// Entries are returned sorted by `order` and renumbered from 0.
pub fn normalize_workout_exercises(
    rows: Vec<WorkoutExerciseWire>,
    pairs: &[SupersetPair],
) -> Vec<WorkoutExercise> {
    let row_to_exercise: HashMap<i64, ExerciseId> = rows
        .iter()
        .filter_map(|row| Some((row.row_id()?, row.exercise_id()?)))
        .collect();

    let mut entries: Vec<WorkoutExercise> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let exercise_id = row.exercise_id()?;
            let name = row
                .exercise
                .as_ref()
                .and_then(|e| e.name.clone())
                .or_else(|| row.name.clone())
                .unwrap_or_default();
            let superset_with = row.superset_with.map(|partner| {
                row_to_exercise
                    .get(&partner)
                    .copied()
                    .unwrap_or(ExerciseId(partner))
            });
            Some(WorkoutExercise {
                exercise_id,
                name,
                sets: row.sets.unwrap_or(0),
                reps: row.reps.unwrap_or(0),
                weight: row.weight.unwrap_or(0.0),
                superset_with,
                order: row.order.unwrap_or(index as u32),
            })
        })
        .collect();

    for pair in pairs {
        for entry in entries.iter_mut() {
            if entry.exercise_id == pair.first_exercise_id {
                entry.superset_with = Some(pair.second_exercise_id);
            } else if entry.exercise_id == pair.second_exercise_id {
                entry.superset_with = Some(pair.first_exercise_id);
            }
        }
    }

    entries.sort_by_key(|entry| entry.order);
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.order = index as u32;
    }
    entries
}

#[derive(Debug, Clone, Deserialize)]
pub struct MuscleGroupWire {
    pub id: MuscleGroupId,
    pub name: String,
}

impl From<MuscleGroupWire> for MuscleGroup {
    fn from(wire: MuscleGroupWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseWire {
    pub id: ExerciseId,
    pub name: String,
    pub category: ExerciseCategory,
    pub equipment: Equipment,
    #[serde(
        default,
        alias = "muscleGroups",
        alias = "MuscleGroups",
        deserialize_with = "de::null_default"
    )]
    pub muscle_groups: Vec<MuscleGroupWire>,
    #[serde(default, alias = "videoUrl")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<ExerciseWire> for Exercise {
    fn from(wire: ExerciseWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            category: wire.category,
            equipment: wire.equipment,
            muscle_groups: wire.muscle_groups.into_iter().map(MuscleGroup::from).collect(),
            video_url: wire.video_url.filter(|url| !url.trim().is_empty()),
            notes: wire.notes.filter(|notes| !notes.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaselineWire {
    #[serde(alias = "exerciseId")]
    pub exercise_id: ExerciseId,
    pub sets: u32,
    pub reps: u32,
    #[serde(deserialize_with = "de::number")]
    pub weight: f64,
}

impl From<BaselineWire> for Baseline {
    fn from(wire: BaselineWire) -> Self {
        Self {
            exercise_id: wire.exercise_id,
            sets: wire.sets,
            reps: wire.reps,
            weight: wire.weight,
        }
    }
}

/// The bulk baseline endpoint answers with the created list, with
/// `{baselines: [...]}`, or with a count/acknowledgement.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BulkBaselinesWire {
    List(Vec<BaselineWire>),
    Wrapped { baselines: Vec<BaselineWire> },
    Other(serde_json::Value),
}

mod de {
    use super::*;
    use serde::de::Error as _;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    fn parse_date<E: serde::de::Error>(text: &str) -> Result<NaiveDate, E> {
        let day = text.get(..10).unwrap_or(text);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(E::custom)
    }

    /// `2024-01-01` or a full timestamp such as `2024-01-01T00:00:00.000Z`
    pub fn date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_date(&text)
    }

    pub fn opt_date<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) if !text.trim().is_empty() => parse_date(&text).map(Some),
            _ => Ok(None),
        }
    }

    /// Decimal columns sometimes arrive as strings
    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match NumberOrText::deserialize(deserializer)? {
            NumberOrText::Number(n) => Ok(n),
            NumberOrText::Text(text) => text.trim().parse().map_err(D::Error::custom),
        }
    }

    pub fn opt_number<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        match Option::<NumberOrText>::deserialize(deserializer)? {
            Some(NumberOrText::Number(n)) => Ok(Some(n)),
            Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(None),
            Some(NumberOrText::Text(text)) => {
                text.trim().parse().map(Some).map_err(D::Error::custom)
            }
            None => Ok(None),
        }
    }

    pub fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }
}
