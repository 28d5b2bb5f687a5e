//! Typed client-side models
//!
//! These are the only shapes the rest of the workspace sees. Raw responses
//! are decoded by [`crate::wire`] and converted into these types.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{ExerciseId, MuscleGroupId, ProgramId, UserId, WorkoutId};

macro_rules! api_enum {
    ($name:ident { $($variant:ident => $wire:literal),* $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)*
                }
            }

            pub fn all() -> &'static [Self] {
                &[$(Self::$variant),*]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let upper = s.trim().to_ascii_uppercase();
                match upper.as_str() {
                    $($wire => Ok(Self::$variant),)*
                    _ => Err(format!("unknown {}: {}", stringify!($name), s)),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Goal {
    #[serde(alias = "strength")]
    Strength,
    #[serde(alias = "hypertrophy")]
    Hypertrophy,
}

api_enum!(Goal { Strength => "STRENGTH", Hypertrophy => "HYPERTROPHY" });

/// MANUAL programs are tracked by the trainer; AUTOMATED programs progress
/// from per-exercise baselines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgramType {
    #[default]
    #[serde(alias = "manual")]
    Manual,
    #[serde(alias = "automated")]
    Automated,
}

api_enum!(ProgramType { Manual => "MANUAL", Automated => "AUTOMATED" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExerciseCategory {
    #[serde(alias = "compound")]
    Compound,
    #[serde(alias = "isolation")]
    Isolation,
}

api_enum!(ExerciseCategory { Compound => "COMPOUND", Isolation => "ISOLATION" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Equipment {
    #[serde(alias = "barbell")]
    Barbell,
    #[serde(alias = "dumbbell")]
    Dumbbell,
    #[serde(alias = "cable")]
    Cable,
    #[serde(alias = "machine")]
    Machine,
    #[serde(alias = "bodyweight")]
    Bodyweight,
}

api_enum!(Equipment {
    Barbell => "BARBELL",
    Dumbbell => "DUMBBELL",
    Cable => "CABLE",
    Machine => "MACHINE",
    Bodyweight => "BODYWEIGHT",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[serde(alias = "trainer")]
    Trainer,
    #[serde(alias = "client")]
    Client,
}

api_enum!(UserRole { Trainer => "TRAINER", Client => "CLIENT" });

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    /// The login email
    pub username: String,
    pub role: Option<UserRole>,
}

impl User {
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    pub goal: Goal,
    pub program_type: ProgramType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub user_id: Option<UserId>,
    pub workouts: Vec<Workout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: WorkoutId,
    pub name: String,
    pub program_id: Option<ProgramId>,
    pub exercises: Vec<WorkoutExercise>,
}

/// An exercise placed in a workout with its per-workout parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub exercise_id: ExerciseId,
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    /// Kilograms
    pub weight: f64,
    /// The partner entry in the same workout, always mutual
    pub superset_with: Option<ExerciseId>,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    pub category: ExerciseCategory,
    pub equipment: Equipment,
    pub muscle_groups: Vec<MuscleGroup>,
    pub video_url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuscleGroup {
    pub id: MuscleGroupId,
    pub name: String,
}

/// Starting sets/reps/weight for one exercise of an AUTOMATED program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub exercise_id: ExerciseId,
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("hypertrophy".parse::<Goal>(), Ok(Goal::Hypertrophy));
        assert_eq!(" Automated ".parse::<ProgramType>(), Ok(ProgramType::Automated));
        assert_eq!(Equipment::Bodyweight.to_string(), "BODYWEIGHT");
        assert!("kettlebell".parse::<Equipment>().is_err());
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let user = User {
            id: UserId(1),
            first_name: String::new(),
            last_name: String::new(),
            username: "client@example.com".to_string(),
            role: None,
        };
        assert_eq!(user.display_name(), "client@example.com");
    }
}
