//! Client-side validation rules
//!
//! Every function here is pure and total: bad input produces a report, never
//! a panic or an error value.

use std::collections::{BTreeMap, HashSet};

use coachdesk_api::{Baseline, ExerciseInput, WorkoutExercise};
use url::Url;

use crate::wizard::{ProgramDraft, WorkoutDraft};

pub const MIN_SETS: u32 = 1;
pub const MAX_SETS: u32 = 20;
pub const MIN_REPS: u32 = 1;
pub const MAX_REPS: u32 = 100;
pub const MIN_WEIGHT: f64 = 0.0;
pub const MAX_WEIGHT: f64 = 1000.0;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_WORKOUTS_PER_PROGRAM: usize = 20;
pub const MAX_EXERCISES_PER_WORKOUT: usize = 50;

/// Flat list of problems, used for whole-program and list checks
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Problems keyed by field name, for inline form messages
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldValidation {
    pub is_valid: bool,
    pub errors: BTreeMap<String, String>,
}

impl FieldValidation {
    fn from_errors(errors: BTreeMap<String, String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    fn into_messages(self, prefix: &str) -> impl Iterator<Item = String> + '_ {
        self.errors
            .into_iter()
            .map(move |(_, message)| format!("{}: {}", prefix, message))
    }
}

pub fn validate_name(label: &str, name: &str) -> Option<String> {
    let len = name.trim().chars().count();
    if len == 0 {
        Some(format!("{} is required", label))
    } else if len > MAX_NAME_LEN {
        Some(format!("{} must be at most {} characters", label, MAX_NAME_LEN))
    } else {
        None
    }
}

pub fn validate_sets(sets: u32) -> Option<String> {
    (!(MIN_SETS..=MAX_SETS).contains(&sets))
        .then(|| format!("Sets must be between {} and {}", MIN_SETS, MAX_SETS))
}

pub fn validate_reps(reps: u32) -> Option<String> {
    (!(MIN_REPS..=MAX_REPS).contains(&reps))
        .then(|| format!("Reps must be between {} and {}", MIN_REPS, MAX_REPS))
}

/// NaN and infinities are out of range
pub fn validate_weight(weight: f64) -> Option<String> {
    (!(weight.is_finite() && (MIN_WEIGHT..=MAX_WEIGHT).contains(&weight)))
        .then(|| format!("Weight must be between {} and {}", MIN_WEIGHT, MAX_WEIGHT))
}

fn check_parameters(errors: &mut BTreeMap<String, String>, sets: u32, reps: u32, weight: f64) {
    if let Some(message) = validate_sets(sets) {
        errors.insert("sets".to_string(), message);
    }
    if let Some(message) = validate_reps(reps) {
        errors.insert("reps".to_string(), message);
    }
    if let Some(message) = validate_weight(weight) {
        errors.insert("weight".to_string(), message);
    }
}

pub fn validate_workout_exercise(entry: &WorkoutExercise) -> FieldValidation {
    let mut errors = BTreeMap::new();
    check_parameters(&mut errors, entry.sets, entry.reps, entry.weight);
    if entry.superset_with == Some(entry.exercise_id) {
        errors.insert(
            "superset_with".to_string(),
            "An exercise cannot be paired with itself".to_string(),
        );
    }
    FieldValidation::from_errors(errors)
}

pub fn validate_baseline(baseline: &Baseline) -> FieldValidation {
    let mut errors = BTreeMap::new();
    check_parameters(&mut errors, baseline.sets, baseline.reps, baseline.weight);
    FieldValidation::from_errors(errors)
}

pub fn validate_exercise_input(input: &ExerciseInput) -> FieldValidation {
    let mut errors = BTreeMap::new();
    if let Some(message) = validate_name("Name", &input.name) {
        errors.insert("name".to_string(), message);
    }
    if let Some(video_url) = input.video_url.as_deref().filter(|u| !u.trim().is_empty()) {
        let is_web = Url::parse(video_url.trim())
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !is_web {
            errors.insert(
                "video_url".to_string(),
                "Video URL must be an http or https link".to_string(),
            );
        }
    }
    FieldValidation::from_errors(errors)
}

/// The workout name plus the structural rules over its entries
pub fn validate_workout(workout: &WorkoutDraft) -> FieldValidation {
    let mut errors = BTreeMap::new();
    if let Some(message) = validate_name("Workout name", &workout.name) {
        errors.insert("name".to_string(), message);
    }

    let report = validate_entries(workout.exercises.entries());
    if !report.is_valid {
        errors.insert("exercises".to_string(), report.errors.join("; "));
    }
    FieldValidation::from_errors(errors)
}

pub(crate) fn validate_entries(entries: &[WorkoutExercise]) -> ValidationReport {
    let mut errors = Vec::new();
    if entries.len() > MAX_EXERCISES_PER_WORKOUT {
        errors.push(format!(
            "A workout can have at most {} exercises",
            MAX_EXERCISES_PER_WORKOUT
        ));
    }
    for entry in entries {
        let prefix = if entry.name.is_empty() {
            format!("Exercise {}", entry.exercise_id)
        } else {
            entry.name.clone()
        };
        errors.extend(validate_workout_exercise(entry).into_messages(&prefix));
    }
    ValidationReport::from_errors(errors)
}

/// Range checks for every baseline plus duplicate detection
pub fn validate_baselines(baselines: &[Baseline]) -> ValidationReport {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for baseline in baselines {
        let prefix = format!("Baseline for exercise {}", baseline.exercise_id);
        if !seen.insert(baseline.exercise_id) {
            errors.push(format!("{}: duplicate baseline", prefix));
        }
        errors.extend(validate_baseline(baseline).into_messages(&prefix));
    }
    ValidationReport::from_errors(errors)
}

pub fn validate_program(draft: &ProgramDraft) -> ValidationReport {
    let mut errors = Vec::new();

    if let Some(message) = validate_name("Program name", &draft.name) {
        errors.push(message);
    }
    if let (Some(start), Some(end)) = (draft.start_date, draft.end_date) {
        if end < start {
            errors.push("End date must not be before the start date".to_string());
        }
    }
    if draft.workouts.len() > MAX_WORKOUTS_PER_PROGRAM {
        errors.push(format!(
            "A program can have at most {} workouts",
            MAX_WORKOUTS_PER_PROGRAM
        ));
    }

    for (index, workout) in draft.workouts.iter().enumerate() {
        let label = if workout.name.trim().is_empty() {
            format!("Workout {}", index + 1)
        } else {
            workout.name.trim().to_string()
        };
        errors.extend(validate_workout(workout).into_messages(&label));
    }

    if draft.program_type == coachdesk_api::ProgramType::Automated {
        let active: Vec<Baseline> = draft.active_baselines().into_iter().cloned().collect();
        errors.extend(validate_baselines(&active).errors);
    }

    ValidationReport::from_errors(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coachdesk_api::{Equipment, ExerciseCategory, ExerciseId};

    fn input(name: &str, video_url: Option<&str>) -> ExerciseInput {
        ExerciseInput {
            name: name.to_string(),
            category: ExerciseCategory::Isolation,
            equipment: Equipment::Cable,
            muscle_group_ids: vec![],
            video_url: video_url.map(str::to_string),
            notes: None,
        }
    }

    #[test]
    fn ranges_are_inclusive() {
        assert!(validate_sets(1).is_none());
        assert!(validate_sets(20).is_none());
        assert!(validate_sets(0).is_some());
        assert!(validate_sets(21).is_some());
        assert!(validate_reps(100).is_none());
        assert!(validate_reps(101).is_some());
        assert!(validate_weight(0.0).is_none());
        assert!(validate_weight(1000.0).is_none());
        assert!(validate_weight(1000.5).is_some());
        assert!(validate_weight(-2.5).is_some());
        assert!(validate_weight(f64::NAN).is_some());
    }

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert!(validate_name("Name", "   ").is_some());
        assert!(validate_name("Name", " Squat ").is_none());
        assert!(validate_name("Name", &"x".repeat(101)).is_some());
        assert!(validate_name("Name", &"x".repeat(100)).is_none());
    }

    #[test]
    fn exercise_input_checks_video_url() {
        let with_video = input("Fly", Some("https://video.example.com/fly"));
        assert!(validate_exercise_input(&with_video).is_valid);
        assert!(validate_exercise_input(&input("Fly", None)).is_valid);

        let report = validate_exercise_input(&input("", Some("ftp://example.com/fly")));
        assert!(!report.is_valid);
        assert!(report.errors.contains_key("name"));
        assert!(report.errors.contains_key("video_url"));
    }

    #[test]
    fn baselines_reject_duplicates() {
        let baseline = |id: i64, weight: f64| Baseline {
            exercise_id: ExerciseId(id),
            sets: 3,
            reps: 8,
            weight,
        };

        assert!(validate_baselines(&[baseline(1, 50.0), baseline(2, 40.0)]).is_valid);

        let report = validate_baselines(&[
            baseline(1, 50.0),
            baseline(1, 55.0),
            baseline(3, 2000.0),
        ]);
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 2);
    }
}
