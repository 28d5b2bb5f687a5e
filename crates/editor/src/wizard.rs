//! Multi-step program creation
//!
//! The wizard walks a [`ProgramDraft`] through four steps. Moving forward to
//! a step re-checks every step before it, so edits made after passing a step
//! can lock the later ones again.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use coachdesk_api::{
    Baseline, CreateProgramRequest, CreateProgramWithWorkouts, ExerciseId, Goal, NewWorkout,
    ProgramType, UserId, WorkoutExercise,
};
use thiserror::Error;
use tracing::debug;

use crate::editor::WorkoutEditor;
use crate::error::WizardError;
use crate::submission::ProgramSubmission;
use crate::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    ProgramDetails = 1,
    Workouts = 2,
    Exercises = 3,
    /// Only for AUTOMATED programs
    Baselines = 4,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::ProgramDetails,
        WizardStep::Workouts,
        WizardStep::Exercises,
        WizardStep::Baselines,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.number() == number)
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::ProgramDetails => "Program details",
            WizardStep::Workouts => "Workouts",
            WizardStep::Exercises => "Exercises",
            WizardStep::Baselines => "Baselines",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.number().checked_sub(1).and_then(Self::from_number)
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.title())
    }
}

/// A reason a step is not complete
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardIssue {
    #[error("Program name is required")]
    MissingName,

    #[error("A client must be selected")]
    MissingUser,

    #[error("Start date is required")]
    MissingStartDate,

    #[error("End date {end} is before the start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("Add at least one workout")]
    NoWorkouts,

    #[error("Workout {} needs a name", .index + 1)]
    UnnamedWorkout { index: usize },

    #[error("Workout {name:?} has no exercises")]
    EmptyWorkout { index: usize, name: String },

    #[error("{name} has no baseline")]
    MissingBaseline { exercise_id: ExerciseId, name: String },
}

impl WizardIssue {
    /// The step this issue belongs to
    pub fn step(&self) -> WizardStep {
        match self {
            WizardIssue::MissingName
            | WizardIssue::MissingUser
            | WizardIssue::MissingStartDate
            | WizardIssue::EndBeforeStart { .. } => WizardStep::ProgramDetails,
            WizardIssue::NoWorkouts | WizardIssue::UnnamedWorkout { .. } => WizardStep::Workouts,
            WizardIssue::EmptyWorkout { .. } => WizardStep::Exercises,
            WizardIssue::MissingBaseline { .. } => WizardStep::Baselines,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkoutDraft {
    pub name: String,
    pub exercises: WorkoutEditor,
}

impl WorkoutDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exercises: WorkoutEditor::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramDraft {
    pub name: String,
    pub goal: Goal,
    pub program_type: ProgramType,
    pub user_id: Option<UserId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub workouts: Vec<WorkoutDraft>,
    pub baselines: Vec<Baseline>,
}

impl ProgramDraft {
    pub fn new(name: impl Into<String>, goal: Goal) -> Self {
        Self {
            name: name.into(),
            goal,
            program_type: ProgramType::default(),
            user_id: None,
            start_date: None,
            end_date: None,
            workouts: Vec::new(),
            baselines: Vec::new(),
        }
    }

    pub fn all_exercises(&self) -> impl Iterator<Item = &WorkoutExercise> {
        self.workouts
            .iter()
            .flat_map(|workout| workout.exercises.entries())
    }

    /// Exercise ids across every workout, first occurrence order
    pub fn unique_exercise_ids(&self) -> Vec<ExerciseId> {
        self.unique_exercises()
            .into_iter()
            .map(|entry| entry.exercise_id)
            .collect()
    }

    /// Baselines whose exercise is still part of some workout
    pub fn active_baselines(&self) -> Vec<&Baseline> {
        let in_program = self.unique_exercise_ids();
        self.baselines
            .iter()
            .filter(|b| in_program.contains(&b.exercise_id))
            .collect()
    }

    pub fn baseline_for(&self, id: ExerciseId) -> Option<&Baseline> {
        self.baselines.iter().find(|b| b.exercise_id == id)
    }

    /// Entries whose exercise has no baseline yet, one per exercise
    pub fn missing_baselines(&self) -> Vec<&WorkoutExercise> {
        self.unique_exercises()
            .into_iter()
            .filter(|entry| self.baseline_for(entry.exercise_id).is_none())
            .collect()
    }

    fn unique_exercises(&self) -> Vec<&WorkoutExercise> {
        let mut seen = BTreeSet::new();
        self.all_exercises()
            .filter(|entry| seen.insert(entry.exercise_id))
            .collect()
    }
}

/// Everything keeping `step` from being complete
pub fn step_issues(draft: &ProgramDraft, step: WizardStep) -> Vec<WizardIssue> {
    let mut issues = Vec::new();
    match step {
        WizardStep::ProgramDetails => {
            if draft.name.trim().is_empty() {
                issues.push(WizardIssue::MissingName);
            }
            if draft.user_id.is_none() {
                issues.push(WizardIssue::MissingUser);
            }
            match (draft.start_date, draft.end_date) {
                (None, _) => issues.push(WizardIssue::MissingStartDate),
                (Some(start), Some(end)) if end < start => {
                    issues.push(WizardIssue::EndBeforeStart { start, end })
                }
                _ => {}
            }
        }
        WizardStep::Workouts => {
            if draft.workouts.is_empty() {
                issues.push(WizardIssue::NoWorkouts);
            }
            for (index, workout) in draft.workouts.iter().enumerate() {
                if workout.name.trim().is_empty() {
                    issues.push(WizardIssue::UnnamedWorkout { index });
                }
            }
        }
        WizardStep::Exercises => {
            for (index, workout) in draft.workouts.iter().enumerate() {
                if workout.exercises.is_empty() {
                    issues.push(WizardIssue::EmptyWorkout {
                        index,
                        name: workout.name.trim().to_string(),
                    });
                }
            }
        }
        WizardStep::Baselines => {
            if draft.program_type == ProgramType::Automated {
                issues.extend(draft.missing_baselines().into_iter().map(|entry| {
                    WizardIssue::MissingBaseline {
                        exercise_id: entry.exercise_id,
                        name: entry.name.clone(),
                    }
                }));
            }
        }
    }
    issues
}

pub fn is_step_valid(draft: &ProgramDraft, step: WizardStep) -> bool {
    step_issues(draft, step).is_empty()
}

#[derive(Debug, Clone)]
pub struct ProgramWizard {
    draft: ProgramDraft,
    current: WizardStep,
    completed: BTreeSet<u8>,
}

impl ProgramWizard {
    pub fn new(draft: ProgramDraft) -> Self {
        Self {
            draft,
            current: WizardStep::ProgramDetails,
            completed: BTreeSet::new(),
        }
    }

    pub fn draft(&self) -> &ProgramDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ProgramDraft {
        &mut self.draft
    }

    pub fn into_draft(self) -> ProgramDraft {
        self.draft
    }

    pub fn current(&self) -> WizardStep {
        self.current
    }

    /// The steps that apply to the draft's program type
    pub fn steps(&self) -> Vec<WizardStep> {
        WizardStep::ALL
            .into_iter()
            .filter(|step| self.is_applicable(*step))
            .collect()
    }

    pub fn is_applicable(&self, step: WizardStep) -> bool {
        step != WizardStep::Baselines || self.draft.program_type == ProgramType::Automated
    }

    /// Issues in the steps before `step` that keep it locked
    pub fn blocking_issues(&self, step: WizardStep) -> Vec<WizardIssue> {
        WizardStep::ALL
            .into_iter()
            .filter(|earlier| *earlier < step)
            .flat_map(|earlier| step_issues(&self.draft, earlier))
            .collect()
    }

    pub fn can_proceed_to_step(&self, step: WizardStep) -> bool {
        self.is_applicable(step) && self.blocking_issues(step).is_empty()
    }

    pub fn go_to(&mut self, step: WizardStep) -> Result<(), WizardError> {
        if !self.is_applicable(step) {
            return Err(WizardError::StepNotApplicable(step));
        }
        if step > self.current {
            let issues = self.blocking_issues(step);
            if !issues.is_empty() {
                return Err(WizardError::StepLocked { step, issues });
            }
            for earlier in WizardStep::ALL.into_iter().filter(|s| *s < step) {
                self.completed.insert(earlier.number());
            }
        }
        debug!("wizard moved from {} to {}", self.current, step);
        self.current = step;
        Ok(())
    }

    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        let next = self
            .current
            .next()
            .filter(|step| self.is_applicable(*step))
            .ok_or(WizardError::AtLastStep)?;
        self.go_to(next)?;
        Ok(next)
    }

    /// Going back is never blocked. Stays put on the first step.
    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.current.previous() {
            self.current = previous;
        }
        self.current
    }

    pub fn completed_steps(&self) -> Vec<WizardStep> {
        self.completed
            .iter()
            .filter_map(|n| WizardStep::from_number(*n))
            .collect()
    }

    pub fn is_completed(&self, step: WizardStep) -> bool {
        self.completed.contains(&step.number())
    }

    /// Switching to MANUAL drops the baselines step from the flow.
    pub fn set_program_type(&mut self, program_type: ProgramType) {
        self.draft.program_type = program_type;
        if !self.is_applicable(WizardStep::Baselines) {
            self.completed.remove(&WizardStep::Baselines.number());
            if self.current == WizardStep::Baselines {
                self.current = WizardStep::Exercises;
            }
        }
    }

    /// Whether [`ProgramWizard::build_submission`] would succeed
    pub fn ready_to_submit(&self) -> bool {
        self.submission_issues().is_empty() && validation::validate_program(&self.draft).is_valid
    }

    /// Add or replace the baseline for `baseline.exercise_id`
    pub fn set_baseline(&mut self, baseline: Baseline) {
        match self
            .draft
            .baselines
            .iter_mut()
            .find(|b| b.exercise_id == baseline.exercise_id)
        {
            Some(existing) => *existing = baseline,
            None => self.draft.baselines.push(baseline),
        }
    }

    pub fn remove_baseline(&mut self, id: ExerciseId) -> Option<Baseline> {
        let index = self
            .draft
            .baselines
            .iter()
            .position(|b| b.exercise_id == id)?;
        Some(self.draft.baselines.remove(index))
    }

    /// Give every exercise without a baseline one taken from its current
    /// workout parameters. Returns how many were added.
    pub fn seed_baselines(&mut self) -> usize {
        let seeded: Vec<Baseline> = self
            .draft
            .missing_baselines()
            .into_iter()
            .map(|entry| Baseline {
                exercise_id: entry.exercise_id,
                sets: entry.sets,
                reps: entry.reps,
                weight: entry.weight,
            })
            .collect();
        let count = seeded.len();
        self.draft.baselines.extend(seeded);
        count
    }

    pub fn missing_baselines(&self) -> Vec<ExerciseId> {
        self.draft
            .missing_baselines()
            .into_iter()
            .map(|entry| entry.exercise_id)
            .collect()
    }

    /// Check the whole draft and turn it into a submission.
    ///
    /// Nothing is sent: a draft that fails any applicable step or any
    /// validation rule is rejected here.
    pub fn build_submission(&self) -> Result<ProgramSubmission, WizardError> {
        let issues = self.submission_issues();
        let report = validation::validate_program(&self.draft);

        let invalid = |issues: Vec<WizardIssue>, rules: Vec<String>| {
            let errors = issues.iter().map(ToString::to_string).chain(rules).collect();
            WizardError::Invalid { issues, errors }
        };

        if !issues.is_empty() || !report.is_valid {
            return Err(invalid(issues, report.errors));
        }
        let (Some(user_id), Some(start_date)) = (self.draft.user_id, self.draft.start_date) else {
            return Err(invalid(
                vec![WizardIssue::MissingUser, WizardIssue::MissingStartDate],
                Vec::new(),
            ));
        };

        let request = CreateProgramWithWorkouts {
            program: CreateProgramRequest {
                name: self.draft.name.trim().to_string(),
                goal: self.draft.goal,
                program_type: self.draft.program_type,
                start_date,
                end_date: self.draft.end_date,
                user_id,
            },
            workouts: self
                .draft
                .workouts
                .iter()
                .map(|workout| NewWorkout {
                    name: workout.name.trim().to_string(),
                })
                .collect(),
        };

        let baselines = match self.draft.program_type {
            ProgramType::Manual => Vec::new(),
            ProgramType::Automated => self.draft.active_baselines().into_iter().cloned().collect(),
        };

        let editors = self
            .draft
            .workouts
            .iter()
            .map(|workout| workout.exercises.clone())
            .collect();

        Ok(ProgramSubmission::new(request, editors, baselines))
    }

    fn submission_issues(&self) -> Vec<WizardIssue> {
        self.steps()
            .into_iter()
            .flat_map(|step| step_issues(&self.draft, step))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ExerciseDefaults;
    use coachdesk_api::{Equipment, Exercise, ExerciseCategory};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn exercise(id: i64, name: &str) -> Exercise {
        Exercise {
            id: ExerciseId(id),
            name: name.to_string(),
            category: ExerciseCategory::Compound,
            equipment: Equipment::Dumbbell,
            muscle_groups: vec![],
            video_url: None,
            notes: None,
        }
    }

    fn details_done() -> ProgramDraft {
        let mut draft = ProgramDraft::new("Hypertrophy A", Goal::Hypertrophy);
        draft.user_id = Some(UserId(2));
        draft.start_date = Some(date(2024, 1, 1));
        draft
    }

    #[test]
    fn step_numbers_round_trip() {
        for step in WizardStep::ALL {
            assert_eq!(WizardStep::from_number(step.number()), Some(step));
        }
        assert_eq!(WizardStep::from_number(5), None);
        assert_eq!(WizardStep::ProgramDetails.previous(), None);
        assert_eq!(WizardStep::Exercises.next(), Some(WizardStep::Baselines));
    }

    #[test]
    fn end_date_before_start_fails_step_one() {
        let mut draft = details_done();
        draft.start_date = Some(date(2024, 3, 10));
        draft.end_date = Some(date(2024, 3, 1));

        let issues = step_issues(&draft, WizardStep::ProgramDetails);
        assert_eq!(
            issues,
            vec![WizardIssue::EndBeforeStart {
                start: date(2024, 3, 10),
                end: date(2024, 3, 1),
            }]
        );

        draft.end_date = Some(date(2024, 3, 10));
        assert!(is_step_valid(&draft, WizardStep::ProgramDetails));
    }

    #[test]
    fn missing_details_are_all_reported() {
        let draft = ProgramDraft::new("  ", Goal::Strength);
        assert_eq!(
            step_issues(&draft, WizardStep::ProgramDetails),
            vec![
                WizardIssue::MissingName,
                WizardIssue::MissingUser,
                WizardIssue::MissingStartDate
            ]
        );
    }

    #[test]
    fn forward_navigation_rechecks_every_earlier_step() {
        let mut draft = details_done();
        draft.workouts.push(WorkoutDraft::new("Push"));
        let mut wizard = ProgramWizard::new(draft);

        assert_eq!(wizard.next(), Ok(WizardStep::Workouts));
        assert_eq!(wizard.next(), Ok(WizardStep::Exercises));

        wizard.back();
        wizard.back();
        wizard.draft_mut().name.clear();

        assert!(!wizard.can_proceed_to_step(WizardStep::Exercises));
        match wizard.go_to(WizardStep::Exercises) {
            Err(WizardError::StepLocked { step, issues }) => {
                assert_eq!(step, WizardStep::Exercises);
                assert_eq!(issues, vec![WizardIssue::MissingName]);
            }
            other => panic!("expected StepLocked, got {:?}", other),
        }
        assert_eq!(wizard.current(), WizardStep::ProgramDetails);
    }

    #[test]
    fn baselines_step_only_for_automated_programs() {
        let mut draft = details_done();
        let mut push = WorkoutDraft::new("Push");
        push.exercises.add_exercise(&exercise(5, "Bench"), ExerciseDefaults::default());
        draft.workouts.push(push);

        let mut wizard = ProgramWizard::new(draft);
        wizard.go_to(WizardStep::Exercises).unwrap();
        assert_eq!(wizard.next(), Err(WizardError::AtLastStep));
        assert_eq!(
            wizard.go_to(WizardStep::Baselines),
            Err(WizardError::StepNotApplicable(WizardStep::Baselines))
        );

        wizard.set_program_type(ProgramType::Automated);
        assert_eq!(wizard.steps().len(), 4);
        assert_eq!(wizard.next(), Ok(WizardStep::Baselines));
        assert!(!wizard.ready_to_submit());

        wizard.set_program_type(ProgramType::Manual);
        assert_eq!(wizard.current(), WizardStep::Exercises);
        assert!(!wizard.is_completed(WizardStep::Baselines));
        assert!(wizard.ready_to_submit());
    }

    #[test]
    fn set_baseline_replaces_and_seed_fills_gaps() {
        let mut draft = details_done();
        draft.program_type = ProgramType::Automated;
        let mut push = WorkoutDraft::new("Push");
        push.exercises.add_exercise(&exercise(5, "Bench"), ExerciseDefaults::default());
        push.exercises.add_exercise(&exercise(7, "Row"), ExerciseDefaults::default());
        let mut pull = WorkoutDraft::new("Pull");
        pull.exercises.add_exercise(&exercise(7, "Row"), ExerciseDefaults::default());
        draft.workouts = vec![push, pull];

        let mut wizard = ProgramWizard::new(draft);
        assert_eq!(wizard.missing_baselines(), vec![ExerciseId(5), ExerciseId(7)]);

        let baseline = |weight: f64| Baseline {
            exercise_id: ExerciseId(5),
            sets: 4,
            reps: 6,
            weight,
        };
        wizard.set_baseline(baseline(60.0));
        wizard.set_baseline(baseline(62.5));
        assert_eq!(wizard.draft().baselines, vec![baseline(62.5)]);

        assert_eq!(wizard.seed_baselines(), 1);
        assert!(wizard.missing_baselines().is_empty());
        assert!(is_step_valid(wizard.draft(), WizardStep::Baselines));

        assert_eq!(wizard.remove_baseline(ExerciseId(7)).map(|b| b.reps), Some(10));
        assert_eq!(wizard.missing_baselines(), vec![ExerciseId(7)]);
    }

    #[test]
    fn build_submission_trims_names() {
        let mut draft = details_done();
        draft.name = "  Hypertrophy A ".to_string();
        let mut push = WorkoutDraft::new(" Push ");
        push.exercises.add_exercise(&exercise(5, "Bench"), ExerciseDefaults::default());
        draft.workouts.push(push);
        draft.baselines.push(Baseline {
            exercise_id: ExerciseId(5),
            sets: 3,
            reps: 10,
            weight: 0.0,
        });

        let submission = ProgramWizard::new(draft).build_submission().unwrap();
        let request = submission.request();
        assert_eq!(request.program.name, "Hypertrophy A");
        assert_eq!(request.workouts[0].name, "Push");
        assert!(submission.baselines().is_empty());
    }

    #[test]
    fn baselines_for_removed_exercises_do_not_block_submission() {
        let mut draft = details_done();
        let mut push = WorkoutDraft::new("Push");
        push.exercises.add_exercise(&exercise(5, "Bench"), ExerciseDefaults::default());
        push.exercises.add_exercise(&exercise(9, "Dips"), ExerciseDefaults::default());
        draft.workouts.push(push);

        let mut wizard = ProgramWizard::new(draft);
        wizard.set_program_type(ProgramType::Automated);
        wizard.set_baseline(Baseline {
            exercise_id: ExerciseId(9),
            sets: 0,
            reps: 0,
            weight: 0.0,
        });
        wizard.seed_baselines();
        assert!(!wizard.ready_to_submit());

        wizard.draft_mut().workouts[0]
            .exercises
            .remove_exercise(ExerciseId(9))
            .unwrap();

        assert!(wizard.missing_baselines().is_empty());
        assert!(wizard.ready_to_submit());
        let submission = wizard.build_submission().unwrap();
        let ids: Vec<ExerciseId> = submission.baselines().iter().map(|b| b.exercise_id).collect();
        assert_eq!(ids, vec![ExerciseId(5)]);
    }
}
