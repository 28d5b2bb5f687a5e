//! Workout editing for the coachdesk client
//!
//! - [`WorkoutEditor`] holds one workout's ordered exercises and their
//!   superset pairings.
//! - [`ProgramWizard`] gates the four steps of program creation.
//! - [`ProgramSubmission`] sends a finished draft and reports partial commits.
//! - [`validation`] has the range and structure rules shared by all three.
//!
//! Nothing here performs I/O except `WorkoutEditor::save` and
//! `ProgramSubmission::run`, and both go through [`coachdesk_api::ProgramApi`].

mod editor;
mod error;
mod submission;
pub mod validation;
mod wizard;

pub use editor::{ExerciseDefaults, Field, SyncState, WorkoutEditor, WEIGHT_STEP};
pub use error::{EditorError, WizardError};
pub use submission::{ProgramSubmission, SubmissionOutcome, SubmissionStep, SubmissionTracker};
pub use validation::{FieldValidation, ValidationReport};
pub use wizard::{
    is_step_valid, step_issues, ProgramDraft, ProgramWizard, WizardIssue, WizardStep,
    WorkoutDraft,
};
