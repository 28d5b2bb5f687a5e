use coachdesk_api::ExerciseId;
use thiserror::Error;

use crate::wizard::{WizardIssue, WizardStep};

/// Rejected editor transitions. State is unchanged when one is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("No exercise {0} in this workout")]
    UnknownExercise(ExerciseId),

    #[error("Index {index} is out of bounds for {len} exercises")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("No exercise is waiting for a superset partner")]
    NoPendingSuperset,

    #[error("An exercise cannot be paired with itself")]
    SelfSuperset,

    #[error("Exercise {0} is already in a superset")]
    AlreadyInSuperset(ExerciseId),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardError {
    #[error("Cannot go to {step}: {}", join(.issues))]
    StepLocked {
        step: WizardStep,
        issues: Vec<WizardIssue>,
    },

    #[error("{0} does not apply to this program")]
    StepNotApplicable(WizardStep),

    #[error("Already at the last step")]
    AtLastStep,

    #[error("Program is not ready to submit: {}", .errors.join("; "))]
    Invalid {
        issues: Vec<WizardIssue>,
        errors: Vec<String>,
    },

    #[error(transparent)]
    Editor(#[from] EditorError),
}

fn join(issues: &[WizardIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
