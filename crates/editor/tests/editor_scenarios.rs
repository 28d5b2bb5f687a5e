use std::sync::Arc;

use chrono::NaiveDate;
use coachdesk_api::{
    ApiClient, Baseline, Equipment, Exercise, ExerciseCategory, ExerciseId, Goal, ProgramType,
    UserId, WorkoutId,
};
use coachdesk_auth::{AuthContext, MemoryTokenStore};
use coachdesk_editor::{
    is_step_valid, ExerciseDefaults, Field, ProgramDraft, ProgramWizard, SyncState, WizardError,
    WizardIssue, WizardStep, WorkoutDraft, WorkoutEditor,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn exercise(id: i64, name: &str) -> Exercise {
    Exercise {
        id: ExerciseId(id),
        name: name.to_string(),
        category: ExerciseCategory::Compound,
        equipment: Equipment::Barbell,
        muscle_groups: vec![],
        video_url: None,
        notes: None,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn assert_symmetric(editor: &WorkoutEditor) {
    for entry in editor.entries() {
        if let Some(partner) = entry.superset_with {
            assert_eq!(
                editor.get(partner).and_then(|p| p.superset_with),
                Some(entry.exercise_id),
                "pairing of {} is one-sided",
                entry.exercise_id
            );
        }
    }
    for other in editor.entries() {
        for entry in editor.entries() {
            let forward = entry.superset_with == Some(other.exercise_id);
            let backward = other.superset_with == Some(entry.exercise_id);
            assert_eq!(forward, backward);
        }
    }
}

fn setup_client(server_uri: &str) -> ApiClient {
    let token = encode(
        &Header::default(),
        &json!({ "userId": 1, "exp": chrono::Utc::now().timestamp() + 3600 }),
        &EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap();
    let http = reqwest::Client::new();
    let store = Arc::new(MemoryTokenStore::with_token(&token));
    let auth = Arc::new(AuthContext::new(server_uri, http.clone(), store));
    ApiClient::new(server_uri, http, auth).unwrap()
}

#[test]
fn test_pairing_stays_symmetric_through_edits() {
    let mut editor = WorkoutEditor::new();
    for id in 1..=6 {
        editor.add_exercise(&exercise(id, &format!("E{}", id)), ExerciseDefaults::default());
    }

    editor.pair(ExerciseId(1), ExerciseId(2)).unwrap();
    assert_symmetric(&editor);
    editor.pair(ExerciseId(3), ExerciseId(6)).unwrap();
    assert_symmetric(&editor);
    assert!(editor.pair(ExerciseId(6), ExerciseId(4)).is_err());
    assert_symmetric(&editor);
    editor.remove_from_superset(ExerciseId(1)).unwrap();
    assert_symmetric(&editor);
    editor.pair(ExerciseId(2), ExerciseId(5)).unwrap();
    assert_symmetric(&editor);
    editor.remove_exercise(ExerciseId(6)).unwrap();
    assert_symmetric(&editor);
    editor.reorder(0, 3).unwrap();
    assert_symmetric(&editor);

    assert_eq!(editor.superset_pairs().len(), 1);
}

#[test]
fn test_reorder_preserves_exercises() {
    let mut editor = WorkoutEditor::new();
    for id in [10, 20, 30, 40] {
        editor.add_exercise(&exercise(id, "E"), ExerciseDefaults::default());
    }

    let before: Vec<ExerciseId> = editor.entries().iter().map(|e| e.exercise_id).collect();
    for (from, to) in [(3, 0), (0, 3), (1, 2), (2, 2)] {
        editor.reorder(from, to).unwrap();
    }
    let mut after: Vec<ExerciseId> = editor.entries().iter().map(|e| e.exercise_id).collect();

    assert_eq!(after.len(), before.len());
    after.sort();
    assert_eq!(after, before);
}

#[test]
fn test_increment_decrement_round_trip_with_weight() {
    let defaults = ExerciseDefaults {
        sets: 4,
        reps: 8,
        weight: 42.5,
    };
    let mut editor = WorkoutEditor::new();
    editor.add_exercise(&exercise(1, "Squat"), defaults);

    for _ in 0..13 {
        editor.increment(ExerciseId(1), Field::Weight).unwrap();
    }
    assert_eq!(editor.get(ExerciseId(1)).unwrap().weight, 75.0);
    for _ in 0..13 {
        editor.decrement(ExerciseId(1), Field::Weight).unwrap();
    }
    assert_eq!(editor.get(ExerciseId(1)).unwrap().weight, 42.5);
}

#[test]
fn test_save_payload_has_each_pair_once() {
    let mut editor = WorkoutEditor::new();
    editor.add_exercise(&exercise(7, "Row"), ExerciseDefaults::default());
    editor.add_exercise(&exercise(5, "Bench"), ExerciseDefaults::default());

    editor.begin_superset(ExerciseId(5)).unwrap();
    editor.complete_superset(ExerciseId(7)).unwrap();

    assert_eq!(editor.get(ExerciseId(5)).unwrap().superset_with, Some(ExerciseId(7)));
    assert_eq!(editor.get(ExerciseId(7)).unwrap().superset_with, Some(ExerciseId(5)));

    let payload = editor.save_payload(WorkoutId(20));
    assert_eq!(payload.exercises.len(), 2);
    assert_eq!(payload.exercises[1].id, ExerciseId(5));
    assert_eq!(
        (payload.exercises[1].sets, payload.exercises[1].reps, payload.exercises[1].weight),
        (3, 10, 0.0)
    );
    assert_eq!(payload.supersets.len(), 1);
    assert!(payload.supersets[0].same_as(ExerciseId(5), ExerciseId(7)));
}

#[test]
fn test_empty_workout_locks_exercise_step() {
    let mut draft = ProgramDraft::new("Split", Goal::Strength);
    draft.user_id = Some(UserId(3));
    draft.start_date = Some(date(2024, 5, 1));
    let mut upper = WorkoutDraft::new("Upper");
    upper
        .exercises
        .add_exercise(&exercise(1, "Press"), ExerciseDefaults::default());
    draft.workouts = vec![upper, WorkoutDraft::new("Lower")];

    assert!(!is_step_valid(&draft, WizardStep::Exercises));

    let mut wizard = ProgramWizard::new(draft);
    wizard.set_program_type(ProgramType::Automated);
    wizard.go_to(WizardStep::Exercises).unwrap();
    assert!(!wizard.can_proceed_to_step(WizardStep::Baselines));
    assert!(matches!(
        wizard.next(),
        Err(WizardError::StepLocked { step: WizardStep::Baselines, .. })
    ));
    assert!(!wizard.ready_to_submit());
}

#[test]
fn test_end_date_before_start_blocks_submission() {
    let mut draft = ProgramDraft::new("Cut", Goal::Hypertrophy);
    draft.user_id = Some(UserId(3));
    draft.start_date = Some(date(2024, 3, 10));
    draft.end_date = Some(date(2024, 3, 1));

    let mut wizard = ProgramWizard::new(draft);
    match wizard.next() {
        Err(WizardError::StepLocked { issues, .. }) => {
            assert!(matches!(issues[0], WizardIssue::EndBeforeStart { .. }));
        }
        other => panic!("expected StepLocked, got {:?}", other),
    }
    assert!(matches!(
        wizard.build_submission(),
        Err(WizardError::Invalid { .. })
    ));
}

#[test]
fn test_automated_program_missing_baseline_is_blocked() {
    let mut draft = ProgramDraft::new("Auto", Goal::Strength);
    draft.program_type = ProgramType::Automated;
    draft.user_id = Some(UserId(3));
    draft.start_date = Some(date(2024, 1, 1));

    let mut push = WorkoutDraft::new("Push");
    push.exercises
        .add_exercise(&exercise(5, "Bench"), ExerciseDefaults::default());
    let mut pull = WorkoutDraft::new("Pull");
    pull.exercises
        .add_exercise(&exercise(7, "Row"), ExerciseDefaults::default());
    draft.workouts = vec![push, pull];
    draft.baselines.push(Baseline {
        exercise_id: ExerciseId(5),
        sets: 3,
        reps: 10,
        weight: 60.0,
    });

    assert!(!is_step_valid(&draft, WizardStep::Baselines));

    let wizard = ProgramWizard::new(draft);
    match wizard.build_submission() {
        Err(WizardError::Invalid { issues, .. }) => {
            assert_eq!(
                issues,
                vec![WizardIssue::MissingBaseline {
                    exercise_id: ExerciseId(7),
                    name: "Row".to_string()
                }]
            );
        }
        other => panic!("expected Invalid, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_save_sends_payload_and_marks_saved() {
    let server = MockServer::start().await;
    let client = setup_client(&server.uri());

    Mock::given(method("POST"))
        .and(path("/api/v2/exercises/upsertExercisesToWorkout"))
        .and(body_json(json!({
            "workout_id": 20,
            "exercises": [
                { "id": 7, "sets": 3, "reps": 10, "weight": 0.0 },
                { "id": 5, "sets": 3, "reps": 10, "weight": 2.5 }
            ],
            "supersets": [{ "first_exercise_id": 7, "second_exercise_id": 5 }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut editor = WorkoutEditor::new();
    editor.add_exercise(&exercise(7, "Row"), ExerciseDefaults::default());
    editor.add_exercise(&exercise(5, "Bench"), ExerciseDefaults::default());
    editor.increment(ExerciseId(5), Field::Weight).unwrap();
    editor.pair(ExerciseId(5), ExerciseId(7)).unwrap();

    editor.save(&client, WorkoutId(20)).await.unwrap();
    assert_eq!(editor.sync_state(), &SyncState::Saved);
}

#[tokio::test]
async fn test_failed_save_keeps_local_edits() {
    let server = MockServer::start().await;
    let client = setup_client(&server.uri());

    Mock::given(method("POST"))
        .and(path("/api/v2/exercises/upsertExercisesToWorkout"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "Database unavailable" })),
        )
        .mount(&server)
        .await;

    let mut editor = WorkoutEditor::new();
    editor.add_exercise(&exercise(5, "Bench"), ExerciseDefaults::default());
    editor.increment(ExerciseId(5), Field::Sets).unwrap();
    let before = editor.entries().to_vec();

    assert!(editor.save(&client, WorkoutId(20)).await.is_err());
    assert_eq!(editor.entries(), before.as_slice());
    match editor.sync_state() {
        SyncState::SaveFailed { message } => assert!(message.contains("Database unavailable")),
        other => panic!("expected SaveFailed, got {:?}", other),
    }
}
