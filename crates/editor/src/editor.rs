//! Exercise order and superset editor for one workout
//!
//! Entries are keyed by exercise id. Every transition keeps superset pairings
//! mutual: if A points at B then B points at A, and removing either side
//! clears both.

use std::fmt;
use std::str::FromStr;

use coachdesk_api::{
    ApiError, Exercise, ExerciseId, ExerciseParams, ProgramApi, SupersetPair,
    UpsertWorkoutExercises, WorkoutExercise, WorkoutId,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::EditorError;
use crate::validation::{self, ValidationReport};

/// Kilograms added or removed per weight step
pub const WEIGHT_STEP: f64 = 2.5;

/// The adjustable parameters of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Sets,
    Reps,
    Weight,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Sets => "sets",
            Field::Reps => "reps",
            Field::Weight => "weight",
        })
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sets" => Ok(Field::Sets),
            "reps" => Ok(Field::Reps),
            "weight" => Ok(Field::Weight),
            _ => Err(format!("unknown field: {}", s)),
        }
    }
}

/// Parameters given to a newly added exercise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseDefaults {
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
}

impl Default for ExerciseDefaults {
    fn default() -> Self {
        Self {
            sets: 3,
            reps: 10,
            weight: 0.0,
        }
    }
}

/// How local state relates to what the server last accepted.
///
/// Local state is optimistic: a failed save leaves the edits in place and
/// only a fresh fetch brings the editor back in line with the server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncState {
    /// Loaded from the server and untouched
    #[default]
    Clean,
    Unsaved,
    Saved,
    SaveFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkoutEditor {
    entries: Vec<WorkoutExercise>,
    superset_selection: Option<ExerciseId>,
    sync: SyncState,
}

impl WorkoutEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an editor from entries fetched from the server.
    ///
    /// Entries are sorted by `order`. Duplicate exercise ids keep their first
    /// occurrence, and one-sided or dangling pairings are cleared.
    pub fn from_entries(mut entries: Vec<WorkoutExercise>) -> Self {
        entries.sort_by_key(|entry| entry.order);

        let mut unique: Vec<WorkoutExercise> = Vec::with_capacity(entries.len());
        for entry in entries {
            if unique.iter().any(|e| e.exercise_id == entry.exercise_id) {
                warn!("dropping duplicate entry for exercise {}", entry.exercise_id);
                continue;
            }
            unique.push(entry);
        }

        let mut editor = Self {
            entries: unique,
            superset_selection: None,
            sync: SyncState::Clean,
        };
        editor.repair_pairings();
        editor.renumber();
        editor
    }

    pub fn entries(&self) -> &[WorkoutExercise] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: ExerciseId) -> Option<&WorkoutExercise> {
        self.entries.iter().find(|entry| entry.exercise_id == id)
    }

    pub fn contains(&self, id: ExerciseId) -> bool {
        self.get(id).is_some()
    }

    /// The entry waiting for a superset partner
    pub fn superset_selection(&self) -> Option<ExerciseId> {
        self.superset_selection
    }

    pub fn sync_state(&self) -> &SyncState {
        &self.sync
    }

    /// Move the entry at `from` to `to`, keeping every other entry's
    /// relative position.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), EditorError> {
        let len = self.entries.len();
        for index in [from, to] {
            if index >= len {
                return Err(EditorError::IndexOutOfBounds { index, len });
            }
        }

        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        self.renumber();
        self.touch();
        Ok(())
    }

    /// Sets and reps go up by one, weight by [`WEIGHT_STEP`]. No ceiling is
    /// applied here; validation catches out-of-range values before saving.
    pub fn increment(&mut self, id: ExerciseId, field: Field) -> Result<(), EditorError> {
        let index = self.index_of(id)?;
        let entry = &mut self.entries[index];
        match field {
            Field::Sets => entry.sets = entry.sets.saturating_add(1),
            Field::Reps => entry.reps = entry.reps.saturating_add(1),
            Field::Weight => entry.weight = round_weight(entry.weight + WEIGHT_STEP),
        }
        self.touch();
        Ok(())
    }

    /// The reverse of [`WorkoutEditor::increment`], floored at zero.
    pub fn decrement(&mut self, id: ExerciseId, field: Field) -> Result<(), EditorError> {
        let index = self.index_of(id)?;
        let entry = &mut self.entries[index];
        match field {
            Field::Sets => entry.sets = entry.sets.saturating_sub(1),
            Field::Reps => entry.reps = entry.reps.saturating_sub(1),
            Field::Weight => entry.weight = round_weight((entry.weight - WEIGHT_STEP).max(0.0)),
        }
        self.touch();
        Ok(())
    }

    /// Select `id` as the first half of a superset. Selecting the same entry
    /// again cancels the selection.
    pub fn begin_superset(&mut self, id: ExerciseId) -> Result<(), EditorError> {
        if self.superset_selection == Some(id) {
            self.superset_selection = None;
            return Ok(());
        }

        let index = self.index_of(id)?;
        if self.entries[index].superset_with.is_some() {
            return Err(EditorError::AlreadyInSuperset(id));
        }
        self.superset_selection = Some(id);
        Ok(())
    }

    pub fn cancel_superset(&mut self) {
        self.superset_selection = None;
    }

    /// Pair the pending selection with `id`. Both sides are written in the
    /// same transition.
    pub fn complete_superset(&mut self, id: ExerciseId) -> Result<(), EditorError> {
        let pending = self
            .superset_selection
            .ok_or(EditorError::NoPendingSuperset)?;
        if pending == id {
            return Err(EditorError::SelfSuperset);
        }

        let first = self.index_of(pending)?;
        let second = self.index_of(id)?;
        if self.entries[first].superset_with.is_some() {
            return Err(EditorError::AlreadyInSuperset(pending));
        }
        if self.entries[second].superset_with.is_some() {
            return Err(EditorError::AlreadyInSuperset(id));
        }

        self.entries[first].superset_with = Some(id);
        self.entries[second].superset_with = Some(pending);
        self.superset_selection = None;
        self.touch();
        Ok(())
    }

    /// Shorthand for `begin_superset(a)` followed by `complete_superset(b)`.
    ///
    /// A pending selection of some other entry is kept.
    pub fn pair(&mut self, a: ExerciseId, b: ExerciseId) -> Result<(), EditorError> {
        let previous = self.superset_selection;
        self.superset_selection = None;
        let result = self.begin_superset(a).and_then(|()| self.complete_superset(b));
        self.superset_selection = match (&result, previous) {
            (Ok(()), Some(id)) if id == a || id == b => None,
            _ => previous,
        };
        result
    }

    /// Dissolve the superset `id` belongs to.
    ///
    /// If the partner cannot be found the request side is still cleared and
    /// the inconsistency is logged.
    pub fn remove_from_superset(&mut self, id: ExerciseId) -> Result<(), EditorError> {
        let index = self.index_of(id)?;
        let Some(partner) = self.entries[index].superset_with.take() else {
            return Ok(());
        };

        match self.entries.iter_mut().find(|e| e.exercise_id == partner) {
            Some(other) if other.superset_with == Some(id) => other.superset_with = None,
            Some(other) => warn!(
                "superset partner {} of {} points at {:?}, cleared {} only",
                partner, id, other.superset_with, id
            ),
            None => warn!(
                "superset partner {} of {} is missing, cleared {} only",
                partner, id, id
            ),
        }
        self.touch();
        Ok(())
    }

    /// Remove an entry. A partner still referencing it loses its pairing.
    pub fn remove_exercise(&mut self, id: ExerciseId) -> Result<WorkoutExercise, EditorError> {
        let index = self.index_of(id)?;
        let removed = self.entries.remove(index);

        for entry in self.entries.iter_mut() {
            if entry.superset_with == Some(id) {
                entry.superset_with = None;
            }
        }
        if self.superset_selection == Some(id) {
            self.superset_selection = None;
        }

        self.renumber();
        self.touch();
        Ok(removed)
    }

    /// Append `exercise` unless it is already in the workout. Returns whether
    /// an entry was added.
    pub fn add_exercise(&mut self, exercise: &Exercise, defaults: ExerciseDefaults) -> bool {
        if self.contains(exercise.id) {
            return false;
        }

        self.entries.push(WorkoutExercise {
            exercise_id: exercise.id,
            name: exercise.name.clone(),
            sets: defaults.sets,
            reps: defaults.reps,
            weight: defaults.weight,
            superset_with: None,
            order: self.entries.len() as u32,
        });
        self.touch();
        true
    }

    /// Every mutual pairing exactly once, in scan order. The first entry of a
    /// pair to be scanned becomes `first_exercise_id`.
    pub fn superset_pairs(&self) -> Vec<SupersetPair> {
        let mut pairs: Vec<SupersetPair> = Vec::new();
        for entry in &self.entries {
            let Some(partner) = entry.superset_with else {
                continue;
            };
            let mutual = self
                .get(partner)
                .map_or(false, |other| other.superset_with == Some(entry.exercise_id));
            if !mutual || pairs.iter().any(|p| p.same_as(entry.exercise_id, partner)) {
                continue;
            }
            pairs.push(SupersetPair {
                first_exercise_id: entry.exercise_id,
                second_exercise_id: partner,
            });
        }
        pairs
    }

    /// The upsert body that replaces the workout's exercises server-side
    pub fn save_payload(&self, workout_id: WorkoutId) -> UpsertWorkoutExercises {
        UpsertWorkoutExercises {
            workout_id,
            exercises: self
                .entries
                .iter()
                .map(|entry| ExerciseParams {
                    id: entry.exercise_id,
                    sets: entry.sets,
                    reps: entry.reps,
                    weight: entry.weight,
                })
                .collect(),
            supersets: self.superset_pairs(),
        }
    }

    pub fn validate(&self) -> ValidationReport {
        validation::validate_entries(&self.entries)
    }

    /// Send the whole list to the server.
    ///
    /// Local edits are kept whether or not the call succeeds.
    pub async fn save<A>(&mut self, api: &A, workout_id: WorkoutId) -> Result<(), ApiError>
    where
        A: ProgramApi + ?Sized,
    {
        let payload = self.save_payload(workout_id);
        match api.upsert_workout_exercises(&payload).await {
            Ok(()) => {
                info!(
                    "saved {} exercises and {} supersets to workout {}",
                    payload.exercises.len(),
                    payload.supersets.len(),
                    workout_id
                );
                self.sync = SyncState::Saved;
                Ok(())
            }
            Err(err) => {
                warn!("saving workout {} failed: {}", workout_id, err);
                self.sync = SyncState::SaveFailed {
                    message: err.to_string(),
                };
                Err(err)
            }
        }
    }

    fn index_of(&self, id: ExerciseId) -> Result<usize, EditorError> {
        self.entries
            .iter()
            .position(|entry| entry.exercise_id == id)
            .ok_or(EditorError::UnknownExercise(id))
    }

    fn touch(&mut self) {
        self.sync = SyncState::Unsaved;
    }

    fn renumber(&mut self) {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            entry.order = index as u32;
        }
    }

    fn repair_pairings(&mut self) {
        let broken: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| match entry.superset_with {
                None => false,
                Some(partner) if partner == entry.exercise_id => true,
                Some(partner) => self
                    .get(partner)
                    .map_or(true, |other| other.superset_with != Some(entry.exercise_id)),
            })
            .map(|(index, _)| index)
            .collect();

        for index in broken {
            let entry = &mut self.entries[index];
            warn!(
                "clearing one-sided superset {} -> {:?}",
                entry.exercise_id, entry.superset_with
            );
            entry.superset_with = None;
        }
    }
}

/// Weights are kept to two decimals so repeated steps do not drift
fn round_weight(weight: f64) -> f64 {
    (weight * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use coachdesk_api::{Equipment, ExerciseCategory};

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

    fn editor_with(ids: &[i64]) -> WorkoutEditor {
        let mut editor = WorkoutEditor::new();
        for id in ids {
            editor.add_exercise(
                &exercise(*id, &format!("Exercise {}", id)),
                ExerciseDefaults::default(),
            );
        }
        editor
    }

    fn ids(editor: &WorkoutEditor) -> Vec<i64> {
        editor.entries().iter().map(|e| e.exercise_id.0).collect()
    }

    fn assert_symmetric(editor: &WorkoutEditor) {
        for entry in editor.entries() {
            if let Some(partner) = entry.superset_with {
                let other = editor.get(partner).expect("partner present");
                assert_eq!(other.superset_with, Some(entry.exercise_id));
            }
        }
    }

    #[test]
    fn add_is_idempotent_and_uses_defaults() {
        let mut editor = WorkoutEditor::new();
        assert!(editor.add_exercise(&exercise(5, "Bench"), ExerciseDefaults::default()));
        assert!(!editor.add_exercise(&exercise(5, "Bench"), ExerciseDefaults::default()));

        let entry = editor.get(ExerciseId(5)).unwrap();
        assert_eq!((entry.sets, entry.reps, entry.weight), (3, 10, 0.0));
        assert_eq!(editor.len(), 1);
        assert_eq!(editor.sync_state(), &SyncState::Unsaved);
    }

    #[test]
    fn reorder_moves_one_entry() {
        let mut editor = editor_with(&[1, 2, 3, 4]);
        editor.reorder(0, 2).unwrap();
        assert_eq!(ids(&editor), vec![2, 3, 1, 4]);
        editor.reorder(3, 0).unwrap();
        assert_eq!(ids(&editor), vec![4, 2, 3, 1]);

        let orders: Vec<u32> = editor.entries().iter().map(|e| e.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }

    #[test]
    fn reorder_is_a_permutation() {
        let mut editor = editor_with(&[1, 2, 3, 4, 5]);
        let moves = [(0, 4), (4, 0), (2, 3), (1, 1), (3, 1), (4, 2)];
        for (from, to) in moves {
            editor.reorder(from, to).unwrap();
            let mut sorted = ids(&editor);
            sorted.sort();
            assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn reorder_rejects_bad_indices() {
        let mut editor = editor_with(&[1, 2]);
        assert_eq!(
            editor.reorder(0, 2),
            Err(EditorError::IndexOutOfBounds { index: 2, len: 2 })
        );
        assert_eq!(ids(&editor), vec![1, 2]);
    }

    #[test]
    fn increment_then_decrement_round_trips() {
        let mut editor = editor_with(&[1]);
        let id = ExerciseId(1);
        for field in [Field::Sets, Field::Reps, Field::Weight] {
            for _ in 0..7 {
                editor.increment(id, field).unwrap();
            }
            for _ in 0..7 {
                editor.decrement(id, field).unwrap();
            }
        }
        let entry = editor.get(id).unwrap();
        assert_eq!((entry.sets, entry.reps, entry.weight), (3, 10, 0.0));

        for _ in 0..3 {
            editor.increment(id, Field::Weight).unwrap();
        }
        assert_eq!(editor.get(id).unwrap().weight, 7.5);
    }

    #[test]
    fn decrement_floors_at_zero() {
        let mut editor = editor_with(&[1]);
        let id = ExerciseId(1);
        for _ in 0..15 {
            editor.decrement(id, Field::Sets).unwrap();
            editor.decrement(id, Field::Reps).unwrap();
            editor.decrement(id, Field::Weight).unwrap();
        }
        let entry = editor.get(id).unwrap();
        assert_eq!((entry.sets, entry.reps, entry.weight), (0, 0, 0.0));
    }

    #[test]
    fn begin_superset_toggles() {
        let mut editor = editor_with(&[1, 2]);
        editor.begin_superset(ExerciseId(1)).unwrap();
        assert_eq!(editor.superset_selection(), Some(ExerciseId(1)));
        editor.begin_superset(ExerciseId(1)).unwrap();
        assert_eq!(editor.superset_selection(), None);
    }

    #[test]
    fn complete_superset_pairs_both_sides() {
        let mut editor = editor_with(&[1, 2, 3]);
        editor.begin_superset(ExerciseId(1)).unwrap();
        editor.complete_superset(ExerciseId(3)).unwrap();

        assert_eq!(editor.get(ExerciseId(1)).unwrap().superset_with, Some(ExerciseId(3)));
        assert_eq!(editor.get(ExerciseId(3)).unwrap().superset_with, Some(ExerciseId(1)));
        assert_eq!(editor.superset_selection(), None);
        assert_symmetric(&editor);
    }

    #[test]
    fn complete_superset_requires_selection_and_partner() {
        let mut editor = editor_with(&[1, 2]);
        assert_eq!(
            editor.complete_superset(ExerciseId(2)),
            Err(EditorError::NoPendingSuperset)
        );

        editor.begin_superset(ExerciseId(1)).unwrap();
        assert_eq!(editor.complete_superset(ExerciseId(1)), Err(EditorError::SelfSuperset));
        assert_eq!(
            editor.complete_superset(ExerciseId(9)),
            Err(EditorError::UnknownExercise(ExerciseId(9)))
        );
        assert_eq!(editor.superset_selection(), Some(ExerciseId(1)));
    }

    #[test]
    fn paired_entries_cannot_pair_again() {
        let mut editor = editor_with(&[1, 2, 3]);
        editor.pair(ExerciseId(1), ExerciseId(2)).unwrap();

        assert_eq!(
            editor.begin_superset(ExerciseId(2)),
            Err(EditorError::AlreadyInSuperset(ExerciseId(2)))
        );
        editor.begin_superset(ExerciseId(3)).unwrap();
        assert_eq!(
            editor.complete_superset(ExerciseId(1)),
            Err(EditorError::AlreadyInSuperset(ExerciseId(1)))
        );
        assert_symmetric(&editor);
    }

    #[test]
    fn pair_keeps_unrelated_selection() {
        let mut editor = editor_with(&[1, 2, 3, 4]);
        editor.begin_superset(ExerciseId(4)).unwrap();
        editor.pair(ExerciseId(1), ExerciseId(2)).unwrap();
        assert_eq!(editor.superset_selection(), Some(ExerciseId(4)));

        editor.begin_superset(ExerciseId(4)).unwrap();
        editor.begin_superset(ExerciseId(3)).unwrap();
        editor.pair(ExerciseId(3), ExerciseId(4)).unwrap();
        assert_eq!(editor.superset_selection(), None);
        assert_symmetric(&editor);
    }

    #[test]
    fn remove_from_superset_clears_both() {
        let mut editor = editor_with(&[1, 2]);
        editor.pair(ExerciseId(1), ExerciseId(2)).unwrap();
        editor.remove_from_superset(ExerciseId(2)).unwrap();

        assert!(editor.entries().iter().all(|e| e.superset_with.is_none()));
        assert!(editor.superset_pairs().is_empty());
    }

    #[test]
    fn remove_exercise_cascades_to_partner() {
        let mut editor = editor_with(&[1, 2, 3]);
        editor.pair(ExerciseId(1), ExerciseId(3)).unwrap();
        editor.begin_superset(ExerciseId(2)).unwrap();

        let removed = editor.remove_exercise(ExerciseId(3)).unwrap();
        assert_eq!(removed.exercise_id, ExerciseId(3));
        assert_eq!(editor.get(ExerciseId(1)).unwrap().superset_with, None);

        editor.remove_exercise(ExerciseId(2)).unwrap();
        assert_eq!(editor.superset_selection(), None);
        assert_eq!(ids(&editor), vec![1]);
        assert_eq!(editor.get(ExerciseId(1)).unwrap().order, 0);
    }

    #[test]
    fn pairs_are_reported_once() {
        let mut editor = editor_with(&[1, 2, 3, 4]);
        editor.pair(ExerciseId(4), ExerciseId(1)).unwrap();
        editor.pair(ExerciseId(2), ExerciseId(3)).unwrap();

        let pairs = editor.superset_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].first_exercise_id, ExerciseId(1));
        assert_eq!(pairs[0].second_exercise_id, ExerciseId(4));
        assert!(pairs[1].same_as(ExerciseId(2), ExerciseId(3)));
    }

    #[test]
    fn from_entries_repairs_one_sided_pairings() {
        let entry = |id: i64, partner: Option<i64>, order: u32| WorkoutExercise {
            exercise_id: ExerciseId(id),
            name: format!("E{}", id),
            sets: 3,
            reps: 10,
            weight: 20.0,
            superset_with: partner.map(ExerciseId),
            order,
        };

        let editor = WorkoutEditor::from_entries(vec![
            entry(3, Some(9), 2),
            entry(1, Some(2), 0),
            entry(2, Some(1), 1),
            entry(4, Some(1), 3),
            entry(1, None, 4),
        ]);

        assert_eq!(ids(&editor), vec![1, 2, 3, 4]);
        assert_eq!(editor.get(ExerciseId(1)).unwrap().superset_with, Some(ExerciseId(2)));
        assert_eq!(editor.get(ExerciseId(3)).unwrap().superset_with, None);
        assert_eq!(editor.get(ExerciseId(4)).unwrap().superset_with, None);
        assert_eq!(editor.sync_state(), &SyncState::Clean);
        assert_symmetric(&editor);
    }

    #[test]
    fn field_parses() {
        assert_eq!("Weight".parse::<Field>(), Ok(Field::Weight));
        assert!("tempo".parse::<Field>().is_err());
    }
}
