//! What comes after the current set.

use repforge_core::{RepTarget, SetKind, WorkoutPlanExercise};
use serde::{Deserialize, Serialize};

use crate::SessionPointer;

/// Preview shown during rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NextSetPreview {
    /// Another set follows
    Set {
        /// Exercise the next set belongs to
        exercise_name: String,
        /// 1-based number of the set within its exercise
        set_number: usize,
        /// Sets prescribed for that exercise
        sets_in_exercise: usize,
        /// Set kind
        kind: SetKind,
        /// Prescribed reps
        target_reps: RepTarget,
        /// Prescribed load
        target_weight: f64,
    },
    /// The current set was the last one
    WorkoutComplete,
}

impl NextSetPreview {
    /// Preview of the set after `pointer` in `plan`.
    pub fn after(plan: &[WorkoutPlanExercise], pointer: SessionPointer) -> Self {
        let counts = set_counts(plan);
        let Some(next) = pointer.next_set(&counts) else {
            return NextSetPreview::WorkoutComplete;
        };

        let exercise = &plan[next.exercise_index()];
        let target = &exercise.sets[next.set_index()];
        NextSetPreview::Set {
            exercise_name: exercise.exercise.name.clone(),
            set_number: next.set_index() + 1,
            sets_in_exercise: exercise.sets.len(),
            kind: target.kind(),
            target_reps: target.rep_target(),
            target_weight: target.weight(),
        }
    }
}

/// Number of sets per exercise, in plan order.
pub(crate) fn set_counts(plan: &[WorkoutPlanExercise]) -> Vec<usize> {
    plan.iter().map(|e| e.sets.len()).collect()
}
