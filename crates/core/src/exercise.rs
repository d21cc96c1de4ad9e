//! Exercise definitions - immutable reference data.

use serde::{Deserialize, Serialize};
use crate::id::ExerciseId;

/// An exercise as defined in the exercise catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDefinition {
    /// Unique identifier
    pub id: ExerciseId,

    /// Display name
    pub name: String,

    /// Which metrics are logged for this exercise
    #[serde(default)]
    pub tracks: TrackedMetrics,
}

impl ExerciseDefinition {
    /// Create a weight-and-reps exercise.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ExerciseId::new(),
            name: name.into(),
            tracks: TrackedMetrics::default(),
        }
    }
}

/// Metric flags for an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedMetrics {
    /// Load is logged
    pub weight: bool,

    /// Repetitions are logged
    pub reps: bool,

    /// Duration is logged
    pub time: bool,

    /// Distance is logged
    pub distance: bool,
}

impl Default for TrackedMetrics {
    fn default() -> Self {
        Self {
            weight: true,
            reps: true,
            time: false,
            distance: false,
        }
    }
}
