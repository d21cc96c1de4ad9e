//! Workout plan model - exercises of a workout day and their set targets.

use serde::{Deserialize, Serialize};
use crate::exercise::ExerciseDefinition;
use crate::id::{PlanExerciseId, WorkoutDayId};

/// Prescribed repetitions for a working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepTarget {
    /// A fixed number of reps
    Exact(u32),
    /// Anywhere between `min` and `max` reps
    Range {
        /// Lower bound
        min: u32,
        /// Upper bound
        max: u32,
    },
    /// As many reps as possible
    ToFailure,
}

impl RepTarget {
    /// Reps pre-filled in the performance form for this target.
    pub fn default_reps(&self) -> u32 {
        match self {
            RepTarget::Exact(reps) => *reps,
            RepTarget::Range { min, .. } => *min,
            RepTarget::ToFailure => 0,
        }
    }
}

impl std::fmt::Display for RepTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepTarget::Exact(reps) => write!(f, "{}", reps),
            RepTarget::Range { min, max } => write!(f, "{}-{}", min, max),
            RepTarget::ToFailure => write!(f, "to failure"),
        }
    }
}

/// Kind of a prescribed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetKind {
    /// Preparation set, not counted toward progression
    Warmup,
    /// Set at the prescribed training load
    Working,
    /// Reduced-load set performed after the working sets
    Dropset,
}

impl SetKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SetKind::Warmup => "warmup",
            SetKind::Working => "working",
            SetKind::Dropset => "dropset",
        }
    }
}

/// A single prescribed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SetTarget {
    /// Warmup set
    Warmup {
        /// Load in kg
        weight: f64,
        /// Reps
        reps: u32,
    },
    /// Working set
    Working {
        /// Load in kg
        weight: f64,
        /// Prescribed reps
        reps: RepTarget,
    },
    /// Drop set
    Dropset {
        /// Load in kg
        weight: f64,
        /// Reps
        reps: u32,
    },
}

impl SetTarget {
    /// Working set with an exact rep count.
    pub fn working(weight: f64, reps: u32) -> Self {
        SetTarget::Working { weight, reps: RepTarget::Exact(reps) }
    }

    /// The kind of this set.
    pub fn kind(&self) -> SetKind {
        match self {
            SetTarget::Warmup { .. } => SetKind::Warmup,
            SetTarget::Working { .. } => SetKind::Working,
            SetTarget::Dropset { .. } => SetKind::Dropset,
        }
    }

    /// Whether this set counts toward progression.
    pub fn is_working(&self) -> bool {
        matches!(self, SetTarget::Working { .. })
    }

    /// Prescribed load.
    pub fn weight(&self) -> f64 {
        match self {
            SetTarget::Warmup { weight, .. }
            | SetTarget::Working { weight, .. }
            | SetTarget::Dropset { weight, .. } => *weight,
        }
    }

    /// Prescribed reps; warmup and drop sets are always exact.
    pub fn rep_target(&self) -> RepTarget {
        match self {
            SetTarget::Warmup { reps, .. } | SetTarget::Dropset { reps, .. } => {
                RepTarget::Exact(*reps)
            }
            SetTarget::Working { reps, .. } => *reps,
        }
    }
}

/// An exercise as prescribed on a workout day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlanExercise {
    /// Unique identifier
    pub id: PlanExerciseId,

    /// Owning workout day
    pub day_id: WorkoutDayId,

    /// Position of the exercise within the day
    #[serde(default)]
    pub order: u32,

    /// Exercise reference
    pub exercise: ExerciseDefinition,

    /// Ordered set targets
    pub sets: Vec<SetTarget>,

    /// Rest between sets, in seconds
    pub rest_seconds: u32,

    /// Free-text notes
    #[serde(default)]
    pub notes: String,
}

impl WorkoutPlanExercise {
    /// Create a plan exercise with no notes.
    pub fn new(
        day_id: WorkoutDayId,
        exercise: ExerciseDefinition,
        sets: Vec<SetTarget>,
        rest_seconds: u32,
    ) -> Self {
        Self {
            id: PlanExerciseId::new(),
            day_id,
            order: 0,
            exercise,
            sets,
            rest_seconds,
            notes: String::new(),
        }
    }

    /// Working sets in order.
    pub fn working_sets(&self) -> impl Iterator<Item = &SetTarget> {
        self.sets.iter().filter(|s| s.is_working())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reps() {
        assert_eq!(RepTarget::Exact(10).default_reps(), 10);
        assert_eq!(RepTarget::Range { min: 8, max: 12 }.default_reps(), 8);
        assert_eq!(RepTarget::ToFailure.default_reps(), 0);
    }

    #[test]
    fn test_set_target_json_shape() {
        let json = r#"[
            {"kind": "warmup", "weight": 40.0, "reps": 10},
            {"kind": "working", "weight": 100.0, "reps": {"range": {"min": 8, "max": 12}}},
            {"kind": "working", "weight": 100.0, "reps": "to_failure"},
            {"kind": "dropset", "weight": 70.0, "reps": 12}
        ]"#;
        let sets: Vec<SetTarget> = serde_json::from_str(json).unwrap();

        assert_eq!(sets[0].kind(), SetKind::Warmup);
        assert_eq!(sets[1].rep_target(), RepTarget::Range { min: 8, max: 12 });
        assert_eq!(sets[2].rep_target(), RepTarget::ToFailure);
        assert_eq!(sets[3].weight(), 70.0);
    }

    #[test]
    fn test_working_sets_filter() {
        let plan = WorkoutPlanExercise::new(
            WorkoutDayId::new(),
            ExerciseDefinition::new("Squat"),
            vec![
                SetTarget::Warmup { weight: 60.0, reps: 5 },
                SetTarget::working(100.0, 5),
                SetTarget::working(100.0, 5),
                SetTarget::Dropset { weight: 80.0, reps: 8 },
            ],
            120,
        );
        assert_eq!(plan.working_sets().count(), 2);
    }

    #[test]
    fn test_rep_target_display() {
        assert_eq!(RepTarget::Exact(5).to_string(), "5");
        assert_eq!(RepTarget::Range { min: 8, max: 12 }.to_string(), "8-12");
        assert_eq!(RepTarget::ToFailure.to_string(), "to failure");
    }
}
