//! Session records - what was actually performed.

use serde::{Deserialize, Serialize};
use crate::id::{ExerciseId, ExerciseLogId, PlanExerciseId, SessionId, SetRecordId, WorkoutDayId};
use crate::plan::{RepTarget, SetKind};
use crate::Time;

/// Highest accepted effort rating.
pub const MAX_EFFORT: u8 = 10;

/// Errors raised when validating user-entered values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Weight is negative or not a number
    #[error("weight must be a non-negative number, got {0}")]
    Weight(f64),

    /// Effort outside 0..=10
    #[error("effort rating must be between 0 and 10, got {0}")]
    Effort(u8),
}

/// Performance entered for one set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEntry {
    /// Load in kg
    pub weight: f64,

    /// Repetitions performed
    pub reps: u32,

    /// Effort rating (RPE), 0-10
    pub effort: u8,

    /// Whether the set was completed
    pub completed: bool,
}

impl PerformanceEntry {
    /// Create a completed entry.
    pub fn new(weight: f64, reps: u32, effort: u8) -> Self {
        Self {
            weight,
            reps,
            effort,
            completed: true,
        }
    }

    /// Check the entry is storable.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(ValidationError::Weight(self.weight));
        }
        if self.effort > MAX_EFFORT {
            return Err(ValidationError::Effort(self.effort));
        }
        Ok(())
    }

    /// Load moved in this set.
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

/// A training session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique identifier
    pub id: SessionId,

    /// Workout day being trained
    pub day_id: WorkoutDayId,

    /// When started
    pub started_at: Time,

    /// Written once when the session is finished
    pub completion: Option<SessionCompletion>,
}

impl SessionRecord {
    /// Create a session starting now.
    pub fn new(day_id: WorkoutDayId) -> Self {
        Self {
            id: SessionId::new(),
            day_id,
            started_at: chrono::Utc::now(),
            completion: None,
        }
    }

    /// Whether the session has been finished.
    pub fn is_completed(&self) -> bool {
        self.completion.is_some()
    }
}

/// Terminal data of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCompletion {
    /// When finished
    pub completed_at: Time,

    /// Wall-clock duration
    pub duration_seconds: u64,

    /// Aggregates over the recorded sets
    pub totals: SessionTotals,

    /// Points awarded for the session
    pub reward_points: u32,
}

/// Aggregate totals of a session.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionTotals {
    /// Recorded sets
    pub sets: usize,

    /// Repetitions over all sets
    pub reps: u32,

    /// Sum of weight x reps
    pub volume: f64,

    /// Exercises with at least one recorded set
    pub exercises: usize,
}

/// The per-session log of one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLog {
    /// Unique identifier
    pub id: ExerciseLogId,

    /// Owning session
    pub session_id: SessionId,

    /// Logged exercise
    pub exercise_id: ExerciseId,

    /// Plan entry the exercise came from
    pub plan_exercise_id: PlanExerciseId,

    /// When created
    pub created_at: Time,
}

impl ExerciseLog {
    /// Create a log for an exercise within a session.
    pub fn new(session_id: SessionId, exercise_id: ExerciseId, plan_exercise_id: PlanExerciseId) -> Self {
        Self {
            id: ExerciseLogId::new(),
            session_id,
            exercise_id,
            plan_exercise_id,
            created_at: chrono::Utc::now(),
        }
    }
}

/// A performed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    /// Unique identifier
    pub id: SetRecordId,

    /// Owning exercise log
    pub log_id: ExerciseLogId,

    /// Owning session
    pub session_id: SessionId,

    /// Performed exercise
    pub exercise_id: ExerciseId,

    /// 1-based position within the exercise
    pub set_number: u32,

    /// Kind of the prescribed set
    pub kind: SetKind,

    /// Prescribed reps at the time
    pub target_reps: RepTarget,

    /// What was performed
    pub performance: PerformanceEntry,

    /// When recorded
    pub recorded_at: Time,

    /// Set by storage when this set is a best-ever estimated 1RM
    #[serde(default)]
    pub personal_record: bool,
}

impl SetRecord {
    /// Estimated one-rep max of this set.
    pub fn estimated_one_rep_max(&self) -> f64 {
        estimated_one_rep_max(self.performance.weight, self.performance.reps)
    }
}

/// All sets of one exercise performed in one past session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPerformance {
    /// Session the sets belong to
    pub session_id: SessionId,

    /// When the session was trained
    pub date: Time,

    /// Sets in set-number order
    pub sets: Vec<SetRecord>,
}

/// Epley estimate; zero reps estimate zero.
pub fn estimated_one_rep_max(weight: f64, reps: u32) -> f64 {
    if reps == 0 {
        return 0.0;
    }
    weight * (1.0 + f64::from(reps) / 30.0)
}
