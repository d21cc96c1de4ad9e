//! RepForge core data models.
//!
//! This crate defines the data structures shared by the workout session
//! engine and the progression analysis engine.

#![warn(missing_docs)]

// Core identities
mod id;

// Prescription
mod exercise;
mod plan;

// Performed work
mod record;

// Trend analysis
mod progression;

// Re-exports
pub use id::*;

pub use exercise::{ExerciseDefinition, TrackedMetrics};
pub use plan::{RepTarget, SetKind, SetTarget, WorkoutPlanExercise};
pub use record::{
    estimated_one_rep_max, ExerciseLog, PerformanceEntry, SessionCompletion, SessionPerformance,
    SessionRecord, SessionTotals, SetRecord, ValidationError, MAX_EFFORT,
};
pub use progression::{
    ChangeMethod, Classification, CurrentTarget, ProgressionAnalysis, ProgressionHistoryEntry,
    ProgressionRecommendation, RecommendationOption, TargetChange,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
