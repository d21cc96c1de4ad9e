//! Storage trait abstraction.

use async_trait::async_trait;
use repforge_core::{
    ExerciseId, ExerciseLog, PlanExerciseId, SessionCompletion, SessionId, SessionPerformance,
    SessionRecord, SetRecord, SetTarget, WorkoutDayId, WorkoutPlanExercise,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database backend error
    #[error("Database error: {0}")]
    Database(String),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write would violate a uniqueness or lifecycle rule
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Persistence facade for the session and progression engines.
///
/// This trait allows different storage backends to be plugged in.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Plan operations ===

    /// Load the exercises of a workout day, ordered by position.
    async fn load_plan(&self, day_id: WorkoutDayId) -> Result<Vec<WorkoutPlanExercise>>;

    /// Load a single plan exercise.
    async fn load_plan_exercise(&self, id: PlanExerciseId) -> Result<Option<WorkoutPlanExercise>>;

    /// Save a plan exercise (create or replace).
    async fn save_plan_exercise(&mut self, exercise: &WorkoutPlanExercise) -> Result<()>;

    /// Replace the set targets of a plan exercise.
    async fn update_exercise_targets(&mut self, id: PlanExerciseId, sets: &[SetTarget]) -> Result<()>;

    // === Session operations ===

    /// Create a session record.
    async fn create_session_record(&mut self, session: &SessionRecord) -> Result<()>;

    /// Load a session record by ID.
    async fn load_session_record(&self, id: SessionId) -> Result<Option<SessionRecord>>;

    /// Write the terminal completion of a session. Fails if already completed.
    async fn complete_session_record(&mut self, id: SessionId, completion: &SessionCompletion) -> Result<()>;

    // === Log operations ===

    /// Find the log of an exercise within a session.
    async fn find_exercise_log(&self, session_id: SessionId, exercise_id: ExerciseId) -> Result<Option<ExerciseLog>>;

    /// Create an exercise log. Fails if the session already has one for the exercise.
    async fn create_exercise_log(&mut self, log: &ExerciseLog) -> Result<()>;

    /// Create a set record and return it as stored (personal record flag set).
    async fn create_set_record(&mut self, record: &SetRecord) -> Result<SetRecord>;

    // === History ===

    /// Sets of an exercise from the most recent completed sessions, newest first.
    async fn fetch_recent_performance(&self, exercise_id: ExerciseId, limit: usize) -> Result<Vec<SessionPerformance>>;
}
