//! SQLite storage backend for RepForge.
//!
//! Entities are stored as JSON payloads in one table, with a lookup key per
//! entity type (day for plan exercises, session+exercise for logs, exercise
//! for sets). A partial unique index enforces one log per exercise per session.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use repforge_core::{
    ExerciseId, ExerciseLog, PlanExerciseId, SessionCompletion, SessionId, SessionPerformance,
    SessionRecord, SetRecord, SetTarget, WorkoutDayId, WorkoutPlanExercise,
};
use tracing::warn;

use super::history::{group_recent_performance, is_personal_record};
use super::trait_::{Storage, StorageError, Result};

const PLAN: &str = "plan_exercise";
const SESSION: &str = "session";
const LOG: &str = "exercise_log";
const SET: &str = "set_record";

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Database(e.to_string())
    }
}

/// SQLite storage implementation.
#[derive(Clone)]
pub struct SqliteStorage {
    /// Database connection pool
    pool: sqlx::SqlitePool,
}

impl SqliteStorage {
    /// Open (or create) a database file.
    pub async fn new(db_path: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(db_path)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Open a database at a filesystem path.
    pub async fn new_from_path(path: &Path) -> Result<Self> {
        let path = path
            .to_str()
            .ok_or_else(|| StorageError::Other(format!("non UTF-8 path: {}", path.display())))?;
        Self::new(&format!("sqlite://{}", path)).await
    }

    /// Create an in-memory SQLite storage for testing.
    pub async fn in_memory() -> Result<Self> {
        // One connection: every in-memory connection is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Initialize the database schema.
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS entities (
                id TEXT PRIMARY KEY,
                entity_type TEXT NOT NULL,
                lookup_key TEXT,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_entities_lookup ON entities(entity_type, lookup_key)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_logs_unique ON entities(lookup_key)
            WHERE entity_type = 'exercise_log'",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn log_key(session_id: SessionId, exercise_id: ExerciseId) -> String {
        format!("{}:{}", session_id, exercise_id)
    }

    async fn insert<T: serde::Serialize>(&self, id: String, entity_type: &str, key: Option<String>, value: &T) -> Result<()> {
        let data = serde_json::to_string(value)?;
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO entities (id, entity_type, lookup_key, data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(entity_type)
        .bind(key)
        .bind(data)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StorageError::Conflict(format!("{} {} already exists", entity_type, id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update<T: serde::Serialize>(&self, id: String, entity_type: &str, value: &T) -> Result<()> {
        let data = serde_json::to_string(value)?;
        let updated = sqlx::query("UPDATE entities SET data = ?, updated_at = ? WHERE id = ? AND entity_type = ?")
            .bind(data)
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(&id)
            .bind(entity_type)
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("{} {}", entity_type, id)));
        }
        Ok(())
    }

    async fn load<T: serde::de::DeserializeOwned>(&self, id: String, entity_type: &str) -> Result<Option<T>> {
        let row = sqlx::query("SELECT data FROM entities WHERE id = ? AND entity_type = ?")
            .bind(id)
            .bind(entity_type)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Self::decode(&row)).transpose()
    }

    async fn list<T: serde::de::DeserializeOwned>(&self, entity_type: &str, key: Option<String>) -> Result<Vec<T>> {
        let rows = match key {
            Some(key) => {
                sqlx::query("SELECT data FROM entities WHERE entity_type = ? AND lookup_key = ? ORDER BY created_at")
                    .bind(entity_type)
                    .bind(key)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT data FROM entities WHERE entity_type = ? ORDER BY created_at")
                    .bind(entity_type)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(Self::decode).collect()
    }

    fn decode<T: serde::de::DeserializeOwned>(row: &SqliteRow) -> Result<T> {
        let data: String = row.try_get("data")?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                warn!("SQLite health check failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn load_plan(&self, day_id: WorkoutDayId) -> Result<Vec<WorkoutPlanExercise>> {
        let mut plan: Vec<WorkoutPlanExercise> = self.list(PLAN, Some(day_id.to_string())).await?;
        plan.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Ok(plan)
    }

    async fn load_plan_exercise(&self, id: PlanExerciseId) -> Result<Option<WorkoutPlanExercise>> {
        self.load(id.to_string(), PLAN).await
    }

    async fn save_plan_exercise(&mut self, exercise: &WorkoutPlanExercise) -> Result<()> {
        let data = serde_json::to_string(exercise)?;
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT OR REPLACE INTO entities (id, entity_type, lookup_key, data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(exercise.id.to_string())
        .bind(PLAN)
        .bind(exercise.day_id.to_string())
        .bind(data)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_exercise_targets(&mut self, id: PlanExerciseId, sets: &[SetTarget]) -> Result<()> {
        let mut exercise: WorkoutPlanExercise = self
            .load(id.to_string(), PLAN)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("plan exercise {}", id)))?;
        exercise.sets = sets.to_vec();
        self.update(id.to_string(), PLAN, &exercise).await
    }

    async fn create_session_record(&mut self, session: &SessionRecord) -> Result<()> {
        self.insert(session.id.to_string(), SESSION, None, session).await
    }

    async fn load_session_record(&self, id: SessionId) -> Result<Option<SessionRecord>> {
        self.load(id.to_string(), SESSION).await
    }

    async fn complete_session_record(&mut self, id: SessionId, completion: &SessionCompletion) -> Result<()> {
        let mut session: SessionRecord = self
            .load(id.to_string(), SESSION)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("session {}", id)))?;
        if session.is_completed() {
            return Err(StorageError::Conflict(format!("session {} already completed", id)));
        }
        session.completion = Some(completion.clone());
        self.update(id.to_string(), SESSION, &session).await
    }

    async fn find_exercise_log(&self, session_id: SessionId, exercise_id: ExerciseId) -> Result<Option<ExerciseLog>> {
        let logs: Vec<ExerciseLog> = self.list(LOG, Some(Self::log_key(session_id, exercise_id))).await?;
        Ok(logs.into_iter().next())
    }

    async fn create_exercise_log(&mut self, log: &ExerciseLog) -> Result<()> {
        let key = Self::log_key(log.session_id, log.exercise_id);
        self.insert(log.id.to_string(), LOG, Some(key), log).await
    }

    async fn create_set_record(&mut self, record: &SetRecord) -> Result<SetRecord> {
        if self.load::<ExerciseLog>(record.log_id.to_string(), LOG).await?.is_none() {
            return Err(StorageError::NotFound(format!("exercise log {}", record.log_id)));
        }

        let earlier: Vec<SetRecord> = self.list(SET, Some(record.exercise_id.to_string())).await?;
        let mut stored = record.clone();
        stored.personal_record = is_personal_record(&stored, &earlier);
        self.insert(stored.id.to_string(), SET, Some(stored.exercise_id.to_string()), &stored)
            .await?;
        Ok(stored)
    }

    async fn fetch_recent_performance(&self, exercise_id: ExerciseId, limit: usize) -> Result<Vec<SessionPerformance>> {
        let sets: Vec<SetRecord> = self.list(SET, Some(exercise_id.to_string())).await?;
        let sessions: Vec<SessionRecord> = self.list(SESSION, None).await?;
        Ok(group_recent_performance(&sessions, &sets, exercise_id, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::fixtures;
    use repforge_core::{ExerciseDefinition, SessionTotals};

    #[tokio::test]
    async fn test_in_memory_storage() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        assert!(storage.health_check().await);
    }

    #[tokio::test]
    async fn test_plan_operations() {
        let mut storage = SqliteStorage::in_memory().await.unwrap();
        let day = WorkoutDayId::new();
        let exercise = WorkoutPlanExercise::new(
            day,
            ExerciseDefinition::new("Deadlift"),
            vec![SetTarget::working(140.0, 5)],
            180,
        );

        storage.save_plan_exercise(&exercise).await.unwrap();
        storage
            .update_exercise_targets(exercise.id, &[SetTarget::working(142.5, 5)])
            .await
            .unwrap();

        let plan = storage.load_plan(day).await.unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].sets[0].weight(), 142.5);
    }

    #[tokio::test]
    async fn test_log_uniqueness_and_history() {
        let mut storage = SqliteStorage::in_memory().await.unwrap();
        let exercise = ExerciseId::new();
        let session = SessionRecord::new(WorkoutDayId::new());
        storage.create_session_record(&session).await.unwrap();

        let log = ExerciseLog::new(session.id, exercise, PlanExerciseId::new());
        storage.create_exercise_log(&log).await.unwrap();
        let duplicate = ExerciseLog::new(session.id, exercise, PlanExerciseId::new());
        assert!(matches!(
            storage.create_exercise_log(&duplicate).await,
            Err(StorageError::Conflict(_))
        ));
        assert_eq!(storage.find_exercise_log(session.id, exercise).await.unwrap(), Some(log.clone()));

        let mut record = fixtures::set(&session, exercise, 1, 100.0, 10);
        record.log_id = log.id;
        storage.create_set_record(&record).await.unwrap();

        let completion = SessionCompletion {
            completed_at: chrono::Utc::now(),
            duration_seconds: 600,
            totals: SessionTotals::default(),
            reward_points: 10,
        };
        storage.complete_session_record(session.id, &completion).await.unwrap();

        let history = storage.fetch_recent_performance(exercise, 3).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sets[0].performance.reps, 10);
    }
}
