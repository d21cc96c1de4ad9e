//! JSON file storage implementation.
//!
//! Stores each entity as a JSON file under a per-kind directory of the root.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use repforge_core::{
    ExerciseId, ExerciseLog, PlanExerciseId, SessionCompletion, SessionId, SessionPerformance,
    SessionRecord, SetRecord, SetTarget, WorkoutDayId, WorkoutPlanExercise,
};
use super::history::{group_recent_performance, is_personal_record};
use super::{Storage, StorageError, Result};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
    // Serializes lookup-then-write sequences (log uniqueness, completion).
    write_lock: Arc<Mutex<()>>,
}

impl JsonStorage {
    /// Create storage, creating the entity directories under `root`.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("plan")).await?;
        fs::create_dir_all(root.join("sessions")).await?;
        fs::create_dir_all(root.join("logs")).await?;
        fs::create_dir_all(root.join("sets")).await?;

        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn plan_path(&self, id: PlanExerciseId) -> PathBuf {
        self.root.join("plan").join(format!("{}.json", id))
    }
    fn session_path(&self, id: SessionId) -> PathBuf {
        self.root.join("sessions").join(format!("{}.json", id))
    }
    fn log_path(&self, log: &ExerciseLog) -> PathBuf {
        self.root.join("logs").join(format!("{}.json", log.id))
    }
    fn set_path(&self, record: &SetRecord) -> PathBuf {
        self.root.join("sets").join(format!("{}.json", record.id))
    }

    async fn write_plan(&self, exercise: &WorkoutPlanExercise) -> Result<()> {
        write_json(&self.plan_path(exercise.id), exercise).await?;
        debug!("Saved plan exercise {} ({} sets)", exercise.id, exercise.sets.len());
        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn load_plan(&self, day_id: WorkoutDayId) -> Result<Vec<WorkoutPlanExercise>> {
        let mut plan: Vec<WorkoutPlanExercise> = list_dir(&self.root.join("plan"))
            .await?
            .into_iter()
            .filter(|e: &WorkoutPlanExercise| e.day_id == day_id)
            .collect();
        plan.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Ok(plan)
    }

    async fn load_plan_exercise(&self, id: PlanExerciseId) -> Result<Option<WorkoutPlanExercise>> {
        read_json(&self.plan_path(id)).await
    }

    async fn save_plan_exercise(&mut self, exercise: &WorkoutPlanExercise) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_plan(exercise).await
    }

    async fn update_exercise_targets(&mut self, id: PlanExerciseId, sets: &[SetTarget]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut exercise: WorkoutPlanExercise = read_json(&self.plan_path(id))
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("plan exercise {}", id)))?;
        exercise.sets = sets.to_vec();
        self.write_plan(&exercise).await
    }

    async fn create_session_record(&mut self, session: &SessionRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.session_path(session.id);
        if fs::try_exists(&path).await? {
            return Err(StorageError::Conflict(format!("session {} already exists", session.id)));
        }
        write_json(&path, session).await
    }

    async fn load_session_record(&self, id: SessionId) -> Result<Option<SessionRecord>> {
        read_json(&self.session_path(id)).await
    }

    async fn complete_session_record(&mut self, id: SessionId, completion: &SessionCompletion) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.session_path(id);
        let mut session: SessionRecord = read_json(&path)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("session {}", id)))?;
        if session.is_completed() {
            return Err(StorageError::Conflict(format!("session {} already completed", id)));
        }
        session.completion = Some(completion.clone());
        write_json(&path, &session).await
    }

    async fn find_exercise_log(&self, session_id: SessionId, exercise_id: ExerciseId) -> Result<Option<ExerciseLog>> {
        let logs: Vec<ExerciseLog> = list_dir(&self.root.join("logs")).await?;
        Ok(logs
            .into_iter()
            .find(|l| l.session_id == session_id && l.exercise_id == exercise_id))
    }

    async fn create_exercise_log(&mut self, log: &ExerciseLog) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.find_exercise_log(log.session_id, log.exercise_id).await?.is_some() {
            return Err(StorageError::Conflict(format!(
                "session {} already has a log for exercise {}",
                log.session_id, log.exercise_id
            )));
        }
        write_json(&self.log_path(log), log).await
    }

    async fn create_set_record(&mut self, record: &SetRecord) -> Result<SetRecord> {
        let _guard = self.write_lock.lock().await;
        let logs: Vec<ExerciseLog> = list_dir(&self.root.join("logs")).await?;
        if !logs.iter().any(|l| l.id == record.log_id) {
            return Err(StorageError::NotFound(format!("exercise log {}", record.log_id)));
        }

        let earlier: Vec<SetRecord> = list_dir(&self.root.join("sets")).await?;
        let mut stored = record.clone();
        stored.personal_record = is_personal_record(&stored, &earlier);
        write_json(&self.set_path(&stored), &stored).await?;
        Ok(stored)
    }

    async fn fetch_recent_performance(&self, exercise_id: ExerciseId, limit: usize) -> Result<Vec<SessionPerformance>> {
        let sessions: Vec<SessionRecord> = list_dir(&self.root.join("sessions")).await?;
        let sets: Vec<SetRecord> = list_dir(&self.root.join("sets")).await?;
        Ok(group_recent_performance(&sessions, &sets, exercise_id, limit))
    }
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json.as_bytes()).await?;
    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Every readable entity of a directory. Unreadable files are skipped with a warning.
async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        match read_json(&path).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => warn!("Skipping unreadable file {}: {}", path.display(), e),
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::fixtures;
    use repforge_core::{ExerciseDefinition, SessionTotals};

    fn completion() -> SessionCompletion {
        SessionCompletion {
            completed_at: chrono::Utc::now(),
            duration_seconds: 1800,
            totals: SessionTotals::default(),
            reward_points: 30,
        }
    }

    #[tokio::test]
    async fn test_plan_targets_update() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();

        let day = WorkoutDayId::new();
        let exercise = WorkoutPlanExercise::new(
            day,
            ExerciseDefinition::new("Bench Press"),
            vec![SetTarget::working(100.0, 8), SetTarget::working(100.0, 8)],
            120,
        );
        storage.save_plan_exercise(&exercise).await.unwrap();

        storage
            .update_exercise_targets(exercise.id, &[SetTarget::working(102.5, 8)])
            .await
            .unwrap();

        let plan = storage.load_plan(day).await.unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].sets, vec![SetTarget::working(102.5, 8)]);
    }

    #[tokio::test]
    async fn test_session_lifecycle_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();
        let exercise = ExerciseId::new();

        let session = SessionRecord::new(WorkoutDayId::new());
        storage.create_session_record(&session).await.unwrap();
        assert!(matches!(
            storage.create_session_record(&session).await,
            Err(StorageError::Conflict(_))
        ));

        let log = ExerciseLog::new(session.id, exercise, PlanExerciseId::new());
        storage.create_exercise_log(&log).await.unwrap();
        let duplicate = ExerciseLog::new(session.id, exercise, PlanExerciseId::new());
        assert!(matches!(
            storage.create_exercise_log(&duplicate).await,
            Err(StorageError::Conflict(_))
        ));

        let mut record = fixtures::set(&session, exercise, 1, 100.0, 10);
        record.log_id = log.id;
        let stored = storage.create_set_record(&record).await.unwrap();
        assert!(stored.personal_record);

        assert!(storage.fetch_recent_performance(exercise, 5).await.unwrap().is_empty());

        storage.complete_session_record(session.id, &completion()).await.unwrap();
        assert!(matches!(
            storage.complete_session_record(session.id, &completion()).await,
            Err(StorageError::Conflict(_))
        ));

        let history = storage.fetch_recent_performance(exercise, 5).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sets.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_files_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();
        let exercise = ExerciseId::new();

        let session = SessionRecord::new(WorkoutDayId::new());
        storage.create_session_record(&session).await.unwrap();
        let log = ExerciseLog::new(session.id, exercise, PlanExerciseId::new());
        storage.create_exercise_log(&log).await.unwrap();
        let mut record = fixtures::set(&session, exercise, 1, 100.0, 10);
        record.log_id = log.id;
        storage.create_set_record(&record).await.unwrap();
        storage.complete_session_record(session.id, &completion()).await.unwrap();

        fs::write(dir.path().join("sets").join("broken.json"), b"{ not json").await.unwrap();
        fs::write(dir.path().join("logs").join("broken.json"), b"").await.unwrap();

        let found = storage.find_exercise_log(session.id, exercise).await.unwrap();
        assert_eq!(found.map(|l| l.id), Some(log.id));
        let history = storage.fetch_recent_performance(exercise, 5).await.unwrap();
        assert_eq!(history[0].sets.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_entities() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();

        assert!(storage.load_session_record(SessionId::new()).await.unwrap().is_none());
        assert!(matches!(
            storage.update_exercise_targets(PlanExerciseId::new(), &[]).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            storage.complete_session_record(SessionId::new(), &completion()).await,
            Err(StorageError::NotFound(_))
        ));
    }
}
