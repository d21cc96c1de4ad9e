//! Persistence of performed sets.

use std::collections::HashMap;
use repforge_core::{
    ExerciseId, ExerciseLog, ExerciseLogId, PerformanceEntry, SessionId, SetRecord, SetRecordId,
    WorkoutPlanExercise,
};
use repforge_storage::{Result, Storage, StorageError};
use tracing::debug;

/// Writes set records, creating at most one exercise log per session and exercise.
#[derive(Debug, Default)]
pub struct PerformanceRecorder {
    logs: HashMap<(SessionId, ExerciseId), ExerciseLogId>,
}

impl PerformanceRecorder {
    /// Create a recorder with an empty log cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached log of an exercise, if one has been resolved this session.
    pub fn cached_log(&self, session_id: SessionId, exercise_id: ExerciseId) -> Option<ExerciseLogId> {
        self.logs.get(&(session_id, exercise_id)).copied()
    }

    /// Persist one set of `exercise`, marked completed.
    ///
    /// `set_index` is the 0-based position in the exercise's prescription.
    pub async fn record_set<S: Storage + ?Sized>(
        &mut self,
        storage: &mut S,
        session_id: SessionId,
        exercise: &WorkoutPlanExercise,
        set_index: usize,
        performance: PerformanceEntry,
    ) -> Result<SetRecord> {
        let target = exercise
            .sets
            .get(set_index)
            .ok_or_else(|| StorageError::NotFound(format!("set {} of {}", set_index + 1, exercise.id)))?;
        let log_id = self.resolve_log(storage, session_id, exercise).await?;

        let record = SetRecord {
            id: SetRecordId::new(),
            log_id,
            session_id,
            exercise_id: exercise.exercise.id,
            set_number: set_index as u32 + 1,
            kind: target.kind(),
            target_reps: target.rep_target(),
            performance: PerformanceEntry {
                completed: true,
                ..performance
            },
            recorded_at: chrono::Utc::now(),
            personal_record: false,
        };

        let stored = storage.create_set_record(&record).await?;
        debug!(
            "Recorded set {} of {}: {} x {}",
            stored.set_number, exercise.exercise.name, stored.performance.weight, stored.performance.reps
        );
        Ok(stored)
    }

    async fn resolve_log<S: Storage + ?Sized>(
        &mut self,
        storage: &mut S,
        session_id: SessionId,
        exercise: &WorkoutPlanExercise,
    ) -> Result<ExerciseLogId> {
        let key = (session_id, exercise.exercise.id);
        if let Some(id) = self.logs.get(&key) {
            return Ok(*id);
        }

        let id = match storage.find_exercise_log(session_id, exercise.exercise.id).await? {
            Some(log) => log.id,
            None => {
                let log = ExerciseLog::new(session_id, exercise.exercise.id, exercise.id);
                match storage.create_exercise_log(&log).await {
                    Ok(()) => log.id,
                    Err(StorageError::Conflict(_)) => storage
                        .find_exercise_log(session_id, exercise.exercise.id)
                        .await?
                        .map(|existing| existing.id)
                        .ok_or_else(|| StorageError::NotFound(format!("exercise log for {}", exercise.exercise.id)))?,
                    Err(e) => return Err(e),
                }
            }
        };

        self.logs.insert(key, id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repforge_core::{ExerciseDefinition, SessionRecord, SetTarget, WorkoutDayId};
    use repforge_storage::MemoryStorage;

    async fn setup() -> (MemoryStorage, SessionRecord, WorkoutPlanExercise) {
        let mut storage = MemoryStorage::new();
        let session = SessionRecord::new(WorkoutDayId::new());
        storage.create_session_record(&session).await.unwrap();
        let exercise = WorkoutPlanExercise::new(
            session.day_id,
            ExerciseDefinition::new("Squat"),
            vec![SetTarget::working(100.0, 5); 3],
            120,
        );
        (storage, session, exercise)
    }

    #[tokio::test]
    async fn test_one_log_per_exercise() {
        let (mut storage, session, exercise) = setup().await;
        let mut recorder = PerformanceRecorder::new();

        for set in 0..3 {
            recorder
                .record_set(&mut storage, session.id, &exercise, set, PerformanceEntry::new(100.0, 5, 8))
                .await
                .unwrap();
        }

        assert_eq!(storage.log_count().await, 1);
        let sets = storage.session_sets(session.id).await;
        assert_eq!(sets.iter().map(|s| s.set_number).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(sets.iter().all(|s| Some(s.log_id) == recorder.cached_log(session.id, exercise.exercise.id)));
    }

    #[tokio::test]
    async fn test_reuses_existing_log() {
        let (mut storage, session, exercise) = setup().await;
        let existing = ExerciseLog::new(session.id, exercise.exercise.id, exercise.id);
        storage.create_exercise_log(&existing).await.unwrap();

        let mut recorder = PerformanceRecorder::new();
        let record = recorder
            .record_set(&mut storage, session.id, &exercise, 0, PerformanceEntry::new(100.0, 5, 8))
            .await
            .unwrap();

        assert_eq!(record.log_id, existing.id);
        assert_eq!(storage.log_count().await, 1);
    }

    #[tokio::test]
    async fn test_recorded_sets_are_completed() {
        let (mut storage, session, exercise) = setup().await;
        let mut recorder = PerformanceRecorder::new();
        let entry = PerformanceEntry {
            completed: false,
            ..PerformanceEntry::new(100.0, 5, 8)
        };

        let record = recorder
            .record_set(&mut storage, session.id, &exercise, 0, entry)
            .await
            .unwrap();
        assert!(record.performance.completed);
        assert_eq!(record.performance.reps, 5);
        assert!(storage.session_sets(session.id).await[0].performance.completed);
    }

    #[tokio::test]
    async fn test_out_of_range_set() {
        let (mut storage, session, exercise) = setup().await;
        let mut recorder = PerformanceRecorder::new();
        let result = recorder
            .record_set(&mut storage, session.id, &exercise, 3, PerformanceEntry::new(100.0, 5, 8))
            .await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert_eq!(storage.log_count().await, 0);
    }
}
