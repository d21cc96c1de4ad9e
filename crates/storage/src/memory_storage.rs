//! In-memory storage backend.
//!
//! Cloning a `MemoryStorage` yields another handle to the same data, so a
//! caller can keep one handle for inspection while an engine owns another.

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use repforge_core::{
    ExerciseId, ExerciseLog, PlanExerciseId, SessionCompletion, SessionId, SessionPerformance,
    SessionRecord, SetRecord, SetTarget, WorkoutDayId, WorkoutPlanExercise,
};
use tokio::sync::Mutex;
use tracing::debug;

use super::history::{group_recent_performance, is_personal_record};
use super::{Result, Storage, StorageError};

#[derive(Default)]
struct MemoryState {
    plan: HashMap<PlanExerciseId, WorkoutPlanExercise>,
    sessions: HashMap<SessionId, SessionRecord>,
    logs: Vec<ExerciseLog>,
    sets: Vec<SetRecord>,
}

/// Storage backend that keeps everything in process memory.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of exercise logs stored.
    pub async fn log_count(&self) -> usize {
        self.state.lock().await.logs.len()
    }

    /// All set records of a session, in insertion order.
    pub async fn session_sets(&self, session_id: SessionId) -> Vec<SetRecord> {
        self.state
            .lock()
            .await
            .sets
            .iter()
            .filter(|s| s.session_id == session_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn load_plan(&self, day_id: WorkoutDayId) -> Result<Vec<WorkoutPlanExercise>> {
        let state = self.state.lock().await;
        let mut plan: Vec<WorkoutPlanExercise> = state
            .plan
            .values()
            .filter(|e| e.day_id == day_id)
            .cloned()
            .collect();
        plan.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Ok(plan)
    }

    async fn load_plan_exercise(&self, id: PlanExerciseId) -> Result<Option<WorkoutPlanExercise>> {
        Ok(self.state.lock().await.plan.get(&id).cloned())
    }

    async fn save_plan_exercise(&mut self, exercise: &WorkoutPlanExercise) -> Result<()> {
        self.state.lock().await.plan.insert(exercise.id, exercise.clone());
        Ok(())
    }

    async fn update_exercise_targets(&mut self, id: PlanExerciseId, sets: &[SetTarget]) -> Result<()> {
        let mut state = self.state.lock().await;
        let exercise = state
            .plan
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("plan exercise {}", id)))?;
        exercise.sets = sets.to_vec();
        Ok(())
    }

    async fn create_session_record(&mut self, session: &SessionRecord) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.sessions.contains_key(&session.id) {
            return Err(StorageError::Conflict(format!("session {} already exists", session.id)));
        }
        state.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn load_session_record(&self, id: SessionId) -> Result<Option<SessionRecord>> {
        Ok(self.state.lock().await.sessions.get(&id).cloned())
    }

    async fn complete_session_record(&mut self, id: SessionId, completion: &SessionCompletion) -> Result<()> {
        let mut state = self.state.lock().await;
        let session = state
            .sessions
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("session {}", id)))?;
        if session.is_completed() {
            return Err(StorageError::Conflict(format!("session {} already completed", id)));
        }
        session.completion = Some(completion.clone());
        Ok(())
    }

    async fn find_exercise_log(&self, session_id: SessionId, exercise_id: ExerciseId) -> Result<Option<ExerciseLog>> {
        Ok(self
            .state
            .lock()
            .await
            .logs
            .iter()
            .find(|l| l.session_id == session_id && l.exercise_id == exercise_id)
            .cloned())
    }

    async fn create_exercise_log(&mut self, log: &ExerciseLog) -> Result<()> {
        let mut state = self.state.lock().await;
        if state
            .logs
            .iter()
            .any(|l| l.session_id == log.session_id && l.exercise_id == log.exercise_id)
        {
            return Err(StorageError::Conflict(format!(
                "session {} already has a log for exercise {}",
                log.session_id, log.exercise_id
            )));
        }
        state.logs.push(log.clone());
        Ok(())
    }

    async fn create_set_record(&mut self, record: &SetRecord) -> Result<SetRecord> {
        let mut state = self.state.lock().await;
        if !state.logs.iter().any(|l| l.id == record.log_id) {
            return Err(StorageError::NotFound(format!("exercise log {}", record.log_id)));
        }
        let mut stored = record.clone();
        stored.personal_record = is_personal_record(&stored, &state.sets);
        if stored.personal_record {
            debug!("Personal record for exercise {}", stored.exercise_id);
        }
        state.sets.push(stored.clone());
        Ok(stored)
    }

    async fn fetch_recent_performance(&self, exercise_id: ExerciseId, limit: usize) -> Result<Vec<SessionPerformance>> {
        let state = self.state.lock().await;
        Ok(group_recent_performance(state.sessions.values(), &state.sets, exercise_id, limit))
    }
}
