//! Storage-backed progression evaluation.

use repforge_core::{CurrentTarget, ProgressionAnalysis, SetTarget, TargetChange, WorkoutPlanExercise};
use repforge_storage::Storage;
use tracing::{debug, info, warn};

use crate::{analyze, apply_change, ProgressionError, ProgressionSettings};

/// Runs analyses against stored history and writes chosen changes back.
#[derive(Debug, Clone, Default)]
pub struct ProgressionService {
    settings: ProgressionSettings,
}

impl ProgressionService {
    /// Create a service with the given settings.
    pub fn new(settings: ProgressionSettings) -> Self {
        Self { settings }
    }

    /// Current settings.
    pub fn settings(&self) -> &ProgressionSettings {
        &self.settings
    }

    /// Analyze an exercise, propagating every failure.
    pub async fn try_evaluate<S: Storage + ?Sized>(
        &self,
        storage: &S,
        exercise: &WorkoutPlanExercise,
    ) -> Result<ProgressionAnalysis, ProgressionError> {
        let target = CurrentTarget::from_sets(&exercise.sets)
            .ok_or_else(|| ProgressionError::NoWorkingSets(exercise.exercise.name.clone()))?;
        let history = storage
            .fetch_recent_performance(exercise.exercise.id, self.settings.history_window)
            .await?;
        debug!("Fetched {} sessions of {}", history.len(), exercise.exercise.name);
        analyze(&history, &target, &self.settings)
    }

    /// Analyze an exercise. Any failure means "no recommendation" and yields `None`.
    pub async fn evaluate<S: Storage + ?Sized>(
        &self,
        storage: &S,
        exercise: &WorkoutPlanExercise,
    ) -> Option<ProgressionAnalysis> {
        match self.try_evaluate(storage, exercise).await {
            Ok(analysis) => Some(analysis),
            Err(ProgressionError::InsufficientHistory { found, required }) => {
                debug!(
                    "Not enough history for {} ({} of {} sessions)",
                    exercise.exercise.name, found, required
                );
                None
            }
            Err(ProgressionError::NoRepTarget) => {
                debug!("{} has no rep target, skipping analysis", exercise.exercise.name);
                None
            }
            Err(e) => {
                warn!("Progression analysis for {} failed: {}", exercise.exercise.name, e);
                None
            }
        }
    }

    /// Apply a change to an exercise's targets and persist the new list.
    ///
    /// `KeepCurrent` writes nothing. Returns the resulting list.
    pub async fn apply<S: Storage + ?Sized>(
        &self,
        storage: &mut S,
        exercise: &WorkoutPlanExercise,
        change: TargetChange,
    ) -> Result<Vec<SetTarget>, ProgressionError> {
        let sets = apply_change(&exercise.sets, change, self.settings.rep_range_policy);
        if change == TargetChange::KeepCurrent {
            return Ok(sets);
        }

        storage.update_exercise_targets(exercise.id, &sets).await?;
        info!(
            "Applied {} change to {}",
            change.method().as_str(),
            exercise.exercise.name
        );
        Ok(sets)
    }
}
