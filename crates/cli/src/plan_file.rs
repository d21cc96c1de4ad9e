//! Plan files and CLI settings read from JSON.

use std::path::Path;
use anyhow::{bail, Context, Result};
use repforge_core::{
    ExerciseDefinition, ExerciseId, SetTarget, TrackedMetrics, WorkoutDayId, WorkoutPlanExercise,
};
use repforge_progression::ProgressionSettings;
use repforge_session::SessionConfig;
use serde::Deserialize;

/// A workout day as written by hand.
#[derive(Debug, Deserialize)]
pub struct PlanFile {
    /// Day to import into; a new one when absent
    #[serde(default)]
    pub day_id: Option<WorkoutDayId>,

    /// Exercises in training order
    pub exercises: Vec<PlanFileExercise>,
}

/// One exercise of a plan file.
#[derive(Debug, Deserialize)]
pub struct PlanFileExercise {
    /// Reuse an existing exercise so history carries over
    #[serde(default)]
    pub exercise_id: Option<ExerciseId>,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub tracks: TrackedMetrics,

    /// Prescribed sets
    pub sets: Vec<SetTarget>,

    #[serde(default = "default_rest")]
    pub rest_seconds: u32,

    #[serde(default)]
    pub notes: String,
}

fn default_rest() -> u32 {
    90
}

impl PlanFile {
    /// Read a plan file from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading plan file {}", path.display()))?;
        let plan: PlanFile = serde_json::from_str(&content)
            .with_context(|| format!("parsing plan file {}", path.display()))?;
        if plan.exercises.is_empty() {
            bail!("plan file {} has no exercises", path.display());
        }
        Ok(plan)
    }

    /// Build plan exercises, ordered as listed.
    pub fn into_exercises(self) -> (WorkoutDayId, Vec<WorkoutPlanExercise>) {
        let day_id = self.day_id.unwrap_or_default();
        let exercises = self
            .exercises
            .into_iter()
            .enumerate()
            .map(|(order, entry)| {
                let mut definition = ExerciseDefinition::new(entry.name);
                if let Some(id) = entry.exercise_id {
                    definition.id = id;
                }
                definition.tracks = entry.tracks;

                let mut exercise = WorkoutPlanExercise::new(day_id, definition, entry.sets, entry.rest_seconds);
                exercise.order = order as u32;
                exercise.notes = entry.notes;
                exercise
            })
            .collect();
        (day_id, exercises)
    }
}

/// Engine settings, each section optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Session engine configuration
    pub session: SessionConfig,

    /// Progression configuration
    pub progression: ProgressionSettings,
}

impl Settings {
    /// Read settings from a JSON file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing settings {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repforge_core::RepTarget;
    use repforge_progression::RepRangePolicy;
    use std::io::Write;

    #[test]
    fn test_read_plan_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "exercises": [
                    {{"name": "Bench Press", "rest_seconds": 120, "sets": [
                        {{"kind": "warmup", "weight": 40, "reps": 10}},
                        {{"kind": "working", "weight": 80, "reps": {{"exact": 8}}}}
                    ]}},
                    {{"name": "Row", "sets": [
                        {{"kind": "working", "weight": 60, "reps": {{"range": {{"min": 8, "max": 12}}}}}}
                    ]}}
                ]
            }}"#
        )
        .unwrap();

        let (day_id, exercises) = PlanFile::read(file.path()).unwrap().into_exercises();
        assert_eq!(exercises.len(), 2);
        assert!(exercises.iter().all(|e| e.day_id == day_id));
        assert_eq!(exercises[0].rest_seconds, 120);
        assert_eq!(exercises[1].rest_seconds, 90);
        assert_eq!(exercises[1].order, 1);
        assert_eq!(exercises[1].sets[0].rep_target(), RepTarget::Range { min: 8, max: 12 });
    }

    #[test]
    fn test_empty_plan_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"exercises": []}}"#).unwrap();
        assert!(PlanFile::read(file.path()).is_err());
    }

    #[test]
    fn test_partial_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"progression": {{"reps_tolerance": 1, "rep_range_policy": "shift"}}}}"#).unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.progression.reps_tolerance, 1);
        assert_eq!(settings.progression.rep_range_policy, RepRangePolicy::Shift);
        assert_eq!(settings.progression.history_window, 5);
        assert_eq!(settings.session, SessionConfig::default());

        assert_eq!(Settings::load(None).unwrap().session.points_per_set, 10);
    }
}
