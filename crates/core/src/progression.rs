//! Progression model - trend classification and target adjustments.

use serde::{Deserialize, Serialize};
use crate::plan::SetTarget;
use crate::Time;

/// Trend of an exercise over recent sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Target met often enough to increase it
    Progression,
    /// Target missed often enough to decrease it
    Regression,
    /// Target not met at all over a longer window
    Stagnation,
    /// Nothing to act on
    None,
}

impl Classification {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Progression => "progression",
            Classification::Regression => "regression",
            Classification::Stagnation => "stagnation",
            Classification::None => "none",
        }
    }

    /// Whether the user should be shown this classification.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Classification::None)
    }
}

/// Snapshot of the prescription an exercise is analysed against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentTarget {
    /// Working-set load
    pub weight: f64,

    /// Working-set reps
    pub reps: u32,

    /// Number of working sets
    pub working_sets: usize,
}

impl CurrentTarget {
    /// Derive from a set list: first working set's load and reps, working-set count.
    ///
    /// Returns `None` when the list has no working set.
    pub fn from_sets(sets: &[SetTarget]) -> Option<Self> {
        let first = sets.iter().find(|s| s.is_working())?;
        Some(Self {
            weight: first.weight(),
            reps: first.rep_target().default_reps(),
            working_sets: sets.iter().filter(|s| s.is_working()).count(),
        })
    }
}

/// One past session as seen by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionHistoryEntry {
    /// Session date
    pub date: Time,

    /// Target reps the session is judged against
    pub target_reps: u32,

    /// Average reps over working sets, rounded
    pub actual_reps: u32,

    /// Heaviest working-set load
    pub weight: f64,

    /// Whether the target was met within tolerance
    pub success: bool,
}

/// Result of analysing an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionAnalysis {
    /// Trend classification
    pub classification: Classification,

    /// Prescription the history was judged against
    pub current_target: CurrentTarget,

    /// History window used, oldest first
    pub history: Vec<ProgressionHistoryEntry>,

    /// Successes in the streak ending at the most recent session
    pub consecutive_successes: usize,

    /// Failures in the streak ending at the most recent session
    pub consecutive_failures: usize,

    /// Human-readable reason
    pub reason: String,

    /// Concrete options, if any
    pub recommendation: Option<ProgressionRecommendation>,
}

/// How a target list is adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "delta", rename_all = "snake_case")]
pub enum TargetChange {
    /// Add kg to every working set
    Weight(f64),
    /// Add reps to every exact-rep working set
    Reps(i32),
    /// Append copies of the last working set
    Volume(u32),
    /// Leave the list as is
    KeepCurrent,
}

impl TargetChange {
    /// Method name of this change.
    pub fn method(&self) -> ChangeMethod {
        match self {
            TargetChange::Weight(_) => ChangeMethod::Weight,
            TargetChange::Reps(_) => ChangeMethod::Reps,
            TargetChange::Volume(_) => ChangeMethod::Volume,
            TargetChange::KeepCurrent => ChangeMethod::KeepCurrent,
        }
    }

    /// Build a change from a method and a numeric delta.
    ///
    /// Reps and volume deltas are rounded; a negative volume is `None`.
    pub fn from_method(method: ChangeMethod, delta: f64) -> Option<Self> {
        match method {
            ChangeMethod::Weight => Some(TargetChange::Weight(delta)),
            ChangeMethod::Reps => Some(TargetChange::Reps(delta.round() as i32)),
            ChangeMethod::Volume if delta >= 0.0 => Some(TargetChange::Volume(delta.round() as u32)),
            ChangeMethod::Volume => None,
            ChangeMethod::KeepCurrent => Some(TargetChange::KeepCurrent),
        }
    }
}

/// Adjustment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeMethod {
    /// Load change
    Weight,
    /// Rep change
    Reps,
    /// Extra working sets
    Volume,
    /// No change
    KeepCurrent,
}

impl ChangeMethod {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeMethod::Weight => "weight",
            ChangeMethod::Reps => "reps",
            ChangeMethod::Volume => "volume",
            ChangeMethod::KeepCurrent => "keep_current",
        }
    }
}

impl std::str::FromStr for ChangeMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weight" => Ok(ChangeMethod::Weight),
            "reps" => Ok(ChangeMethod::Reps),
            "volume" => Ok(ChangeMethod::Volume),
            "keep" | "keep_current" => Ok(ChangeMethod::KeepCurrent),
            other => Err(format!("unknown change method: {}", other)),
        }
    }
}

/// A labelled adjustment the user can pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationOption {
    /// Display label
    pub label: String,

    /// The change to apply
    pub change: TargetChange,
}

/// Concrete adjustment options for an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionRecommendation {
    /// Load options
    pub weight_options: Vec<RecommendationOption>,

    /// Rep options
    pub rep_options: Vec<RecommendationOption>,

    /// Extra-set options (progression only)
    pub volume_options: Vec<RecommendationOption>,

    /// Default choice
    pub suggested: RecommendationOption,

    /// Why the default was chosen
    pub rationale: String,
}

impl ProgressionRecommendation {
    /// All options, suggested default excluded.
    pub fn options(&self) -> impl Iterator<Item = &RecommendationOption> {
        self.weight_options
            .iter()
            .chain(self.rep_options.iter())
            .chain(self.volume_options.iter())
    }
}
