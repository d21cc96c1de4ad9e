//! Progression settings.

use serde::{Deserialize, Serialize};

/// How rep changes treat targets that are not an exact number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepRangePolicy {
    /// Leave range and to-failure targets unchanged
    #[default]
    Preserve,
    /// Move both bounds of a range; to-failure stays unchanged
    Shift,
}

impl RepRangePolicy {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RepRangePolicy::Preserve => "preserve",
            RepRangePolicy::Shift => "shift",
        }
    }
}

/// Settings for progression analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionSettings {
    /// Successful sessions in a row needed to progress
    pub consecutive_successes_required: usize,

    /// Reps below target still counted as a success
    pub reps_tolerance: u32,

    /// Past sessions fetched for analysis
    pub history_window: usize,

    /// Treatment of range targets on rep changes
    pub rep_range_policy: RepRangePolicy,
}

impl Default for ProgressionSettings {
    fn default() -> Self {
        Self {
            consecutive_successes_required: 2,
            reps_tolerance: 0,
            history_window: 5,
            rep_range_policy: RepRangePolicy::Preserve,
        }
    }
}

impl ProgressionSettings {
    /// Create default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the success streak required to progress.
    pub fn with_consecutive_successes_required(mut self, required: usize) -> Self {
        self.consecutive_successes_required = required;
        self
    }

    /// Set the rep tolerance.
    pub fn with_reps_tolerance(mut self, tolerance: u32) -> Self {
        self.reps_tolerance = tolerance;
        self
    }

    /// Set the number of sessions fetched.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Set the rep range policy.
    pub fn with_rep_range_policy(mut self, policy: RepRangePolicy) -> Self {
        self.rep_range_policy = policy;
        self
    }
}
