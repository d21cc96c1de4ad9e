//! Progression analysis - trend classification, recommendations, and target updates.

#![warn(missing_docs)]

pub mod settings;
pub mod error;
pub mod analyzer;
pub mod recommendation;
pub mod service;

pub use settings::{ProgressionSettings, RepRangePolicy};
pub use error::ProgressionError;
pub use analyzer::{analyze, history_entry, Streak, MIN_HISTORY};
pub use recommendation::{adjust_reps, apply_change, recommend, MIN_REPS_ON_DECREASE};
pub use service::ProgressionService;
