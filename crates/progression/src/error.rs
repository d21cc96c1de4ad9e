//! Progression errors.

use repforge_storage::StorageError;

/// Errors from progression analysis.
#[derive(Debug, thiserror::Error)]
pub enum ProgressionError {
    /// Not enough past sessions to judge a trend
    #[error("Insufficient history: {found} sessions, {required} required")]
    InsufficientHistory {
        /// Usable sessions
        found: usize,
        /// Sessions needed
        required: usize,
    },

    /// The exercise prescribes no working set
    #[error("Exercise '{0}' has no working sets")]
    NoWorkingSets(String),

    /// Working sets are prescribed without a rep count (to failure)
    #[error("No rep target to judge sessions against")]
    NoRepTarget,

    /// Storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
