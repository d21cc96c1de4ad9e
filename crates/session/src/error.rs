//! Session engine errors.

use repforge_core::ValidationError;
use repforge_storage::StorageError;

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors surfaced by the session controller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The plan cannot be trained
    #[error("Invalid plan: {0}")]
    PlanInvalid(String),

    /// A storage write or read failed
    #[error("Persistence failed: {0}")]
    Persistence(#[from] StorageError),

    /// User-entered performance was rejected
    #[error("Invalid performance: {0}")]
    InvalidPerformance(#[from] ValidationError),

    /// The operation does not apply in the current state
    #[error("Cannot {action} while session is {state}")]
    InvalidState {
        /// Attempted operation
        action: &'static str,
        /// State name at the time
        state: &'static str,
    },
}
