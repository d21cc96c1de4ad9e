//! Session layer - set-by-set workout execution, rest timing, and recording.

#![warn(missing_docs)]

pub mod pointer;
pub mod rest_timer;
pub mod ticker;
pub mod preview;
pub mod recorder;
pub mod config;
pub mod error;
pub mod controller;

pub use pointer::{classify_sets, total_sets, SessionPointer, SessionProgress, SetStatus};
pub use rest_timer::{RestTimer, RestTimerState};
pub use ticker::{RestEvent, RestEventKind, RestTicker};
pub use preview::NextSetPreview;
pub use recorder::PerformanceRecorder;
pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use controller::{Advance, RestOutcome, SessionController, SessionState, SessionSummary, SetCompletion};
