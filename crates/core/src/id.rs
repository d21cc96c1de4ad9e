//! Unique identifiers for RepForge entities.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Ulid);

        impl $name {
            /// Generate a new identifier.
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

ulid_id!(
    /// Unique identifier for an exercise definition
    ExerciseId
);

ulid_id!(
    /// Unique identifier for an exercise placed in a workout day
    PlanExerciseId
);

ulid_id!(
    /// Unique identifier for a workout day
    WorkoutDayId
);

ulid_id!(
    /// Unique identifier for a training session
    SessionId
);

ulid_id!(
    /// Unique identifier for the per-session log of one exercise
    ExerciseLogId
);

ulid_id!(
    /// Unique identifier for a recorded set
    SetRecordId
);
