//! Session configuration.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Configuration for a training session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Points awarded per recorded set
    pub points_per_set: u32,

    /// Bonus when every planned set was recorded
    pub completion_bonus: u32,

    /// Whether rest periods are counted down by a background task
    pub rest_ticker: bool,

    /// Interval between rest ticks
    #[serde(with = "duration_secs")]
    pub tick_period: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            points_per_set: 10,
            completion_bonus: 50,
            rest_ticker: true,
            tick_period: Duration::from_secs(1),
        }
    }
}

impl SessionConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set points per recorded set.
    pub fn with_points_per_set(mut self, points: u32) -> Self {
        self.points_per_set = points;
        self
    }

    /// Set the completion bonus.
    pub fn with_completion_bonus(mut self, bonus: u32) -> Self {
        self.completion_bonus = bonus;
        self
    }

    /// Enable or disable the background rest ticker.
    pub fn with_rest_ticker(mut self, enabled: bool) -> Self {
        self.rest_ticker = enabled;
        self
    }

    /// Set the tick interval.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Points for a session with `recorded` sets out of `planned`.
    pub fn reward_points(&self, recorded: usize, planned: usize) -> u32 {
        let base = self.points_per_set.saturating_mul(recorded as u32);
        if planned > 0 && recorded >= planned {
            base.saturating_add(self.completion_bonus)
        } else {
            base
        }
    }
}

mod duration_secs {
    use std::time::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_points() {
        let config = SessionConfig::default();
        assert_eq!(config.reward_points(5, 5), 100);
        assert_eq!(config.reward_points(3, 5), 30);
        assert_eq!(config.reward_points(0, 0), 0);

        let custom = SessionConfig::new().with_points_per_set(5).with_completion_bonus(0);
        assert_eq!(custom.reward_points(4, 4), 20);
    }
}
