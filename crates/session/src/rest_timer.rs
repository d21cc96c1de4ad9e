//! Rest countdown between sets.
//!
//! The timer is a plain state machine with no clock of its own; the
//! [`RestTicker`](crate::RestTicker) drives it once per second.

use serde::{Deserialize, Serialize};

/// Observable state of the rest timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RestTimerState {
    /// No rest in progress
    Idle,
    /// Counting down
    Running {
        /// Seconds left
        remaining: u32,
        /// Full duration of this rest period
        baseline: u32,
    },
    /// Countdown halted
    Paused {
        /// Seconds left
        remaining: u32,
        /// Full duration of this rest period
        baseline: u32,
    },
    /// Rest finished
    Expired {
        /// Full duration of the finished rest period
        baseline: u32,
    },
}

impl RestTimerState {
    /// Name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            RestTimerState::Idle => "idle",
            RestTimerState::Running { .. } => "running",
            RestTimerState::Paused { .. } => "paused",
            RestTimerState::Expired { .. } => "expired",
        }
    }
}

/// Countdown that fires its completion exactly once per rest period.
///
/// Methods that can complete the countdown return `true` on the call that
/// fired it; every later call returns `false` until the next [`start`].
///
/// [`start`]: RestTimer::start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestTimer {
    state: RestTimerState,
}

impl Default for RestTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl RestTimer {
    /// Create an idle timer.
    pub fn new() -> Self {
        Self { state: RestTimerState::Idle }
    }

    /// Current state.
    pub fn state(&self) -> RestTimerState {
        self.state
    }

    /// Seconds left; zero unless running or paused.
    pub fn remaining(&self) -> u32 {
        match self.state {
            RestTimerState::Running { remaining, .. } | RestTimerState::Paused { remaining, .. } => remaining,
            RestTimerState::Idle | RestTimerState::Expired { .. } => 0,
        }
    }

    /// Whether the countdown is advancing.
    pub fn is_running(&self) -> bool {
        matches!(self.state, RestTimerState::Running { .. })
    }

    /// Begin a new rest period, discarding any previous one.
    pub fn start(&mut self, seconds: u32) {
        self.state = RestTimerState::Running {
            remaining: seconds,
            baseline: seconds,
        };
    }

    /// Advance one second. Returns `true` when this tick finished the rest.
    #[must_use]
    pub fn tick(&mut self) -> bool {
        match self.state {
            RestTimerState::Running { remaining, baseline } if remaining > 1 => {
                self.state = RestTimerState::Running {
                    remaining: remaining - 1,
                    baseline,
                };
                false
            }
            RestTimerState::Running { baseline, .. } => self.expire(baseline),
            _ => false,
        }
    }

    /// Halt the countdown. Only affects a running timer.
    pub fn pause(&mut self) {
        if let RestTimerState::Running { remaining, baseline } = self.state {
            self.state = RestTimerState::Paused { remaining, baseline };
        }
    }

    /// Continue a paused countdown.
    pub fn resume(&mut self) {
        if let RestTimerState::Paused { remaining, baseline } = self.state {
            self.state = RestTimerState::Running { remaining, baseline };
        }
    }

    /// Restore the full duration, keeping a paused timer paused.
    ///
    /// An expired timer starts counting down again.
    pub fn reset(&mut self) {
        self.state = match self.state {
            RestTimerState::Running { baseline, .. } | RestTimerState::Expired { baseline } => RestTimerState::Running {
                remaining: baseline,
                baseline,
            },
            RestTimerState::Paused { baseline, .. } => RestTimerState::Paused {
                remaining: baseline,
                baseline,
            },
            RestTimerState::Idle => RestTimerState::Idle,
        };
    }

    /// Finish the rest now. Returns `true` if this call fired completion.
    #[must_use]
    pub fn skip(&mut self) -> bool {
        match self.state {
            RestTimerState::Running { baseline, .. } | RestTimerState::Paused { baseline, .. } => {
                self.expire(baseline)
            }
            _ => false,
        }
    }

    /// Add `delta` seconds to both the remaining time and the baseline,
    /// flooring each at zero.
    ///
    /// A running timer driven to zero expires and this call returns `true`.
    #[must_use]
    pub fn adjust(&mut self, delta: i64) -> bool {
        let shift = |value: u32| (i64::from(value) + delta).clamp(0, i64::from(u32::MAX)) as u32;
        match self.state {
            RestTimerState::Running { remaining, baseline } => {
                let (remaining, baseline) = (shift(remaining), shift(baseline));
                if remaining == 0 {
                    return self.expire(baseline);
                }
                self.state = RestTimerState::Running { remaining, baseline };
                false
            }
            RestTimerState::Paused { remaining, baseline } => {
                self.state = RestTimerState::Paused {
                    remaining: shift(remaining),
                    baseline: shift(baseline),
                };
                false
            }
            _ => false,
        }
    }

    /// Drop the rest period entirely.
    pub fn clear(&mut self) {
        self.state = RestTimerState::Idle;
    }

    fn expire(&mut self, baseline: u32) -> bool {
        self.state = RestTimerState::Expired { baseline };
        true
    }
}
