//! Background task that drives a [`RestTimer`] in wall-clock time.

use std::sync::Arc;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::RestTimer;

/// Event emitted by a running ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestEvent {
    /// Rest period the event belongs to
    pub generation: u64,

    /// What happened
    pub kind: RestEventKind,
}

/// Kind of rest event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RestEventKind {
    /// One second elapsed
    Tick {
        /// Seconds left after this tick
        remaining: u32,
    },
    /// The countdown reached zero
    Expired,
}

/// Handle to a ticking task.
///
/// The task stops on its own once the timer expires or stops running.
/// Dropping the handle stops it immediately.
pub struct RestTicker {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl RestTicker {
    /// Spawn a ticker for one rest period. Must be called inside a tokio runtime.
    pub fn spawn(
        timer: Arc<Mutex<RestTimer>>,
        generation: u64,
        events: mpsc::UnboundedSender<RestEvent>,
        period: Duration,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let (fired, running, remaining) = {
                            let mut timer = timer.lock().await;
                            let fired = timer.tick();
                            (fired, timer.is_running(), timer.remaining())
                        };

                        if fired {
                            debug!("Rest period {} expired", generation);
                            let _ = events.send(RestEvent { generation, kind: RestEventKind::Expired });
                            break;
                        }
                        if !running {
                            break;
                        }
                        let tick = RestEvent { generation, kind: RestEventKind::Tick { remaining } };
                        if events.send(tick).is_err() {
                            break;
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Rest ticker {} received shutdown signal", generation);
                        break;
                    }
                }
            }
        });

        Self { shutdown_tx, handle }
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RestTicker {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.try_send(());
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(seconds: u32) -> Arc<Mutex<RestTimer>> {
        let mut timer = RestTimer::new();
        timer.start(seconds);
        Arc::new(Mutex::new(timer))
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_then_expires_once() {
        let timer = shared(3);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ticker = RestTicker::spawn(timer.clone(), 7, tx, Duration::from_secs(1));

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(
            events,
            vec![
                RestEvent { generation: 7, kind: RestEventKind::Tick { remaining: 2 } },
                RestEvent { generation: 7, kind: RestEventKind::Tick { remaining: 1 } },
                RestEvent { generation: 7, kind: RestEventKind::Expired },
            ]
        );
        assert!(ticker.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_timer_paused() {
        let timer = shared(60);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ticker = RestTicker::spawn(timer.clone(), 1, tx, Duration::from_secs(1));

        assert!(matches!(rx.recv().await, Some(RestEvent { kind: RestEventKind::Tick { remaining: 59 }, .. })));
        timer.lock().await.pause();

        assert!(rx.recv().await.is_none());
        assert!(ticker.is_finished());
        assert_eq!(timer.lock().await.remaining(), 59);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_ticking() {
        let timer = shared(60);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ticker = RestTicker::spawn(timer.clone(), 1, tx, Duration::from_secs(1));
        drop(ticker);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.recv().await.is_none());
        assert_eq!(timer.lock().await.remaining(), 60);
    }
}
