//! The session controller - drives one workout from start to finish.

use std::collections::HashSet;
use std::sync::Arc;
use repforge_core::{
    PerformanceEntry, SessionCompletion, SessionId, SessionRecord, SessionTotals, SetRecord,
    SetTarget, WorkoutDayId, WorkoutPlanExercise,
};
use repforge_storage::Storage;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::preview::set_counts;
use crate::{
    classify_sets, total_sets, NextSetPreview, PerformanceRecorder, RestEvent, RestEventKind,
    RestTicker, RestTimer, RestTimerState, Result, SessionConfig, SessionError, SessionPointer,
    SessionProgress, SetStatus,
};

/// Lifecycle of a session.
///
/// ```text
/// Loading → Active ⇄ RestPending → Finishing → Completed
///    ↓         ↓           ↓            ↓
///  Failed   Abandoned   Abandoned    Abandoned
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Waiting for a plan
    Loading,
    /// A set is in progress
    Active {
        /// Current set
        pointer: SessionPointer,
    },
    /// Resting after a recorded set
    RestPending {
        /// The set just recorded
        pointer: SessionPointer,
        /// What comes next
        preview: NextSetPreview,
    },
    /// All sets done, waiting for finish
    Finishing,
    /// Finished and persisted
    Completed {
        /// Result of the session
        summary: SessionSummary,
    },
    /// Left without finishing
    Abandoned,
    /// Could not start
    Failed {
        /// What went wrong
        reason: String,
    },
}

impl SessionState {
    /// Name of the state.
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Loading => "loading",
            SessionState::Active { .. } => "active",
            SessionState::RestPending { .. } => "resting",
            SessionState::Finishing => "finishing",
            SessionState::Completed { .. } => "completed",
            SessionState::Abandoned => "abandoned",
            SessionState::Failed { .. } => "failed",
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed { .. } | SessionState::Abandoned | SessionState::Failed { .. }
        )
    }

    /// Whether moving to `next` is a legal transition.
    pub fn can_transition_to(&self, next: &SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Loading, Active { .. } | Failed { .. } | Abandoned) => true,
            (Active { .. }, Active { .. } | RestPending { .. } | Finishing | Completed { .. } | Abandoned) => true,
            (RestPending { .. }, Active { .. } | Finishing | Completed { .. } | Abandoned) => true,
            (Finishing, Completed { .. } | Abandoned) => true,
            _ => false,
        }
    }
}

/// Result of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier
    pub session_id: SessionId,

    /// Workout day trained
    pub day_id: WorkoutDayId,

    /// Persisted completion data
    pub completion: SessionCompletion,

    /// Sets flagged as personal records
    pub personal_records: usize,
}

/// Outcome of completing the current set.
#[derive(Debug, Clone, PartialEq)]
pub enum SetCompletion {
    /// The set was stored and rest began
    Recorded {
        /// Stored record
        record: SetRecord,
        /// What comes next
        preview: NextSetPreview,
    },
    /// The session is already over
    Ignored,
}

/// Where the pointer went after leaving a set or rest period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// A new current set
    Set(SessionPointer),
    /// No sets remain
    Finishing,
    /// The session is already over
    Ignored,
}

/// Outcome of a rest control or rest event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestOutcome {
    /// Still resting
    Resting(RestTimerState),
    /// Rest ended and the pointer moved
    Advanced(Advance),
    /// Not applicable (stale event or session over)
    Ignored,
}

/// Drives a workout session.
///
/// Owns the plan, the pointer, the rest timer and its ticker, and a
/// recorder that writes through to storage. Storage failures leave the
/// state exactly as it was before the call.
pub struct SessionController<S: Storage> {
    storage: S,
    config: SessionConfig,
    state: SessionState,
    plan: Vec<WorkoutPlanExercise>,
    set_counts: Vec<usize>,
    session: Option<SessionRecord>,
    recorder: PerformanceRecorder,
    defaults: PerformanceEntry,
    recorded: Vec<SetRecord>,
    timer: Arc<Mutex<RestTimer>>,
    ticker: Option<RestTicker>,
    rest_generation: u64,
    rest_tx: mpsc::UnboundedSender<RestEvent>,
    rest_rx: Option<mpsc::UnboundedReceiver<RestEvent>>,
}

impl<S: Storage> SessionController<S> {
    /// Create a controller in the `Loading` state.
    pub fn new(storage: S) -> Self {
        let (rest_tx, rest_rx) = mpsc::unbounded_channel();
        Self {
            storage,
            config: SessionConfig::default(),
            state: SessionState::Loading,
            plan: Vec::new(),
            set_counts: Vec::new(),
            session: None,
            recorder: PerformanceRecorder::new(),
            defaults: PerformanceEntry {
                weight: 0.0,
                reps: 0,
                effort: 0,
                completed: false,
            },
            recorded: Vec::new(),
            timer: Arc::new(Mutex::new(RestTimer::new())),
            ticker: None,
            rest_generation: 0,
            rest_tx,
            rest_rx: Some(rest_rx),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Take the receiver of rest ticker events. Returns `None` after the first call.
    pub fn take_rest_events(&mut self) -> Option<mpsc::UnboundedReceiver<RestEvent>> {
        self.rest_rx.take()
    }

    // === Lifecycle ===

    /// Load a workout day from storage and start it.
    pub async fn start_day(&mut self, day_id: WorkoutDayId) -> Result<()> {
        if !matches!(self.state, SessionState::Loading) {
            debug!("Session already started, ignoring start");
            return Ok(());
        }

        match self.storage.load_plan(day_id).await {
            Ok(plan) => self.start(plan).await,
            Err(e) => {
                self.fail(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Start a session over `plan`. A no-op once started.
    pub async fn start(&mut self, plan: Vec<WorkoutPlanExercise>) -> Result<()> {
        if !matches!(self.state, SessionState::Loading) {
            debug!("Session already started, ignoring start");
            return Ok(());
        }

        let counts = set_counts(&plan);
        let pointer = match validate_plan(&plan).and_then(|_| {
            SessionPointer::first(&counts).ok_or_else(|| "workout day has no sets".to_string())
        }) {
            Ok(pointer) => pointer,
            Err(reason) => {
                self.fail(reason.clone());
                return Err(SessionError::PlanInvalid(reason));
            }
        };

        let record = SessionRecord::new(plan[0].day_id);
        if let Err(e) = self.storage.create_session_record(&record).await {
            self.fail(e.to_string());
            return Err(e.into());
        }

        info!(
            "Started session {} with {} exercises, {} sets",
            record.id,
            plan.len(),
            total_sets(&counts)
        );

        self.plan = plan;
        self.set_counts = counts;
        self.session = Some(record);
        self.transition(SessionState::Active { pointer })?;
        self.seed_defaults();
        Ok(())
    }

    /// Record the current set and begin resting.
    ///
    /// On any error the pointer and state are unchanged so the set can be retried.
    pub async fn complete_current_set(&mut self, performance: PerformanceEntry) -> Result<SetCompletion> {
        let pointer = match &self.state {
            SessionState::Active { pointer } => *pointer,
            SessionState::Completed { .. } | SessionState::Abandoned => {
                debug!("Session is {}, ignoring set", self.state.name());
                return Ok(SetCompletion::Ignored);
            }
            other => return Err(invalid("complete a set", other)),
        };

        performance.validate()?;
        let session_id = self.require_session("complete a set")?;

        let exercise = &self.plan[pointer.exercise_index()];
        let rest_seconds = exercise.rest_seconds;
        let record = self
            .recorder
            .record_set(&mut self.storage, session_id, exercise, pointer.set_index(), performance)
            .await?;

        if record.personal_record {
            info!("New personal record on {}", exercise.exercise.name);
        }

        let preview = NextSetPreview::after(&self.plan, pointer);
        self.transition(SessionState::RestPending {
            pointer,
            preview: preview.clone(),
        })?;
        self.recorded.push(record.clone());
        self.start_rest(rest_seconds).await;

        Ok(SetCompletion::Recorded { record, preview })
    }

    /// Leave the rest period and move to the next set.
    pub async fn advance_past_rest(&mut self) -> Result<Advance> {
        let pointer = match &self.state {
            SessionState::RestPending { pointer, .. } => *pointer,
            SessionState::Completed { .. } | SessionState::Abandoned => return Ok(Advance::Ignored),
            other => return Err(invalid("advance past rest", other)),
        };

        self.stop_rest().await;
        let next = pointer.next_set(&self.set_counts);
        self.move_to(next)
    }

    /// Skip the remaining sets of the current exercise without recording them.
    pub async fn skip_exercise(&mut self) -> Result<Advance> {
        let pointer = match &self.state {
            SessionState::Active { pointer } | SessionState::RestPending { pointer, .. } => *pointer,
            SessionState::Completed { .. } | SessionState::Abandoned => return Ok(Advance::Ignored),
            other => return Err(invalid("skip an exercise", other)),
        };

        debug!("Skipping exercise {}", pointer.exercise_index());
        self.stop_rest().await;
        let next = pointer.next_exercise(&self.set_counts);
        self.move_to(next)
    }

    /// Finish the session and persist its completion.
    ///
    /// Idempotent: once completed, returns the stored summary without writing again.
    pub async fn finish(&mut self) -> Result<SessionSummary> {
        match &self.state {
            SessionState::Completed { summary } => return Ok(summary.clone()),
            SessionState::Active { .. } | SessionState::RestPending { .. } | SessionState::Finishing => {}
            other => return Err(invalid("finish", other)),
        }

        let session = self
            .session
            .clone()
            .ok_or_else(|| invalid("finish", &self.state))?;

        let completed_at = chrono::Utc::now();
        let duration_seconds = (completed_at - session.started_at).num_seconds().max(0) as u64;
        let completion = SessionCompletion {
            completed_at,
            duration_seconds,
            totals: self.totals(),
            reward_points: self
                .config
                .reward_points(self.recorded.len(), total_sets(&self.set_counts)),
        };

        self.storage.complete_session_record(session.id, &completion).await?;
        self.stop_rest().await;

        let summary = SessionSummary {
            session_id: session.id,
            day_id: session.day_id,
            completion,
            personal_records: self.recorded.iter().filter(|r| r.personal_record).count(),
        };

        info!(
            "Completed session {}: {} sets, {:.1} volume, {} points",
            summary.session_id,
            summary.completion.totals.sets,
            summary.completion.totals.volume,
            summary.completion.reward_points
        );

        self.transition(SessionState::Completed {
            summary: summary.clone(),
        })?;
        Ok(summary)
    }

    /// Leave the session without finishing it.
    pub async fn abandon(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            return Ok(());
        }

        self.stop_rest().await;
        if let Some(session) = &self.session {
            info!("Abandoned session {} after {} sets", session.id, self.recorded.len());
        }
        self.transition(SessionState::Abandoned)
    }

    // === Rest controls ===

    /// Add (or with a negative delta, remove) seconds of rest.
    pub async fn adjust_rest(&mut self, delta_seconds: i64) -> Result<RestOutcome> {
        if !self.rest_gate("adjust rest")? {
            return Ok(RestOutcome::Ignored);
        }

        let fired = self.timer.lock().await.adjust(delta_seconds);
        if fired {
            return self.advance_past_rest().await.map(RestOutcome::Advanced);
        }
        Ok(RestOutcome::Resting(self.rest_state().await))
    }

    /// Pause the rest countdown.
    pub async fn pause_rest(&mut self) -> Result<RestOutcome> {
        if !self.rest_gate("pause rest")? {
            return Ok(RestOutcome::Ignored);
        }

        self.ticker = None;
        self.timer.lock().await.pause();
        Ok(RestOutcome::Resting(self.rest_state().await))
    }

    /// Resume a paused rest countdown.
    pub async fn resume_rest(&mut self) -> Result<RestOutcome> {
        if !self.rest_gate("resume rest")? {
            return Ok(RestOutcome::Ignored);
        }

        self.timer.lock().await.resume();
        self.ensure_ticker().await;
        Ok(RestOutcome::Resting(self.rest_state().await))
    }

    /// Restore the full rest duration.
    ///
    /// A timer that already expired restarts as a new rest period, so its
    /// pending expiry event no longer applies.
    pub async fn reset_rest(&mut self) -> Result<RestOutcome> {
        if !self.rest_gate("reset rest")? {
            return Ok(RestOutcome::Ignored);
        }

        let restarted = {
            let mut timer = self.timer.lock().await;
            let expired = matches!(timer.state(), RestTimerState::Expired { .. });
            timer.reset();
            expired
        };
        if restarted {
            self.rest_generation += 1;
            self.ticker = None;
            debug!("Restarted expired rest (period {})", self.rest_generation);
        }
        self.ensure_ticker().await;
        Ok(RestOutcome::Resting(self.rest_state().await))
    }

    /// End the rest now and move on.
    pub async fn skip_rest(&mut self) -> Result<RestOutcome> {
        if !self.rest_gate("skip rest")? {
            return Ok(RestOutcome::Ignored);
        }

        let _ = self.timer.lock().await.skip();
        self.advance_past_rest().await.map(RestOutcome::Advanced)
    }

    /// Advance the rest countdown by one tick without the background ticker.
    pub async fn tick_rest(&mut self) -> Result<RestOutcome> {
        if !self.rest_gate("tick rest")? {
            return Ok(RestOutcome::Ignored);
        }

        let fired = self.timer.lock().await.tick();
        if fired {
            return self.advance_past_rest().await.map(RestOutcome::Advanced);
        }
        Ok(RestOutcome::Resting(self.rest_state().await))
    }

    /// Apply an event from the rest ticker. Events from earlier rest periods are ignored.
    pub async fn handle_rest_event(&mut self, event: RestEvent) -> Result<RestOutcome> {
        if event.generation != self.rest_generation
            || !matches!(self.state, SessionState::RestPending { .. })
        {
            debug!("Ignoring stale rest event {:?}", event);
            return Ok(RestOutcome::Ignored);
        }

        match event.kind {
            RestEventKind::Tick { .. } => Ok(RestOutcome::Resting(self.rest_state().await)),
            RestEventKind::Expired => self.advance_past_rest().await.map(RestOutcome::Advanced),
        }
    }

    // === Queries ===

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current pointer, while a set is active or resting.
    pub fn pointer(&self) -> Option<SessionPointer> {
        match &self.state {
            SessionState::Active { pointer } | SessionState::RestPending { pointer, .. } => Some(*pointer),
            _ => None,
        }
    }

    /// The session record, once started.
    pub fn session(&self) -> Option<&SessionRecord> {
        self.session.as_ref()
    }

    /// The plan being trained.
    pub fn plan(&self) -> &[WorkoutPlanExercise] {
        &self.plan
    }

    /// Exercise under the pointer.
    pub fn current_exercise(&self) -> Option<&WorkoutPlanExercise> {
        self.pointer().map(|p| &self.plan[p.exercise_index()])
    }

    /// Prescription of the set under the pointer.
    pub fn current_target(&self) -> Option<&SetTarget> {
        self.pointer()
            .map(|p| &self.plan[p.exercise_index()].sets[p.set_index()])
    }

    /// Values pre-filled for the current set.
    pub fn current_defaults(&self) -> PerformanceEntry {
        self.defaults
    }

    /// Progress through the plan.
    pub fn progress(&self) -> SessionProgress {
        SessionProgress::at(&self.set_counts, self.progress_pointer())
    }

    /// Status of every set, grouped per exercise.
    pub fn set_statuses(&self) -> Vec<Vec<SetStatus>> {
        classify_sets(&self.set_counts, self.progress_pointer())
    }

    /// Sets recorded this session, in order.
    pub fn recorded_sets(&self) -> &[SetRecord] {
        &self.recorded
    }

    /// Snapshot of the rest timer.
    pub async fn rest_state(&self) -> RestTimerState {
        self.timer.lock().await.state()
    }

    /// Generation of the current rest period.
    pub fn rest_generation(&self) -> u64 {
        self.rest_generation
    }

    /// Aggregates over the recorded sets.
    pub fn totals(&self) -> SessionTotals {
        let exercises: HashSet<_> = self.recorded.iter().map(|r| r.exercise_id).collect();
        SessionTotals {
            sets: self.recorded.len(),
            reps: self.recorded.iter().map(|r| r.performance.reps).sum(),
            volume: self.recorded.iter().map(|r| r.performance.volume()).sum(),
            exercises: exercises.len(),
        }
    }

    /// Get the storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    // === Internals ===

    fn transition(&mut self, next: SessionState) -> Result<()> {
        if !self.state.can_transition_to(&next) {
            return Err(SessionError::InvalidState {
                action: next.name(),
                state: self.state.name(),
            });
        }
        debug!("Session {} -> {}", self.state.name(), next.name());
        self.state = next;
        Ok(())
    }

    fn fail(&mut self, reason: String) {
        warn!("Session failed to start: {}", reason);
        self.state = SessionState::Failed { reason };
    }

    fn move_to(&mut self, next: Option<SessionPointer>) -> Result<Advance> {
        match next {
            Some(pointer) => {
                self.transition(SessionState::Active { pointer })?;
                self.seed_defaults();
                Ok(Advance::Set(pointer))
            }
            None => {
                self.transition(SessionState::Finishing)?;
                Ok(Advance::Finishing)
            }
        }
    }

    fn seed_defaults(&mut self) {
        if let Some(target) = self.current_target() {
            self.defaults = PerformanceEntry {
                weight: target.weight(),
                reps: target.rep_target().default_reps(),
                effort: 0,
                completed: false,
            };
        }
    }

    fn progress_pointer(&self) -> Option<SessionPointer> {
        match &self.state {
            SessionState::Finishing | SessionState::Completed { .. } => None,
            SessionState::Active { pointer } | SessionState::RestPending { pointer, .. } => Some(*pointer),
            _ => SessionPointer::first(&self.set_counts),
        }
    }

    fn require_session(&self, action: &'static str) -> Result<SessionId> {
        self.session
            .as_ref()
            .map(|s| s.id)
            .ok_or_else(|| invalid(action, &self.state))
    }

    /// `Ok(true)` while resting, `Ok(false)` once the session is over.
    fn rest_gate(&self, action: &'static str) -> Result<bool> {
        match &self.state {
            SessionState::RestPending { .. } => Ok(true),
            SessionState::Completed { .. } | SessionState::Abandoned => Ok(false),
            other => Err(invalid(action, other)),
        }
    }

    async fn start_rest(&mut self, seconds: u32) {
        self.rest_generation += 1;
        self.ticker = None;
        self.timer.lock().await.start(seconds);
        debug!("Resting {}s (period {})", seconds, self.rest_generation);
        self.ensure_ticker().await;
    }

    async fn stop_rest(&mut self) {
        self.ticker = None;
        self.timer.lock().await.clear();
    }

    async fn ensure_ticker(&mut self) {
        if !self.config.rest_ticker || !self.timer.lock().await.is_running() {
            return;
        }
        if self.ticker.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }
        self.ticker = Some(RestTicker::spawn(
            self.timer.clone(),
            self.rest_generation,
            self.rest_tx.clone(),
            self.config.tick_period,
        ));
    }
}

fn validate_plan(plan: &[WorkoutPlanExercise]) -> std::result::Result<(), String> {
    if plan.is_empty() {
        return Err("workout day has no exercises".to_string());
    }
    if let Some(empty) = plan.iter().find(|e| e.sets.is_empty()) {
        return Err(format!("exercise '{}' has no sets", empty.exercise.name));
    }
    Ok(())
}

fn invalid(action: &'static str, state: &SessionState) -> SessionError {
    SessionError::InvalidState {
        action,
        state: state.name(),
    }
}
