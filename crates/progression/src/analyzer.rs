//! Trend classification over recent sessions.

use repforge_core::{
    Classification, CurrentTarget, ProgressionAnalysis, ProgressionHistoryEntry, SessionPerformance,
    SetKind,
};
use tracing::debug;

use crate::recommendation::recommend;
use crate::{ProgressionError, ProgressionSettings};

/// Usable sessions needed before a trend is judged.
pub const MIN_HISTORY: usize = 2;

/// Failed sessions in a row that trigger a regression.
pub const REGRESSION_STREAK: usize = 2;

/// Sessions needed before a lack of progress is reported.
pub const STAGNATION_WINDOW: usize = 4;

/// Run of identical outcomes starting at the most recent session.
///
/// At most one of the two counts is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Streak {
    /// Successful sessions in the run
    pub successes: usize,
    /// Failed sessions in the run
    pub failures: usize,
}

impl Streak {
    /// Scan entries given most recent first, stopping at the first flip.
    pub fn scan(entries: &[ProgressionHistoryEntry]) -> Self {
        let Some(first) = entries.first() else {
            return Self::default();
        };
        let run = entries.iter().take_while(|e| e.success == first.success).count();
        if first.success {
            Self { successes: run, failures: 0 }
        } else {
            Self { successes: 0, failures: run }
        }
    }
}

/// Judge one past session against the target reps.
///
/// Returns `None` when the session has no working sets.
pub fn history_entry(
    performance: &SessionPerformance,
    target_reps: u32,
    reps_tolerance: u32,
) -> Option<ProgressionHistoryEntry> {
    let working: Vec<_> = performance
        .sets
        .iter()
        .filter(|s| s.kind == SetKind::Working)
        .collect();
    if working.is_empty() {
        return None;
    }

    let total: u32 = working.iter().map(|s| s.performance.reps).sum();
    let actual_reps = (f64::from(total) / working.len() as f64).round() as u32;
    let weight = working
        .iter()
        .map(|s| s.performance.weight)
        .fold(0.0, f64::max);

    Some(ProgressionHistoryEntry {
        date: performance.date,
        target_reps,
        actual_reps,
        weight,
        success: actual_reps >= target_reps.saturating_sub(reps_tolerance),
    })
}

/// Classify the trend of an exercise.
///
/// `history` is most recent first. The returned history is oldest first.
/// Identical inputs always produce identical output.
///
/// A target of zero reps (working sets taken to failure) cannot be judged.
pub fn analyze(
    history: &[SessionPerformance],
    target: &CurrentTarget,
    settings: &ProgressionSettings,
) -> Result<ProgressionAnalysis, ProgressionError> {
    if target.reps == 0 {
        return Err(ProgressionError::NoRepTarget);
    }

    let mut entries: Vec<ProgressionHistoryEntry> = history
        .iter()
        .filter_map(|p| history_entry(p, target.reps, settings.reps_tolerance))
        .collect();

    if entries.len() < MIN_HISTORY {
        return Err(ProgressionError::InsufficientHistory {
            found: entries.len(),
            required: MIN_HISTORY,
        });
    }

    let streak = Streak::scan(&entries);
    let target_reached = entries.iter().any(|e| e.actual_reps >= e.target_reps);

    let classification = if streak.successes >= settings.consecutive_successes_required {
        Classification::Progression
    } else if streak.failures >= REGRESSION_STREAK {
        Classification::Regression
    } else if entries.len() >= STAGNATION_WINDOW && !target_reached {
        Classification::Stagnation
    } else {
        Classification::None
    };

    let reason = describe(classification, streak, entries.len(), target.reps);
    debug!("Analyzed {} sessions: {} ({})", entries.len(), classification.as_str(), reason);

    entries.reverse();
    Ok(ProgressionAnalysis {
        classification,
        current_target: *target,
        history: entries,
        consecutive_successes: streak.successes,
        consecutive_failures: streak.failures,
        reason,
        recommendation: recommend(classification, target),
    })
}

fn describe(classification: Classification, streak: Streak, sessions: usize, target_reps: u32) -> String {
    match classification {
        Classification::Progression => format!(
            "Hit {} reps in {} consecutive sessions",
            target_reps, streak.successes
        ),
        Classification::Regression => format!(
            "Missed {} reps in {} consecutive sessions",
            target_reps, streak.failures
        ),
        Classification::Stagnation => format!(
            "No session in the last {} reached {} reps",
            sessions, target_reps
        ),
        Classification::None if streak.successes > 0 => format!(
            "{} successful session(s) in a row, not enough to progress",
            streak.successes
        ),
        Classification::None => format!(
            "{} missed session(s) in a row, not enough to regress",
            streak.failures
        ),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use repforge_core::{
        ExerciseId, ExerciseLogId, PerformanceEntry, RepTarget, SessionId, SessionPerformance,
        SetKind, SetRecord, SetRecordId,
    };

    /// A past session `days_ago` with one working set per entry of `reps`.
    pub fn session(exercise_id: ExerciseId, days_ago: i64, weight: f64, reps: &[u32]) -> SessionPerformance {
        let session_id = SessionId::new();
        let log_id = ExerciseLogId::new();
        let date = chrono::Utc::now() - chrono::Duration::days(days_ago);
        let sets = reps
            .iter()
            .enumerate()
            .map(|(i, &r)| SetRecord {
                id: SetRecordId::new(),
                log_id,
                session_id,
                exercise_id,
                set_number: i as u32 + 1,
                kind: SetKind::Working,
                target_reps: RepTarget::Exact(10),
                performance: PerformanceEntry::new(weight, r, 8),
                recorded_at: date,
                personal_record: false,
            })
            .collect();
        SessionPerformance { session_id, date, sets }
    }

    /// Most-recent-first history with one set of `reps` per session.
    pub fn history(reps: &[u32]) -> Vec<SessionPerformance> {
        let exercise = ExerciseId::new();
        reps.iter()
            .enumerate()
            .map(|(i, &r)| session(exercise, i as i64 + 1, 100.0, &[r]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{history, session};
    use super::*;
    use repforge_core::{ExerciseId, RepTarget, SetTarget, TargetChange};

    fn target() -> CurrentTarget {
        CurrentTarget { weight: 100.0, reps: 10, working_sets: 3 }
    }

    #[test]
    fn test_success_streak_progresses() {
        let analysis = analyze(&history(&[12, 11, 8]), &target(), &ProgressionSettings::default()).unwrap();
        assert_eq!(analysis.classification, Classification::Progression);
        assert_eq!(analysis.consecutive_successes, 2);
        assert_eq!(analysis.consecutive_failures, 0);

        let recommendation = analysis.recommendation.unwrap();
        assert_eq!(recommendation.suggested.change, TargetChange::Weight(2.0));
        assert_eq!(recommendation.volume_options.len(), 2);
    }

    #[test]
    fn test_failure_streak_regresses() {
        let analysis = analyze(&history(&[6, 7]), &target(), &ProgressionSettings::default()).unwrap();
        assert_eq!(analysis.classification, Classification::Regression);
        assert_eq!(analysis.consecutive_failures, 2);
        assert_eq!(
            analysis.recommendation.unwrap().suggested.change,
            TargetChange::Weight(-2.5)
        );
    }

    #[test]
    fn test_near_misses_stagnate() {
        let settings = ProgressionSettings::default().with_reps_tolerance(1);
        let analysis = analyze(&history(&[9, 7, 9, 7]), &target(), &settings).unwrap();
        assert_eq!(analysis.classification, Classification::Stagnation);
        assert_eq!(analysis.consecutive_successes, 1);
        assert!(analysis.recommendation.is_none());
    }

    #[test]
    fn test_regression_outranks_stagnation() {
        let analysis = analyze(&history(&[8, 8, 7, 6]), &target(), &ProgressionSettings::default()).unwrap();
        assert_eq!(analysis.classification, Classification::Regression);
        assert_eq!(analysis.consecutive_failures, 4);
    }

    #[test]
    fn test_mixed_history_is_none() {
        let analysis = analyze(&history(&[10, 8, 10]), &target(), &ProgressionSettings::default()).unwrap();
        assert_eq!(analysis.classification, Classification::None);
        assert!(!analysis.classification.is_actionable());
        assert!(analysis.recommendation.is_none());
        assert!(analysis.reason.contains("not enough to progress"));
    }

    #[test]
    fn test_insufficient_history() {
        let result = analyze(&history(&[12]), &target(), &ProgressionSettings::default());
        assert!(matches!(
            result,
            Err(ProgressionError::InsufficientHistory { found: 1, required: 2 })
        ));
    }

    #[test]
    fn test_to_failure_target_not_judged() {
        let to_failure = CurrentTarget::from_sets(&[SetTarget::Working {
            weight: 100.0,
            reps: RepTarget::ToFailure,
        }])
        .unwrap();
        assert_eq!(to_failure.reps, 0);

        let result = analyze(&history(&[12, 11, 8]), &to_failure, &ProgressionSettings::default());
        assert!(matches!(result, Err(ProgressionError::NoRepTarget)));
    }

    #[test]
    fn test_sessions_without_working_sets_skipped() {
        let exercise = ExerciseId::new();
        let mut warmup_only = session(exercise, 1, 40.0, &[12]);
        warmup_only.sets[0].kind = SetKind::Warmup;
        let sessions = vec![warmup_only, session(exercise, 2, 100.0, &[12])];

        let result = analyze(&sessions, &target(), &ProgressionSettings::default());
        assert!(matches!(result, Err(ProgressionError::InsufficientHistory { found: 1, .. })));
    }

    #[test]
    fn test_average_reps_rounded() {
        let exercise = ExerciseId::new();
        let entry = history_entry(&session(exercise, 1, 100.0, &[10, 10, 9]), 10, 0).unwrap();
        assert_eq!(entry.actual_reps, 10);
        assert!(entry.success);

        let entry = history_entry(&session(exercise, 1, 100.0, &[10, 9, 9]), 10, 0).unwrap();
        assert_eq!(entry.actual_reps, 9);
        assert!(!entry.success);
    }

    #[test]
    fn test_history_returned_oldest_first() {
        let sessions = history(&[12, 11, 10]);
        let analysis = analyze(&sessions, &target(), &ProgressionSettings::default()).unwrap();
        let dates: Vec<_> = analysis.history.iter().map(|e| e.date).collect();
        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(analysis.history.last().unwrap().actual_reps, 12);
    }

    #[test]
    fn test_analysis_is_pure() {
        let sessions = history(&[12, 11, 8, 10]);
        let settings = ProgressionSettings::default();
        let first = analyze(&sessions, &target(), &settings).unwrap();
        let second = analyze(&sessions, &target(), &settings).unwrap();
        assert_eq!(first, second);
    }
}
