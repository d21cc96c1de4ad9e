//! Backend-independent helpers for history queries and record flags.

use std::collections::HashMap;
use repforge_core::{ExerciseId, SessionId, SessionPerformance, SessionRecord, SetRecord};

/// Group set records into per-session performances.
///
/// Only sets of `exercise_id` in completed sessions are kept. Sessions are
/// ordered newest first and truncated to `limit`; sets are ordered by set number.
pub fn group_recent_performance<'a>(
    sessions: impl IntoIterator<Item = &'a SessionRecord>,
    sets: impl IntoIterator<Item = &'a SetRecord>,
    exercise_id: ExerciseId,
    limit: usize,
) -> Vec<SessionPerformance> {
    let completed: HashMap<SessionId, &SessionRecord> = sessions
        .into_iter()
        .filter(|s| s.is_completed())
        .map(|s| (s.id, s))
        .collect();

    let mut by_session: HashMap<SessionId, Vec<SetRecord>> = HashMap::new();
    for set in sets {
        if set.exercise_id == exercise_id && completed.contains_key(&set.session_id) {
            by_session.entry(set.session_id).or_default().push(set.clone());
        }
    }

    let mut performances: Vec<SessionPerformance> = by_session
        .into_iter()
        .filter_map(|(session_id, mut sets)| {
            let session = completed.get(&session_id)?;
            sets.sort_by_key(|s| s.set_number);
            Some(SessionPerformance {
                session_id,
                date: session.started_at,
                sets,
            })
        })
        .collect();

    performances.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.session_id.cmp(&a.session_id)));
    performances.truncate(limit);
    performances
}

/// Whether `record` beats every earlier set of the same exercise on estimated 1RM.
pub fn is_personal_record<'a>(record: &SetRecord, earlier: impl IntoIterator<Item = &'a SetRecord>) -> bool {
    let estimate = record.estimated_one_rep_max();
    if estimate <= 0.0 {
        return false;
    }
    earlier
        .into_iter()
        .filter(|s| s.exercise_id == record.exercise_id && s.id != record.id)
        .all(|s| s.estimated_one_rep_max() < estimate)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Duration, Utc};
    use repforge_core::{
        ExerciseId, ExerciseLogId, PerformanceEntry, RepTarget, SessionCompletion, SessionRecord,
        SessionTotals, SetKind, SetRecord, SetRecordId, WorkoutDayId,
    };

    pub fn session(days_ago: i64, completed: bool) -> SessionRecord {
        let mut session = SessionRecord::new(WorkoutDayId::new());
        session.started_at = Utc::now() - Duration::days(days_ago);
        if completed {
            session.completion = Some(SessionCompletion {
                completed_at: session.started_at + Duration::hours(1),
                duration_seconds: 3600,
                totals: SessionTotals::default(),
                reward_points: 0,
            });
        }
        session
    }

    pub fn set(session: &SessionRecord, exercise_id: ExerciseId, number: u32, weight: f64, reps: u32) -> SetRecord {
        SetRecord {
            id: SetRecordId::new(),
            log_id: ExerciseLogId::new(),
            session_id: session.id,
            exercise_id,
            set_number: number,
            kind: SetKind::Working,
            target_reps: RepTarget::Exact(10),
            performance: PerformanceEntry::new(weight, reps, 8),
            recorded_at: session.started_at,
            personal_record: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{session, set};
    use super::*;

    #[test]
    fn test_group_orders_newest_first_and_limits() {
        let exercise = ExerciseId::new();
        let old = session(10, true);
        let mid = session(5, true);
        let new = session(1, true);
        let sets = vec![
            set(&old, exercise, 1, 100.0, 10),
            set(&new, exercise, 2, 100.0, 9),
            set(&new, exercise, 1, 100.0, 10),
            set(&mid, exercise, 1, 100.0, 8),
        ];

        let grouped = group_recent_performance([&old, &mid, &new], &sets, exercise, 2);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].session_id, new.id);
        assert_eq!(grouped[1].session_id, mid.id);
        assert_eq!(grouped[0].sets[0].set_number, 1);
        assert_eq!(grouped[0].sets[1].set_number, 2);
    }

    #[test]
    fn test_group_skips_incomplete_sessions_and_other_exercises() {
        let exercise = ExerciseId::new();
        let done = session(2, true);
        let open = session(0, false);
        let sets = vec![
            set(&done, exercise, 1, 100.0, 10),
            set(&done, ExerciseId::new(), 1, 50.0, 10),
            set(&open, exercise, 1, 100.0, 10),
        ];

        let grouped = group_recent_performance([&done, &open], &sets, exercise, 10);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].sets.len(), 1);
    }

    #[test]
    fn test_personal_record() {
        let exercise = ExerciseId::new();
        let s = session(0, false);
        let earlier = vec![set(&s, exercise, 1, 100.0, 5), set(&s, ExerciseId::new(), 1, 300.0, 5)];

        assert!(is_personal_record(&set(&s, exercise, 2, 100.0, 6), &earlier));
        assert!(!is_personal_record(&set(&s, exercise, 2, 100.0, 5), &earlier));
        assert!(!is_personal_record(&set(&s, exercise, 2, 100.0, 0), &[]));
        assert!(is_personal_record(&set(&s, exercise, 1, 20.0, 1), &[]));
    }
}
