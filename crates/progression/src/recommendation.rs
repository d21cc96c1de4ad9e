//! Adjustment options and their application to a target list.

use repforge_core::{
    Classification, CurrentTarget, ProgressionRecommendation, RecommendationOption, RepTarget,
    SetTarget, TargetChange,
};

use crate::RepRangePolicy;

/// Rep decreases never take a target below this.
pub const MIN_REPS_ON_DECREASE: u32 = 6;

const PROGRESSION_WEIGHT_STEPS: [f64; 4] = [1.0, 1.5, 2.0, 2.5];
const PROGRESSION_REP_STEPS: [i32; 3] = [1, 2, 3];
const PROGRESSION_VOLUME_STEPS: [u32; 2] = [1, 2];
const REGRESSION_WEIGHT_STEPS: [f64; 2] = [-2.5, -5.0];
const REGRESSION_REP_STEPS: [i32; 2] = [-1, -2];

/// Options for an actionable classification; `None` otherwise.
pub fn recommend(classification: Classification, target: &CurrentTarget) -> Option<ProgressionRecommendation> {
    match classification {
        Classification::Progression => Some(progression(target)),
        Classification::Regression => Some(regression(target)),
        Classification::Stagnation | Classification::None => None,
    }
}

fn progression(target: &CurrentTarget) -> ProgressionRecommendation {
    let weight_options: Vec<_> = PROGRESSION_WEIGHT_STEPS
        .iter()
        .map(|&d| weight_option(target, d))
        .collect();
    let rep_options = PROGRESSION_REP_STEPS
        .iter()
        .map(|&d| rep_option(target, d))
        .collect();
    let volume_options = PROGRESSION_VOLUME_STEPS
        .iter()
        .map(|&n| RecommendationOption {
            label: format!("+{} set{} ({} sets)", n, plural(n as usize), target.working_sets + n as usize),
            change: TargetChange::Volume(n),
        })
        .collect();

    ProgressionRecommendation {
        suggested: weight_option(target, 2.0),
        rationale: format!(
            "You hit {} reps consistently. Adding 2 kg builds strength; \
             for hypertrophy, work up to 12 reps before adding load.",
            target.reps
        ),
        weight_options,
        rep_options,
        volume_options,
    }
}

fn regression(target: &CurrentTarget) -> ProgressionRecommendation {
    let mut weight_options: Vec<RecommendationOption> = Vec::new();
    for &d in &REGRESSION_WEIGHT_STEPS {
        let effective = round2((target.weight + d).max(0.0) - target.weight);
        if effective != 0.0 && !weight_options.iter().any(|o| o.change == TargetChange::Weight(effective)) {
            weight_options.push(weight_option(target, effective));
        }
    }

    let mut rep_options: Vec<RecommendationOption> = Vec::new();
    for &d in &REGRESSION_REP_STEPS {
        let effective = adjust_reps(target.reps, d) as i32 - target.reps as i32;
        if effective != 0 && !rep_options.iter().any(|o| o.change == TargetChange::Reps(effective)) {
            rep_options.push(rep_option(target, effective));
        }
    }

    let suggested = weight_options.first().cloned().unwrap_or(RecommendationOption {
        label: "Keep current target".to_string(),
        change: TargetChange::KeepCurrent,
    });

    ProgressionRecommendation {
        suggested,
        rationale: format!(
            "You missed {} reps in recent sessions. Lighten the load slightly \
             and rebuild with clean form before pushing again.",
            target.reps
        ),
        weight_options,
        rep_options,
        volume_options: Vec::new(),
    }
}

fn weight_option(target: &CurrentTarget, delta: f64) -> RecommendationOption {
    RecommendationOption {
        label: format!("{} kg ({} kg)", signed(delta), round2((target.weight + delta).max(0.0))),
        change: TargetChange::Weight(delta),
    }
}

fn rep_option(target: &CurrentTarget, delta: i32) -> RecommendationOption {
    RecommendationOption {
        label: format!(
            "{} rep{} ({} reps)",
            signed(f64::from(delta)),
            plural(delta.unsigned_abs() as usize),
            adjust_reps(target.reps, delta)
        ),
        change: TargetChange::Reps(delta),
    }
}

/// Apply a change to a target list and return the new list.
///
/// Only working sets are touched. Weights are floored at zero, rep decreases
/// at [`MIN_REPS_ON_DECREASE`], and extra sets are inserted right after the
/// last working set.
pub fn apply_change(sets: &[SetTarget], change: TargetChange, policy: RepRangePolicy) -> Vec<SetTarget> {
    match change {
        TargetChange::Weight(delta) => sets
            .iter()
            .map(|set| match set {
                SetTarget::Working { weight, reps } => SetTarget::Working {
                    weight: round2((weight + delta).max(0.0)),
                    reps: *reps,
                },
                other => other.clone(),
            })
            .collect(),
        TargetChange::Reps(delta) => sets
            .iter()
            .map(|set| match set {
                SetTarget::Working { weight, reps } => SetTarget::Working {
                    weight: *weight,
                    reps: shift_reps(*reps, delta, policy),
                },
                other => other.clone(),
            })
            .collect(),
        TargetChange::Volume(count) => {
            let mut result = sets.to_vec();
            if let Some(last) = sets.iter().rfind(|s| s.is_working()) {
                result.extend(std::iter::repeat(last.clone()).take(count as usize));
            }
            result
        }
        TargetChange::KeepCurrent => sets.to_vec(),
    }
}

fn shift_reps(reps: RepTarget, delta: i32, policy: RepRangePolicy) -> RepTarget {
    match (reps, policy) {
        (RepTarget::Exact(n), _) => RepTarget::Exact(adjust_reps(n, delta)),
        (RepTarget::Range { min, max }, RepRangePolicy::Shift) => {
            let min = adjust_reps(min, delta);
            RepTarget::Range {
                min,
                max: adjust_reps(max, delta).max(min),
            }
        }
        (RepTarget::Range { .. }, RepRangePolicy::Preserve) => reps,
        (RepTarget::ToFailure, _) => reps,
    }
}

/// Add `delta` reps; a decrease stops at 6, or at the current value if already below.
pub fn adjust_reps(current: u32, delta: i32) -> u32 {
    let shifted = i64::from(current) + i64::from(delta);
    if delta >= 0 {
        return shifted.min(i64::from(u32::MAX)) as u32;
    }
    let floor = current.min(MIN_REPS_ON_DECREASE);
    shifted.max(i64::from(floor)) as u32
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn signed(value: f64) -> String {
    if value >= 0.0 {
        format!("+{}", value)
    } else {
        value.to_string()
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sets() -> Vec<SetTarget> {
        vec![
            SetTarget::Warmup { weight: 60.0, reps: 10 },
            SetTarget::working(100.0, 10),
            SetTarget::working(100.0, 10),
            SetTarget::working(100.0, 10),
            SetTarget::Dropset { weight: 70.0, reps: 12 },
        ]
    }

    #[test]
    fn test_weight_change_touches_working_sets_only() {
        let changed = apply_change(&sets(), TargetChange::Weight(2.5), RepRangePolicy::Preserve);
        assert_eq!(changed[0], SetTarget::Warmup { weight: 60.0, reps: 10 });
        assert!(changed[1..4].iter().all(|s| s.weight() == 102.5));
        assert_eq!(changed[4], SetTarget::Dropset { weight: 70.0, reps: 12 });
    }

    #[test]
    fn test_weight_floored_at_zero() {
        let changed = apply_change(&[SetTarget::working(2.5, 10)], TargetChange::Weight(-5.0), RepRangePolicy::Preserve);
        assert_eq!(changed[0].weight(), 0.0);
    }

    #[test]
    fn test_rep_decrease_floor() {
        assert_eq!(adjust_reps(10, -2), 8);
        assert_eq!(adjust_reps(7, -2), 6);
        assert_eq!(adjust_reps(6, -1), 6);
        assert_eq!(adjust_reps(5, -1), 5);
        assert_eq!(adjust_reps(5, 2), 7);

        for current in 0..20 {
            for delta in -5..0 {
                assert!(adjust_reps(current, delta) >= current.min(MIN_REPS_ON_DECREASE));
            }
        }
    }

    #[test]
    fn test_rep_change_policy() {
        let sets = vec![
            SetTarget::working(100.0, 7),
            SetTarget::Working { weight: 100.0, reps: RepTarget::Range { min: 8, max: 12 } },
            SetTarget::Working { weight: 100.0, reps: RepTarget::ToFailure },
        ];

        let preserved = apply_change(&sets, TargetChange::Reps(-2), RepRangePolicy::Preserve);
        assert_eq!(preserved[0].rep_target(), RepTarget::Exact(6));
        assert_eq!(preserved[1].rep_target(), RepTarget::Range { min: 8, max: 12 });
        assert_eq!(preserved[2].rep_target(), RepTarget::ToFailure);

        let shifted = apply_change(&sets, TargetChange::Reps(-3), RepRangePolicy::Shift);
        assert_eq!(shifted[1].rep_target(), RepTarget::Range { min: 6, max: 9 });
        assert_eq!(shifted[2].rep_target(), RepTarget::ToFailure);
    }

    #[test]
    fn test_volume_appends_last_working_set() {
        let changed = apply_change(&sets(), TargetChange::Volume(2), RepRangePolicy::Preserve);
        assert_eq!(changed.len(), 7);
        assert_eq!(changed.iter().filter(|s| s.is_working()).count(), 5);
        assert_eq!(changed[..5], sets()[..]);
        assert_eq!(changed[5], SetTarget::working(100.0, 10));
        assert_eq!(changed[6], SetTarget::working(100.0, 10));

        let warmups = vec![SetTarget::Warmup { weight: 40.0, reps: 10 }];
        assert_eq!(apply_change(&warmups, TargetChange::Volume(1), RepRangePolicy::Preserve), warmups);
    }

    #[test]
    fn test_keep_current_is_identity() {
        assert_eq!(apply_change(&sets(), TargetChange::KeepCurrent, RepRangePolicy::Shift), sets());
    }

    #[test]
    fn test_progression_options() {
        let target = CurrentTarget { weight: 100.0, reps: 10, working_sets: 3 };
        let rec = recommend(Classification::Progression, &target).unwrap();

        let weights: Vec<_> = rec.weight_options.iter().map(|o| o.change).collect();
        assert_eq!(
            weights,
            vec![
                TargetChange::Weight(1.0),
                TargetChange::Weight(1.5),
                TargetChange::Weight(2.0),
                TargetChange::Weight(2.5),
            ]
        );
        assert_eq!(rec.rep_options.len(), 3);
        assert_eq!(rec.volume_options[0].label, "+1 set (4 sets)");
        assert_eq!(rec.suggested.label, "+2 kg (102 kg)");
        assert!(rec.rationale.contains("12 reps"));
        assert_eq!(rec.options().count(), 9);
    }

    #[test]
    fn test_regression_options_clamped() {
        let target = CurrentTarget { weight: 100.0, reps: 7, working_sets: 3 };
        let rec = recommend(Classification::Regression, &target).unwrap();
        assert_eq!(rec.suggested.change, TargetChange::Weight(-2.5));
        assert_eq!(rec.weight_options.len(), 2);
        assert!(rec.volume_options.is_empty());

        let reps: Vec<_> = rec.rep_options.iter().map(|o| o.change).collect();
        assert_eq!(reps, vec![TargetChange::Reps(-1)]);

        let floor = CurrentTarget { weight: 0.0, reps: 6, working_sets: 3 };
        let rec = recommend(Classification::Regression, &floor).unwrap();
        assert!(rec.weight_options.is_empty());
        assert!(rec.rep_options.is_empty());
        assert_eq!(rec.suggested.change, TargetChange::KeepCurrent);
    }

    #[test]
    fn test_no_recommendation_without_trend() {
        let target = CurrentTarget { weight: 100.0, reps: 10, working_sets: 3 };
        assert!(recommend(Classification::Stagnation, &target).is_none());
        assert!(recommend(Classification::None, &target).is_none());
    }
}
