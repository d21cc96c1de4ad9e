//! Position within a workout plan and the progress derived from it.

use serde::{Deserialize, Serialize};

/// Cursor on the current set: `(exercise_index, set_index)`.
///
/// A pointer is only constructed against a plan's set counts, so both
/// indices are always in range for that plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPointer {
    exercise_index: usize,
    set_index: usize,
}

impl SessionPointer {
    /// First set of the first exercise, if the plan has one.
    pub fn first(set_counts: &[usize]) -> Option<Self> {
        Self::at(set_counts, 0, 0)
    }

    /// Pointer at the given position, if it exists in the plan.
    pub fn at(set_counts: &[usize], exercise_index: usize, set_index: usize) -> Option<Self> {
        let sets = *set_counts.get(exercise_index)?;
        (set_index < sets).then_some(Self { exercise_index, set_index })
    }

    /// Index of the current exercise.
    pub fn exercise_index(&self) -> usize {
        self.exercise_index
    }

    /// Index of the current set within its exercise.
    pub fn set_index(&self) -> usize {
        self.set_index
    }

    /// Position of the current set in plan order.
    pub fn global_index(&self, set_counts: &[usize]) -> usize {
        set_counts[..self.exercise_index].iter().sum::<usize>() + self.set_index
    }

    /// The following set, moving to the next exercise when this one is done.
    pub fn next_set(&self, set_counts: &[usize]) -> Option<Self> {
        Self::at(set_counts, self.exercise_index, self.set_index + 1)
            .or_else(|| self.next_exercise(set_counts))
    }

    /// First set of the next exercise.
    pub fn next_exercise(&self, set_counts: &[usize]) -> Option<Self> {
        Self::at(set_counts, self.exercise_index + 1, 0)
    }
}

/// Total number of sets in a plan.
pub fn total_sets(set_counts: &[usize]) -> usize {
    set_counts.iter().sum()
}

/// Status of a set relative to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetStatus {
    /// Before the current set in plan order
    Completed,
    /// The current set
    Current,
    /// Still ahead
    Pending,
}

/// Classify every set of the plan, grouped per exercise.
///
/// `None` means the pointer has run past the end: every set is completed.
pub fn classify_sets(set_counts: &[usize], pointer: Option<SessionPointer>) -> Vec<Vec<SetStatus>> {
    let current = pointer.map_or(total_sets(set_counts), |p| p.global_index(set_counts));
    let mut index = 0;
    set_counts
        .iter()
        .map(|&count| {
            (0..count)
                .map(|_| {
                    let status = match index.cmp(&current) {
                        std::cmp::Ordering::Less => SetStatus::Completed,
                        std::cmp::Ordering::Equal => SetStatus::Current,
                        std::cmp::Ordering::Greater => SetStatus::Pending,
                    };
                    index += 1;
                    status
                })
                .collect()
        })
        .collect()
}

/// Global progress through a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionProgress {
    /// Index of the current set in plan order
    pub global_set_index: usize,

    /// Sets in the plan
    pub total_sets: usize,

    /// Percentage of sets behind the pointer
    pub percentage: f32,
}

impl SessionProgress {
    /// Progress at a pointer; `None` means past the last set.
    pub fn at(set_counts: &[usize], pointer: Option<SessionPointer>) -> Self {
        let total = total_sets(set_counts);
        let global = pointer.map_or(total, |p| p.global_index(set_counts));
        let percentage = if total > 0 {
            (global as f32 / total as f32) * 100.0
        } else {
            0.0
        };

        Self {
            global_set_index: global,
            total_sets: total,
            percentage,
        }
    }
}
