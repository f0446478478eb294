// src/exercise/progress.rs

use crate::types::ExerciseStatus;

/// Read-only view of the aggregate progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
}

impl ProgressSnapshot {
    pub fn all_done(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// Incrementally maintained completion counter.
///
/// The count is only computed by a full scan at construction; afterwards
/// every status transition adjusts it by at most one. The "finished"
/// notification fires on the transition into "all done" and is re-armed as
/// soon as any exercise drops back to pending.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    completed: usize,
    total: usize,
    completed_flag: bool,
}

impl ProgressTracker {
    pub fn new<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = ExerciseStatus>,
    {
        let mut completed = 0;
        let mut total = 0;
        for status in statuses {
            total += 1;
            if status.is_done() {
                completed += 1;
            }
        }

        // Already complete at start-up is a level, not a transition.
        Self {
            completed,
            total,
            completed_flag: total > 0 && completed == total,
        }
    }

    /// Account for one status change. Returns `true` when this change
    /// completed the set for the first time since the last re-arm.
    pub fn record_transition(&mut self, previous: ExerciseStatus, current: ExerciseStatus) -> bool {
        match (previous, current) {
            (ExerciseStatus::Pending, ExerciseStatus::Done) => {
                self.completed += 1;
                if self.completed == self.total && !self.completed_flag {
                    self.completed_flag = true;
                    return true;
                }
            }
            (ExerciseStatus::Done, ExerciseStatus::Pending) => {
                self.completed = self.completed.saturating_sub(1);
                self.completed_flag = false;
            }
            _ => {}
        }
        false
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed_flag(&self) -> bool {
        self.completed_flag
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.completed,
            total: self.total,
        }
    }
}
