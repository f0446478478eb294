// src/exec/mod.rs

//! Exercise execution layer.
//!
//! - [`runner`] owns the `ExerciseRunner` trait and `ProcessRunner`, which
//!   runs one exercise file in a child process under a wall-clock budget.
//! - This module holds the transient [`RunResult`] and the one place where a
//!   result is mapped to an [`ExerciseStatus`].

use crate::types::{ExerciseStatus, RunOutcome};

pub mod runner;

pub use runner::{ExerciseRunner, ProcessRunner};

/// Exit code reported for timeouts and launch failures.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Diagnostic substituted for stderr when a run exceeds its budget.
pub const TIMEOUT_MESSAGE: &str = "Exercise timed out due to possible infinite loop.";

/// Result of running one exercise once. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub outcome: RunOutcome,
}

impl RunResult {
    pub fn completed(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            outcome: RunOutcome::Completed,
        }
    }

    /// The child was killed after the budget elapsed; `partial_stdout` is
    /// whatever it printed before that.
    pub fn timed_out(partial_stdout: impl Into<String>) -> Self {
        Self {
            exit_code: FAILURE_EXIT_CODE,
            stdout: partial_stdout.into(),
            stderr: TIMEOUT_MESSAGE.to_string(),
            outcome: RunOutcome::TimedOut,
        }
    }

    pub fn launch_failed(message: impl Into<String>) -> Self {
        Self {
            exit_code: FAILURE_EXIT_CODE,
            stdout: String::new(),
            stderr: message.into(),
            outcome: RunOutcome::LaunchFailed,
        }
    }

    pub fn status(&self) -> ExerciseStatus {
        status_for(self)
    }
}

/// Map a run result to an exercise status.
///
/// Every caller goes through here: `Done` iff the exit code is zero.
pub fn status_for(result: &RunResult) -> ExerciseStatus {
    if result.exit_code == 0 {
        ExerciseStatus::Done
    } else {
        ExerciseStatus::Pending
    }
}
