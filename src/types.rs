use std::fmt;

/// Pass/fail state of a single exercise.
///
/// `Done` means the most recent applied run exited successfully; everything
/// else (non-zero exit, timeout, launch failure) is `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExerciseStatus {
    #[default]
    Pending,
    Done,
}

impl ExerciseStatus {
    pub fn is_done(self) -> bool {
        matches!(self, ExerciseStatus::Done)
    }
}

impl fmt::Display for ExerciseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseStatus::Pending => f.write_str("PENDING"),
            ExerciseStatus::Done => f.write_str("DONE"),
        }
    }
}

/// How a single run of the Runner ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The child process exited on its own (with any exit code).
    Completed,
    /// The wall-clock budget elapsed and the child was killed.
    TimedOut,
    /// The child could not be started at all.
    LaunchFailed,
}
