// src/app/view.rs

//! Plain-text rendering of the session state.
//!
//! Everything here returns a `String` so the console loop decides where it
//! goes.

use std::fmt::Write as _;
use std::path::Path;

use crate::engine::ActionOutcome;
use crate::exec::RunResult;
use crate::exercise::{ExerciseRecord, ProgressSnapshot, RegistrySnapshot};

pub const BAR_WIDTH: usize = 55;

pub const MENU: &str =
    "n:next  x:rerun  r:reset exercise  c:check all  h:hint  l:list  s <name|#>:select  q:quit";

pub const DONE_MESSAGE: &str = "When you are done experimenting, remove 'FIXME' from the current \
exercise and type `n` for the next exercise.";

pub const FINISHED_MESSAGE: &str =
    "Congratulations! Every exercise is done. Thanks for using pylings!";

pub const EXIT_MESSAGE: &str = "Thanks for using pylings!";

/// `Progress: [#####>------]   done/total`
pub fn progress_bar(progress: ProgressSnapshot) -> String {
    let ProgressSnapshot { completed, total } = progress;
    let filled = if total == 0 {
        0
    } else {
        completed * BAR_WIDTH / total
    };
    let remaining = BAR_WIDTH.saturating_sub(filled + 1);
    format!(
        "Progress: [{}>{}]   {completed}/{total}",
        "#".repeat(filled),
        "-".repeat(remaining)
    )
}

/// Full view of one exercise: status, output or error, hint, solution.
pub fn render_exercise(
    record: &ExerciseRecord,
    show_hint: bool,
    solution: Option<&Path>,
    progress: ProgressSnapshot,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Current exercise: {}", record.path.display());
    let _ = writeln!(out);

    if record.status.is_done() {
        let _ = writeln!(out, "Output");
        let _ = writeln!(out, "{}", record.stdout.trim_end());
        let _ = writeln!(out);
        let _ = writeln!(out, "Exercise done");
        if let Some(solution) = solution {
            let _ = writeln!(out, "Solution for comparison: {}", solution.display());
        }
        let _ = writeln!(out, "{DONE_MESSAGE}");
    } else if let Some(err) = &record.stderr {
        let _ = writeln!(out, "{}", err.trim_end());
    }

    if show_hint {
        let _ = writeln!(out);
        match &record.hint {
            Some(hint) => {
                let _ = writeln!(out, "Hint:");
                let _ = writeln!(out, "{}", hint.trim_end());
            }
            None => {
                let _ = writeln!(out, "No hint found for the current exercise.");
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", progress_bar(progress));
    let _ = write!(out, "{MENU}");
    out
}

/// One line per exercise, marking the current one.
pub fn render_list(snapshot: &RegistrySnapshot, current: Option<&str>) -> String {
    let mut out = String::new();
    for (i, record) in snapshot.exercises.iter().enumerate() {
        let marker = if current == Some(record.name.as_str()) {
            ">>"
        } else {
            "  "
        };
        let _ = writeln!(
            out,
            "{marker} {:>3}  {:<7}  {}",
            i + 1,
            record.status.to_string(),
            record.name
        );
    }
    let _ = write!(out, "{}", progress_bar(snapshot.progress));
    out
}

/// Output of a one-off run: stdout on success, the diagnostic otherwise.
pub fn render_run(result: &RunResult) -> String {
    if result.status().is_done() {
        result.stdout.clone()
    } else if result.stderr.is_empty() {
        format!("exited with code {}", result.exit_code)
    } else {
        result.stderr.clone()
    }
}

/// Short status line for a foreground action, if it needs one.
pub fn render_outcome(outcome: &ActionOutcome) -> Option<String> {
    match outcome {
        ActionOutcome::NotDone(name) => Some(format!(
            "{name} is not done yet; fix it before moving on."
        )),
        ActionOutcome::LastExercise => Some("This is the last exercise.".to_string()),
        ActionOutcome::MissingBackup(backup) => Some(format!(
            "No backup found at {}; exercise left unchanged.",
            backup.display()
        )),
        ActionOutcome::NoSelection => Some("No current exercise selected.".to_string()),
        ActionOutcome::Advanced(_)
        | ActionOutcome::Reset(_)
        | ActionOutcome::Selected(_)
        | ActionOutcome::Rerun(_) => None,
    }
}

pub fn check_progress_line(name: &str, completed: usize, total: usize) -> String {
    format!("Checking exercise: {completed}/{total} {name}")
}
