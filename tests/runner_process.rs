use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tempfile::tempdir;

use pylings::exec::{ExerciseRunner, FAILURE_EXIT_CODE, ProcessRunner, TIMEOUT_MESSAGE};
use pylings::types::{ExerciseStatus, RunOutcome};
use pylings_test_utils::{init_tracing, with_timeout};

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

#[tokio::test]
async fn passing_exercise_is_done_and_keeps_stdout() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = script(dir.path(), "pass.sh", "echo hello\n");

    let runner = ProcessRunner::new("sh", Duration::from_secs(5));
    let result = with_timeout(runner.run(&path)).await;

    assert_eq!(result.outcome, RunOutcome::Completed);
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.stdout, "hello\n");
    assert_eq!(result.status(), ExerciseStatus::Done);
}

#[tokio::test]
async fn failing_exercise_is_pending_and_keeps_stderr() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = script(dir.path(), "fail.sh", "echo oops >&2\nexit 3\n");

    let runner = ProcessRunner::new("sh", Duration::from_secs(5));
    let result = with_timeout(runner.run(&path)).await;

    assert_eq!(result.outcome, RunOutcome::Completed);
    assert_eq!(result.exit_code, 3);
    assert!(result.stderr.contains("oops"));
    assert_eq!(result.status(), ExerciseStatus::Pending);
}

#[tokio::test]
async fn extra_args_come_before_the_exercise_path() {
    init_tracing();
    let dir = tempdir().unwrap();
    // `sh -e` aborts on the failing `false`, so the echo never runs.
    let path = script(dir.path(), "strict.sh", "false\necho unreachable\n");

    let runner = ProcessRunner::new("sh", Duration::from_secs(5)).with_args(vec!["-e".into()]);
    let result = with_timeout(runner.run(&path)).await;

    assert_ne!(result.exit_code, 0);
    assert!(!result.stdout.contains("unreachable"));
}

#[tokio::test]
async fn timeout_kills_the_process_and_keeps_partial_stdout() {
    init_tracing();
    let dir = tempdir().unwrap();
    let pid_file = dir.path().join("pid");
    let body = format!(
        "echo $$ > {}\necho started\nexec sleep 30\n",
        pid_file.display()
    );
    let path = script(dir.path(), "loop.sh", &body);

    let runner = ProcessRunner::new("sh", Duration::from_secs(1));
    let started = Instant::now();
    let result = with_timeout(runner.run(&path)).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(result.outcome, RunOutcome::TimedOut);
    assert_eq!(result.exit_code, FAILURE_EXIT_CODE);
    assert_eq!(result.stderr, TIMEOUT_MESSAGE);
    assert!(result.stdout.contains("started"));
    assert_eq!(result.status(), ExerciseStatus::Pending);

    let pid = fs::read_to_string(&pid_file).unwrap();
    let alive = std::process::Command::new("kill")
        .arg("-0")
        .arg(pid.trim())
        .stderr(std::process::Stdio::null())
        .status()
        .unwrap()
        .success();
    assert!(!alive, "timed out process {} still running", pid.trim());
}

/// A reparented child may linger as a zombie until its new parent reaps it,
/// so a zombie counts as gone.
fn process_alive(pid: &str) -> bool {
    match fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => stat
            .rsplit_once(')')
            .map(|(_, rest)| rest.trim_start().chars().next() != Some('Z'))
            .unwrap_or(true),
        Err(_) => false,
    }
}

#[tokio::test]
async fn timeout_kills_spawned_children_and_keeps_their_output() {
    init_tracing();
    let dir = tempdir().unwrap();
    let pid_file = dir.path().join("child.pid");
    // The sleep inherits stdout, so the pipe stays open until it dies.
    let body = format!(
        "echo started\nsleep 30 &\necho $! > {}\nwait\n",
        pid_file.display()
    );
    let path = script(dir.path(), "spawner.sh", &body);

    let runner = ProcessRunner::new("sh", Duration::from_secs(1));
    let started = Instant::now();
    let result = with_timeout(runner.run(&path)).await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(result.outcome, RunOutcome::TimedOut);
    assert!(result.stdout.contains("started"), "stdout was {:?}", result.stdout);

    let pid = fs::read_to_string(&pid_file).unwrap();
    let pid = pid.trim();
    let deadline = Instant::now() + Duration::from_secs(2);
    while process_alive(pid) && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(!process_alive(pid), "child process {pid} outlived the timeout");
}

#[tokio::test]
async fn missing_interpreter_is_a_launch_failure() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = script(dir.path(), "any.sh", "echo hi\n");

    let runner = ProcessRunner::new("definitely-not-an-interpreter-xyz", Duration::from_secs(5));
    let result = with_timeout(runner.run(&path)).await;

    assert_eq!(result.outcome, RunOutcome::LaunchFailed);
    assert_eq!(result.exit_code, FAILURE_EXIT_CODE);
    assert!(!result.stderr.is_empty());
    assert_eq!(result.status(), ExerciseStatus::Pending);
}
