use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use pylings::engine::{BatchEvaluator, ExerciseContext};
use pylings::exec::{ProcessRunner, TIMEOUT_MESSAGE};
use pylings::exercise::Registry;
use pylings::fs::RealFileSystem;
use pylings::types::ExerciseStatus;
use pylings::workspace::{TomlHintStore, Workspace};
use pylings_test_utils::builders::WorkspaceBuilder;
use pylings_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn three_exercises_pass_fail_and_time_out() {
    init_tracing();
    let ws = WorkspaceBuilder::new()
        .timeout_secs(1)
        .exercise("00_intro/a.sh", "echo fine\n")
        .exercise("00_intro/b.sh", "echo broken >&2\nexit 1\n")
        .exercise("01_loops/c.sh", "exec sleep 15\n")
        .hints("[exercise_1]\nname = \"b\"\nhint = \"exit with zero\"\n")
        .build();

    let workspace = Workspace::open(ws.config_path()).unwrap();
    let cfg = &workspace.config;
    let hints = TomlHintStore::load(&workspace.hints_file()).unwrap();
    let registry = Registry::discover(
        &RealFileSystem,
        &workspace.exercises_dir(),
        &cfg.paths.pattern,
        &hints,
    )
    .unwrap();
    assert_eq!(registry.names(), vec!["a.sh", "b.sh", "c.sh"]);

    let (tx, _rx) = mpsc::unbounded_channel();
    let ctx = ExerciseContext::new(registry, Arc::new(ProcessRunner::from_config(cfg)), tx);

    let started = Instant::now();
    with_timeout(BatchEvaluator::new(cfg.max_workers()).initialize(&ctx, None))
        .await
        .unwrap();
    // The runs overlap, so the sleeper's budget bounds the whole batch.
    assert!(started.elapsed() < Duration::from_secs(5));

    let snapshot = ctx.snapshot();
    assert_eq!(snapshot.progress.completed, 1);
    assert_eq!(snapshot.progress.total, 3);

    let a = snapshot.get("a.sh").unwrap();
    assert_eq!(a.status, ExerciseStatus::Done);
    assert_eq!(a.stdout, "fine\n");

    let b = snapshot.get("b.sh").unwrap();
    assert_eq!(b.status, ExerciseStatus::Pending);
    assert!(b.stderr.as_deref().unwrap().contains("broken"));
    assert_eq!(b.hint.as_deref(), Some("exit with zero"));

    let c = snapshot.get("c.sh").unwrap();
    assert_eq!(c.status, ExerciseStatus::Pending);
    assert_eq!(c.stderr.as_deref(), Some(TIMEOUT_MESSAGE));
}
