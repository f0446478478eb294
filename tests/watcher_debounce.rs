use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep, timeout_at};

use pylings::engine::{EngineEvent, ExerciseContext};
use pylings::exec::ProcessRunner;
use pylings::exercise::Registry;
use pylings::fs::RealFileSystem;
use pylings::types::ExerciseStatus;
use pylings::watch::{ChangeWatcher, ExerciseWatcher, WatchState};
use pylings::workspace::{NoHints, Workspace};
use pylings_test_utils::builders::{TestWorkspace, WorkspaceBuilder};
use pylings_test_utils::init_tracing;

const WINDOW: Duration = Duration::from_millis(300);

fn context(ws: &TestWorkspace) -> (ExerciseContext, mpsc::UnboundedReceiver<EngineEvent>) {
    let workspace = Workspace::open(ws.config_path()).unwrap();
    let registry = Registry::discover(
        &RealFileSystem,
        &workspace.exercises_dir(),
        &workspace.config.paths.pattern,
        &NoHints,
    )
    .unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let runner = Arc::new(ProcessRunner::from_config(&workspace.config));
    (ExerciseContext::new(registry, runner, tx), rx)
}

fn watcher(ctx: &ExerciseContext) -> ChangeWatcher {
    ChangeWatcher::new(ctx.clone(), Arc::new(RealFileSystem), WINDOW)
}

/// Collect every event that arrives within `window`.
async fn events_within(
    rx: &mut mpsc::UnboundedReceiver<EngineEvent>,
    window: Duration,
) -> Vec<EngineEvent> {
    let deadline = Instant::now() + window;
    let mut out = Vec::new();
    while let Ok(Some(event)) = timeout_at(deadline, rx.recv()).await {
        out.push(event);
    }
    out
}

fn refreshes(events: &[EngineEvent], name: &str) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, EngineEvent::RefreshRequested { name: n } if n == name))
        .count()
}

fn two_exercise_workspace() -> TestWorkspace {
    WorkspaceBuilder::new()
        .exercise("00_intro/a.sh", "echo v0\nexit 1\n")
        .exercise("00_intro/b.sh", "echo b\n")
        .build()
}

#[tokio::test]
async fn burst_of_edits_triggers_one_rerun_with_final_content() {
    init_tracing();
    let ws = two_exercise_workspace();
    let (ctx, mut rx) = context(&ws);
    ctx.select("a.sh").unwrap();

    let mut w = watcher(&ctx);
    w.start(&ws.exercise_path("00_intro/a.sh")).unwrap();
    sleep(Duration::from_millis(100)).await;

    for i in 1..=5 {
        ws.write_exercise("00_intro/a.sh", &format!("echo v{i}\n"));
        sleep(Duration::from_millis(30)).await;
    }

    let events = events_within(&mut rx, Duration::from_millis(1500)).await;
    assert_eq!(refreshes(&events, "a.sh"), 1, "events: {events:?}");

    let record = ctx.registry().get("a.sh").unwrap();
    assert_eq!(record.status, ExerciseStatus::Done);
    assert_eq!(record.stdout, "v5\n");

    w.stop().await;
}

#[tokio::test]
async fn touch_without_content_change_is_ignored() {
    init_tracing();
    let ws = two_exercise_workspace();
    let (ctx, mut rx) = context(&ws);
    ctx.select("a.sh").unwrap();

    let mut w = watcher(&ctx);
    let path = ws.exercise_path("00_intro/a.sh");
    w.start(&path).unwrap();
    sleep(Duration::from_millis(100)).await;

    // Rewrite the same bytes in place and bump the mtime.
    let same = ws.read_exercise("00_intro/a.sh");
    let mut file = OpenOptions::new().write(true).open(&path).unwrap();
    file.write_all(same.as_bytes()).unwrap();
    file.set_modified(SystemTime::now()).unwrap();
    drop(file);

    let events = events_within(&mut rx, Duration::from_millis(1000)).await;
    assert!(events.is_empty(), "events: {events:?}");
    assert_eq!(ctx.registry().status("a.sh"), Some(ExerciseStatus::Pending));

    w.stop().await;
}

#[tokio::test]
async fn change_to_sibling_file_is_ignored() {
    init_tracing();
    let ws = two_exercise_workspace();
    let (ctx, mut rx) = context(&ws);
    ctx.select("a.sh").unwrap();

    let mut w = watcher(&ctx);
    w.start(&ws.exercise_path("00_intro/a.sh")).unwrap();
    sleep(Duration::from_millis(100)).await;

    ws.write_exercise("00_intro/b.sh", "echo changed\n");

    let events = events_within(&mut rx, Duration::from_millis(1000)).await;
    assert!(events.is_empty(), "events: {events:?}");

    w.stop().await;
}

#[tokio::test]
async fn stop_cancels_a_pending_rerun() {
    init_tracing();
    let ws = two_exercise_workspace();
    let (ctx, mut rx) = context(&ws);
    ctx.select("a.sh").unwrap();

    let mut w = watcher(&ctx);
    w.start(&ws.exercise_path("00_intro/a.sh")).unwrap();
    sleep(Duration::from_millis(100)).await;

    ws.write_exercise("00_intro/a.sh", "echo fixed\n");
    sleep(Duration::from_millis(50)).await;
    w.stop().await;
    assert_eq!(w.state(), WatchState::Stopped);

    let events = events_within(&mut rx, Duration::from_millis(1000)).await;
    assert!(events.is_empty(), "events: {events:?}");
    assert_eq!(ctx.registry().status("a.sh"), Some(ExerciseStatus::Pending));
}

#[tokio::test]
async fn restart_moves_observation_to_the_new_exercise() {
    init_tracing();
    let ws = WorkspaceBuilder::new()
        .exercise("00_intro/a.sh", "echo a\n")
        .exercise("01_next/b.sh", "exit 1\n")
        .build();
    let (ctx, mut rx) = context(&ws);
    let a = ws.exercise_path("00_intro/a.sh");
    let b = ws.exercise_path("01_next/b.sh");

    ctx.select("a.sh").unwrap();
    let mut w = watcher(&ctx);
    w.start(&a).unwrap();
    assert_eq!(w.state(), WatchState::Watching(a.clone()));
    assert!(w.start(&a).is_err(), "second start without stop must fail");

    ctx.select("b.sh").unwrap();
    w.restart(&b).await.unwrap();
    assert_eq!(w.state(), WatchState::Watching(b.clone()));
    sleep(Duration::from_millis(100)).await;

    ws.write_exercise("00_intro/a.sh", "echo edited\n");
    let events = events_within(&mut rx, Duration::from_millis(1000)).await;
    assert!(events.is_empty(), "old exercise still observed: {events:?}");

    ws.write_exercise("01_next/b.sh", "echo b fixed\n");
    let events = events_within(&mut rx, Duration::from_millis(1500)).await;
    assert_eq!(refreshes(&events, "b.sh"), 1, "events: {events:?}");
    assert_eq!(ctx.registry().status("b.sh"), Some(ExerciseStatus::Done));

    w.stop().await;
}

#[tokio::test]
async fn acknowledged_write_does_not_trigger_a_rerun() {
    init_tracing();
    let ws = two_exercise_workspace();
    let (ctx, mut rx) = context(&ws);
    ctx.select("a.sh").unwrap();

    let mut w = watcher(&ctx);
    let path = ws.exercise_path("00_intro/a.sh");
    w.start(&path).unwrap();
    sleep(Duration::from_millis(100)).await;

    // Acknowledged before the change notification is seen.
    ws.write_exercise("00_intro/a.sh", "echo restored\n");
    w.acknowledge(&path);
    let events = events_within(&mut rx, Duration::from_millis(1000)).await;
    assert!(events.is_empty(), "events: {events:?}");

    // Acknowledged after the change already armed a re-run.
    ws.write_exercise("00_intro/a.sh", "echo restored again\n");
    sleep(Duration::from_millis(100)).await;
    w.acknowledge(&path);
    let events = events_within(&mut rx, Duration::from_millis(1000)).await;
    assert!(events.is_empty(), "events: {events:?}");
    assert_eq!(ctx.registry().status("a.sh"), Some(ExerciseStatus::Pending));

    // Later edits are still picked up.
    ws.write_exercise("00_intro/a.sh", "echo edited\n");
    let events = events_within(&mut rx, Duration::from_millis(1500)).await;
    assert_eq!(refreshes(&events, "a.sh"), 1, "events: {events:?}");

    w.stop().await;
}
