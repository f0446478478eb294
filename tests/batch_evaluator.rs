use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use pylings::engine::{BatchEvaluator, EngineEvent, ExerciseContext};
use pylings::exercise::{ExerciseRecord, Registry};
use pylings::types::ExerciseStatus;
use pylings_test_utils::fake_runner::{Script, ScriptedRunner};
use pylings_test_utils::{init_tracing, with_timeout};

fn context(
    names: &[&str],
    runner: ScriptedRunner,
) -> (ExerciseContext, mpsc::UnboundedReceiver<EngineEvent>) {
    let records = names
        .iter()
        .map(|n| ExerciseRecord::new(PathBuf::from("/ws/exercises").join(n), None).unwrap())
        .collect();
    let registry = Registry::new(records).unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    (ExerciseContext::new(registry, Arc::new(runner), tx), rx)
}

#[tokio::test]
async fn results_do_not_depend_on_completion_order() {
    init_tracing();
    let names = ["a.py", "b.py", "c.py", "d.py", "e.py"];

    // Earlier exercises finish later, so completion order is reversed.
    let mut statuses = Vec::new();
    for workers in [1, 2, 5] {
        let mut runner = ScriptedRunner::new();
        for (i, name) in names.iter().enumerate() {
            let delay = Duration::from_millis(10 * (names.len() - i) as u64);
            let script = if i % 2 == 0 {
                Script::pass(name)
            } else {
                Script::fail(name)
            };
            runner = runner.with(name, script.after(delay));
        }

        let (ctx, _rx) = context(&names, runner);
        let transitions = with_timeout(BatchEvaluator::new(workers).evaluate_all(&ctx, None))
            .await
            .unwrap();

        // Applied in discovery order regardless of completion order.
        let applied: Vec<_> = transitions.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(applied, names);

        let snapshot = ctx.snapshot();
        statuses.push(
            snapshot
                .exercises
                .iter()
                .map(|r| (r.name.clone(), r.status))
                .collect::<Vec<_>>(),
        );
        assert_eq!(snapshot.progress.completed, 3);
    }

    assert!(statuses.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn progress_callback_reports_each_run_and_a_final_call() {
    init_tracing();
    let names = ["a.py", "b.py", "c.py"];
    let runner = ScriptedRunner::new()
        .with("a.py", Script::pass("a"))
        .with("b.py", Script::pass("b"))
        .with("c.py", Script::fail("c"));
    let (ctx, _rx) = context(&names, runner);

    let calls: Arc<Mutex<Vec<(Option<String>, usize, usize)>>> = Arc::default();
    let sink = Arc::clone(&calls);
    let report = move |name: Option<&str>, completed: usize, total: usize| {
        sink.lock()
            .unwrap()
            .push((name.map(str::to_string), completed, total));
    };

    with_timeout(BatchEvaluator::new(2).evaluate_all(&ctx, Some(&report)))
        .await
        .unwrap();

    let calls = calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 4);
    for (i, (name, completed, total)) in calls[..3].iter().enumerate() {
        assert!(name.is_some());
        assert_eq!(*completed, i + 1);
        assert_eq!(*total, 3);
    }
    assert_eq!(calls[3], (None, 3, 3));
}

#[tokio::test]
async fn panicking_run_fails_only_that_exercise() {
    init_tracing();
    let names = ["a.py", "b.py", "c.py"];
    let runner = ScriptedRunner::new()
        .with("a.py", Script::pass("a"))
        .with("b.py", Script::panicking())
        .with("c.py", Script::pass("c"));
    let (ctx, _rx) = context(&names, runner);

    with_timeout(BatchEvaluator::new(3).evaluate_all(&ctx, None))
        .await
        .unwrap();

    let reg = ctx.registry();
    assert_eq!(reg.status("a.py"), Some(ExerciseStatus::Done));
    assert_eq!(reg.status("b.py"), Some(ExerciseStatus::Pending));
    assert!(reg.get("b.py").unwrap().stderr.is_some());
    assert_eq!(reg.status("c.py"), Some(ExerciseStatus::Done));
    assert_eq!(reg.progress().completed, 2);
}

#[tokio::test]
async fn batch_leaves_selection_alone_and_announces_completion() {
    init_tracing();
    let names = ["a.py", "b.py"];
    let runner = ScriptedRunner::new()
        .with("a.py", Script::pass("a"))
        .with("b.py", Script::pass("b"));
    let (ctx, mut rx) = context(&names, runner);
    ctx.select("b.py").unwrap();

    with_timeout(BatchEvaluator::new(2).evaluate_all(&ctx, None))
        .await
        .unwrap();

    assert_eq!(ctx.current_name().as_deref(), Some("b.py"));
    assert_eq!(rx.try_recv().unwrap(), EngineEvent::Finished);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn worker_bound_limits_concurrency() {
    init_tracing();
    let names = ["a.py", "b.py", "c.py", "d.py"];
    let mut runner = ScriptedRunner::new();
    for name in names {
        runner = runner.with(name, Script::pass(name).after(Duration::from_millis(200)));
    }
    let (ctx, _rx) = context(&names, runner);

    let started = std::time::Instant::now();
    with_timeout(BatchEvaluator::new(2).evaluate_all(&ctx, None))
        .await
        .unwrap();

    // Four 200ms runs on two workers need at least two rounds.
    assert!(started.elapsed() >= Duration::from_millis(400));
}

#[tokio::test]
async fn startup_evaluation_does_not_announce_completion() {
    init_tracing();
    let names = ["a.py", "b.py"];
    let runner = ScriptedRunner::new()
        .with("a.py", Script::pass("a"))
        .with("b.py", Script::pass("b"));
    let (ctx, mut rx) = context(&names, runner.clone());

    with_timeout(BatchEvaluator::new(2).initialize(&ctx, None))
        .await
        .unwrap();

    assert_eq!(ctx.registry().progress().completed, 2);
    assert!(rx.try_recv().is_err());

    // Passing again while already complete is not a new completion.
    with_timeout(ctx.rerun("a.py")).await.unwrap();
    assert!(rx.try_recv().is_err());

    // Falling back and recovering is.
    runner.set("a.py", Script::fail("broken"));
    with_timeout(ctx.rerun("a.py")).await.unwrap();
    assert!(rx.try_recv().is_err());
    runner.set("a.py", Script::pass("fixed"));
    with_timeout(ctx.rerun("a.py")).await.unwrap();
    assert_eq!(rx.try_recv().unwrap(), EngineEvent::Finished);
}
