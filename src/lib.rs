// src/lib.rs

pub mod app;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod exercise;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;
pub mod workspace;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::app::Console;
use crate::cli::{CliArgs, Command};
use crate::engine::{BatchEvaluator, ExerciseContext, Session};
use crate::exec::{ExerciseRunner, ProcessRunner};
use crate::exercise::Registry;
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::ChangeWatcher;
use crate::watch::path_utils::absolute;
use crate::workspace::{
    DirBackupStore, SolutionStore, TomlHintStore, TomlSelectionStore, Workspace,
};

/// Shown on the first interactive start when the config has no message.
const DEFAULT_WELCOME: &str = "Welcome to pylings! Edit the exercise below until it runs \
cleanly; it is re-checked every time you save.";

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - workspace discovery and config loading
/// - exercise discovery, hints and the initial batch evaluation
/// - the change watcher and the console session
///
/// Returns the process exit code.
pub async fn run(args: CliArgs) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("resolving current directory")?;
    let workspace = Workspace::locate(args.config.as_deref(), &cwd)?;
    let cfg = &workspace.config;
    debug!(root = ?workspace.root, config = ?workspace.config_path, "workspace located");

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let runner = Arc::new(ProcessRunner::from_config(cfg));
    let exercises_dir = workspace.exercises_dir();
    let solutions = SolutionStore::new(
        &exercises_dir,
        workspace.solutions_dir(),
        Arc::clone(&fs),
    );

    match &args.command {
        Some(Command::DryRun { file }) => return Ok(run_once(runner.as_ref(), file).await),
        Some(Command::Solution { file }) => {
            let file = absolute(file);
            let file = file.canonicalize().unwrap_or(file);
            let target = solutions.solution_for(&file).unwrap_or(file);
            return Ok(run_once(runner.as_ref(), &target).await);
        }
        _ => {}
    }

    let hints = TomlHintStore::load(&workspace.hints_file())?;
    let registry = Registry::discover(fs.as_ref(), &exercises_dir, &cfg.paths.pattern, &hints)?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let ctx = ExerciseContext::new(registry, runner, events_tx);
    let batch = BatchEvaluator::new(cfg.max_workers());

    batch.initialize(&ctx, None).await?;
    let progress = ctx.registry().progress();
    info!(
        completed = progress.completed,
        total = progress.total,
        "initial evaluation complete"
    );

    if let Some(Command::Check) = &args.command {
        let snapshot = ctx.snapshot();
        println!("{}", app::view::render_list(&snapshot, None));
        return Ok(if snapshot.progress.all_done() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let selection = Arc::new(TomlSelectionStore::new(&workspace.config_path));
    let first_time = selection.take_first_time()?;

    let mut explicit = match &args.command {
        Some(Command::Run { file }) => Some(file.clone()),
        _ => None,
    };
    if first_time && explicit.is_none() {
        explicit = ctx.registry().get_index(0).map(|r| r.path);
    }
    let welcome = first_time.then(|| {
        cfg.settings
            .welcome_message
            .clone()
            .unwrap_or_else(|| DEFAULT_WELCOME.to_string())
    });

    let watcher = ChangeWatcher::new(ctx.clone(), Arc::clone(&fs), cfg.debounce());
    let backups = DirBackupStore::new(&exercises_dir, workspace.backups_dir(), Arc::clone(&fs));

    let mut session = Session::new(
        ctx,
        batch,
        Box::new(watcher),
        Arc::new(backups),
        selection,
        &exercises_dir,
    );
    session.start(explicit.as_deref()).await?;

    Console::new(session, events_rx, solutions)
        .run(welcome)
        .await?;
    Ok(ExitCode::SUCCESS)
}

/// Run one file outside the session and print its output.
async fn run_once(runner: &dyn ExerciseRunner, file: &Path) -> ExitCode {
    let file = absolute(file);
    let result = runner.run(&file).await;
    let text = app::view::render_run(&result);
    if result.status().is_done() {
        println!("{text}");
        ExitCode::SUCCESS
    } else {
        eprintln!("{text}");
        ExitCode::FAILURE
    }
}
