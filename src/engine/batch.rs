// src/engine/batch.rs

//! Concurrent evaluation of many exercises.
//!
//! Runs are spread over a bounded worker pool and finish in any order, but
//! results are applied to the registry in discovery order once every run
//! is back. A run that panics counts as a failure of that exercise only.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::errors::{PylingsError, Result};
use crate::exec::{ExerciseRunner, RunResult};
use crate::exercise::{RunTicket, Transition};

use super::context::ExerciseContext;

/// Progress observer: `(finished exercise, completed runs, total runs)`.
///
/// Called once per finished run, in completion order, and a final time
/// with `None` once results have been applied.
pub type BatchProgress<'a> = &'a (dyn Fn(Option<&str>, usize, usize) + Send + Sync);

#[derive(Debug, Clone)]
pub struct BatchEvaluator {
    max_workers: usize,
}

impl BatchEvaluator {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Startup evaluation of every exercise.
    ///
    /// Same as [`evaluate_all`](Self::evaluate_all) except that reaching
    /// "all done" here is the starting state, not an achievement, so no
    /// `Finished` event is sent.
    pub async fn initialize(
        &self,
        ctx: &ExerciseContext,
        progress: Option<BatchProgress<'_>>,
    ) -> Result<Vec<Transition>> {
        let names = ctx.registry().names();
        self.run_batch(ctx, &names, progress, false).await
    }

    /// Evaluate every exercise in the registry.
    pub async fn evaluate_all(
        &self,
        ctx: &ExerciseContext,
        progress: Option<BatchProgress<'_>>,
    ) -> Result<Vec<Transition>> {
        let names = ctx.registry().names();
        self.evaluate(ctx, &names, progress).await
    }

    /// Evaluate `names` and apply the results in the given order.
    ///
    /// The current selection is left alone. Returns the applied transitions;
    /// results superseded by a newer run of the same exercise are skipped.
    pub async fn evaluate(
        &self,
        ctx: &ExerciseContext,
        names: &[String],
        progress: Option<BatchProgress<'_>>,
    ) -> Result<Vec<Transition>> {
        self.run_batch(ctx, names, progress, true).await
    }

    async fn run_batch(
        &self,
        ctx: &ExerciseContext,
        names: &[String],
        progress: Option<BatchProgress<'_>>,
        announce: bool,
    ) -> Result<Vec<Transition>> {
        let registry = ctx.registry();

        let mut jobs: Vec<(RunTicket, PathBuf)> = Vec::with_capacity(names.len());
        for name in names {
            let ticket = registry.begin_run(name)?;
            let path = registry
                .get(name)
                .map(|r| r.path)
                .ok_or_else(|| PylingsError::ExerciseNotFound(name.clone()))?;
            jobs.push((ticket, path));
        }

        let total = jobs.len();
        info!(total, workers = self.max_workers, "batch evaluation started");

        let runner = ctx.runner();
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut set = JoinSet::new();

        for (index, (_, path)) in jobs.iter().enumerate() {
            let runner = Arc::clone(&runner);
            let semaphore = Arc::clone(&semaphore);
            let path = path.clone();
            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                (index, run_isolated(runner, path).await)
            });
        }

        let mut results: Vec<Option<RunResult>> = vec![None; total];
        let mut completed = 0usize;

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => {
                    completed += 1;
                    let name = jobs[index].0.name();
                    debug!(exercise = name, completed, total, "batch run finished");
                    if let Some(report) = progress {
                        report(Some(name), completed, total);
                    }
                    results[index] = Some(result);
                }
                Err(err) => {
                    warn!(error = %err, "batch worker ended without a result");
                }
            }
        }

        let mut transitions = Vec::with_capacity(total);
        for ((ticket, _), result) in jobs.iter().zip(results) {
            let result = result
                .unwrap_or_else(|| RunResult::launch_failed("exercise run was cancelled"));
            let applied = if announce {
                ctx.apply(ticket, &result)?
            } else {
                registry.apply(ticket, &result)?
            };
            if let Some(t) = applied {
                transitions.push(t);
            }
        }

        if let Some(report) = progress {
            report(None, total, total);
        }

        let snapshot = registry.progress();
        info!(
            completed = snapshot.completed,
            total = snapshot.total,
            "batch evaluation finished"
        );

        Ok(transitions)
    }
}

/// Run one exercise on its own task so a panicking runner only fails that
/// exercise.
async fn run_isolated(runner: Arc<dyn ExerciseRunner>, path: PathBuf) -> RunResult {
    let handle = tokio::spawn(async move { runner.run(&path).await });
    match handle.await {
        Ok(result) => result,
        Err(err) => {
            warn!(error = %err, "exercise run panicked");
            RunResult::launch_failed(format!("exercise run failed: {err}"))
        }
    }
}
