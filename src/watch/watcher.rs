// src/watch/watcher.rs

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::engine::{EngineEvent, ExerciseContext};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::watch::debounce::Debounce;
use crate::watch::event_handler::{ChangeDecision, classify_change, is_relevant_kind};
use crate::watch::hash::DigestCache;
use crate::watch::path_utils::{absolute, watch_dir};
use crate::watch::{ExerciseWatcher, WatchState};

/// A running observation: the `notify` handle plus the async loop that
/// consumes its events.
struct ActiveWatch {
    exercise: PathBuf,
    _inner: RecommendedWatcher,
    acks: mpsc::UnboundedSender<PathBuf>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Watches the directory of the selected exercise and re-evaluates it after
/// a quiet period following a genuine content change.
///
/// Only `Create`/`Modify` events naming the selected file are considered.
/// Whatever is selected in the shared context when the event arrives is
/// the target, so the watcher never re-runs a file the learner has left.
pub struct ChangeWatcher {
    ctx: ExerciseContext,
    fs: Arc<dyn FileSystem>,
    window: Duration,
    digests: Arc<Mutex<DigestCache>>,
    active: Option<ActiveWatch>,
}

impl fmt::Debug for ChangeWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeWatcher")
            .field("window", &self.window)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ChangeWatcher {
    pub fn new(ctx: ExerciseContext, fs: Arc<dyn FileSystem>, window: Duration) -> Self {
        Self {
            ctx,
            fs,
            window,
            digests: Arc::new(Mutex::new(DigestCache::new())),
            active: None,
        }
    }

    fn start_watch(&mut self, exercise: &Path) -> Result<()> {
        if let Some(active) = &self.active {
            return Err(anyhow!(
                "watcher already observing {:?}; stop it before starting again",
                active.exercise
            )
            .into());
        }

        let exercise = absolute(exercise);
        let dir = watch_dir(&exercise);

        // Seed with the current contents so a touch right after starting is
        // not mistaken for an edit.
        {
            let mut digests = self.digests.lock().unwrap_or_else(|e| e.into_inner());
            if let Err(err) = digests.seed(self.fs.as_ref(), &exercise) {
                debug!(?exercise, error = %err, "could not seed digest");
                digests.forget(&exercise);
            }
        }

        // Channel from the blocking notify callback into the async world.
        let (event_tx, event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

        let mut inner = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                // The receiver is gone once the watch loop has stopped.
                let _ = event_tx.send(res);
            },
            Config::default(),
        )?;
        inner.watch(&dir, RecursiveMode::NonRecursive)?;

        let (ack_tx, ack_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(watch_loop(
            event_rx,
            ack_rx,
            shutdown_rx,
            self.ctx.clone(),
            Arc::clone(&self.fs),
            Arc::clone(&self.digests),
            exercise.clone(),
            self.window,
        ));

        info!(?exercise, ?dir, "file watcher started");
        self.active = Some(ActiveWatch {
            exercise,
            _inner: inner,
            acks: ack_tx,
            shutdown: shutdown_tx,
            task,
        });
        Ok(())
    }

    fn acknowledge_write(&mut self, exercise: &Path) {
        let exercise = absolute(exercise);
        {
            let mut digests = self.digests.lock().unwrap_or_else(|e| e.into_inner());
            if let Err(err) = digests.seed(self.fs.as_ref(), &exercise) {
                debug!(?exercise, error = %err, "could not seed digest");
                digests.forget(&exercise);
            }
        }
        if let Some(active) = &self.active {
            // A change seen before the seed may already be pending.
            let _ = active.acks.send(exercise);
        }
    }

    async fn stop_watch(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        let ActiveWatch {
            exercise,
            _inner: inner,
            shutdown,
            task,
            ..
        } = active;

        // Stop producing events first, then end the loop and wait for it.
        drop(inner);
        let _ = shutdown.send(());
        if let Err(err) = task.await {
            warn!(error = %err, "watch loop ended abnormally");
        }
        info!(?exercise, "file watcher stopped");
    }
}

impl ExerciseWatcher for ChangeWatcher {
    fn start(&mut self, exercise: &Path) -> Result<()> {
        self.start_watch(exercise)
    }

    fn stop(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(self.stop_watch())
    }

    fn acknowledge(&mut self, exercise: &Path) {
        self.acknowledge_write(exercise);
    }

    fn state(&self) -> WatchState {
        match &self.active {
            Some(active) => WatchState::Watching(active.exercise.clone()),
            None => WatchState::Stopped,
        }
    }
}

async fn watch_loop(
    mut event_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    mut ack_rx: mpsc::UnboundedReceiver<PathBuf>,
    mut shutdown_rx: oneshot::Receiver<()>,
    ctx: ExerciseContext,
    fs: Arc<dyn FileSystem>,
    digests: Arc<Mutex<DigestCache>>,
    watched: PathBuf,
    window: Duration,
) {
    let mut debounce = Debounce::new(window);

    loop {
        let deadline = debounce.deadline();

        tokio::select! {
            _ = &mut shutdown_rx => {
                if debounce.cancel() {
                    debug!(exercise = ?watched, "pending re-run cancelled by stop");
                }
                break;
            }
            Some(acked) = ack_rx.recv() => {
                if acked == watched && debounce.cancel() {
                    debug!(exercise = ?watched, "pending re-run dropped for acknowledged write");
                }
            }
            maybe = event_rx.recv() => {
                let Some(res) = maybe else { break };
                let event = match res {
                    Ok(event) => event,
                    Err(err) => {
                        warn!(error = %err, "file watch error");
                        continue;
                    }
                };
                if !is_relevant_kind(&event.kind) {
                    continue;
                }

                let target = ctx.current().map(|r| r.path).unwrap_or_else(|| watched.clone());
                let mut changed = false;
                {
                    let mut digests = digests.lock().unwrap_or_else(|e| e.into_inner());
                    for path in &event.paths {
                        if classify_change(fs.as_ref(), &mut digests, path, &target)
                            == ChangeDecision::Changed
                        {
                            changed = true;
                        }
                    }
                }

                if changed && debounce.arm(Instant::now()) {
                    debug!(exercise = ?target, "change superseded pending re-run");
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if debounce.take_due(Instant::now()) {
                    launch_rerun(&ctx);
                }
            }
        }
    }

    debug!(exercise = ?watched, "watch loop finished");
}

/// Re-evaluate the selected exercise on a detached task.
///
/// Stopping the watcher does not cancel a run that was already launched;
/// its result is applied through the ticket check like any other.
fn launch_rerun(ctx: &ExerciseContext) {
    let Some(name) = ctx.current_name() else {
        return;
    };
    let ctx = ctx.clone();
    tokio::spawn(async move {
        debug!(exercise = %name, "re-evaluating after change");
        match ctx.rerun(&name).await {
            Ok(_) => ctx.notify(EngineEvent::RefreshRequested { name }),
            Err(err) => warn!(exercise = %name, error = %err, "re-evaluation failed"),
        }
    });
}
