// src/engine/session.rs

//! Foreground actions on the current exercise.
//!
//! Every action here runs on the foreground loop, one at a time. The
//! watcher is restarted whenever the selection moves to another file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::{PylingsError, Result};
use crate::exercise::{ExerciseRecord, Transition, exercise_id};
use crate::watch::{ExerciseWatcher, path_utils};
use crate::workspace::{BackupStore, RestoreOutcome, SelectionStore};

use super::batch::{BatchEvaluator, BatchProgress};
use super::context::ExerciseContext;

/// Result of a foreground action, for the view to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Moved on to this exercise (already re-evaluated).
    Advanced(ExerciseRecord),
    /// The current exercise is still pending; selection unchanged.
    NotDone(String),
    /// The current exercise is the last one.
    LastExercise,
    /// Restored from backup and re-evaluated. `None` if a newer run won.
    Reset(Option<Transition>),
    /// No backup exists; nothing changed.
    MissingBackup(PathBuf),
    Selected(ExerciseRecord),
    Rerun(Option<Transition>),
    /// Nothing is selected (empty workspace).
    NoSelection,
}

pub struct Session {
    ctx: ExerciseContext,
    batch: BatchEvaluator,
    watcher: Box<dyn ExerciseWatcher>,
    backups: Arc<dyn BackupStore>,
    selection_store: Arc<dyn SelectionStore>,
    exercises_dir: PathBuf,
    show_hint: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("ctx", &self.ctx)
            .field("batch", &self.batch)
            .field("exercises_dir", &self.exercises_dir)
            .field("show_hint", &self.show_hint)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        ctx: ExerciseContext,
        batch: BatchEvaluator,
        watcher: Box<dyn ExerciseWatcher>,
        backups: Arc<dyn BackupStore>,
        selection_store: Arc<dyn SelectionStore>,
        exercises_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ctx,
            batch,
            watcher,
            backups,
            selection_store,
            exercises_dir: exercises_dir.into(),
            show_hint: false,
        }
    }

    pub fn context(&self) -> &ExerciseContext {
        &self.ctx
    }

    pub fn hint_visible(&self) -> bool {
        self.show_hint
    }

    /// Pick the starting exercise and begin watching it.
    ///
    /// Preference order: `explicit` (re-evaluated immediately), the persisted
    /// selection, the first pending exercise, the first exercise.
    pub async fn start(&mut self, explicit: Option<&Path>) -> Result<ExerciseRecord> {
        let record = match explicit {
            Some(path) => {
                let record = self.find_path(path).ok_or_else(|| {
                    PylingsError::ExerciseNotFound(path.display().to_string())
                })?;
                self.ctx.select(&record.name)?;
                self.ctx.rerun(&record.name).await?;
                record
            }
            None => {
                let record = self
                    .persisted()
                    .or_else(|| self.ctx.registry().first_pending())
                    .or_else(|| self.ctx.registry().get_index(0))
                    .ok_or_else(|| {
                        PylingsError::ConfigError(format!(
                            "no exercises found under {:?}",
                            self.exercises_dir
                        ))
                    })?;
                self.ctx.select(&record.name)?;
                record
            }
        };

        self.watcher.start(&record.path)?;
        info!(exercise = %record.name, "session started");
        Ok(self.ctx.current().unwrap_or(record))
    }

    /// Move to the next exercise if the current one is done.
    pub async fn advance(&mut self) -> Result<ActionOutcome> {
        let Some(current) = self.ctx.current() else {
            return Ok(ActionOutcome::NoSelection);
        };
        if !current.status.is_done() {
            debug!(exercise = %current.name, "advance refused; exercise still pending");
            return Ok(ActionOutcome::NotDone(current.name));
        }
        let Some(next) = self.ctx.registry().next_after(&current.name) else {
            return Ok(ActionOutcome::LastExercise);
        };

        self.ctx.select(&next.name)?;
        self.show_hint = false;
        self.ctx.rerun(&next.name).await?;
        self.persist(&next);
        self.watcher.restart(&next.path).await?;

        info!(from = %current.name, to = %next.name, "advanced to next exercise");
        Ok(ActionOutcome::Advanced(self.ctx.current().unwrap_or(next)))
    }

    /// Restore the current exercise from its backup and re-evaluate it.
    pub async fn reset_current(&mut self) -> Result<ActionOutcome> {
        let Some(current) = self.ctx.current() else {
            return Ok(ActionOutcome::NoSelection);
        };

        match self.backups.restore(&current.path)? {
            RestoreOutcome::MissingBackup(backup) => {
                warn!(exercise = %current.name, ?backup, "no backup to restore from");
                Ok(ActionOutcome::MissingBackup(backup))
            }
            RestoreOutcome::Restored => {
                self.watcher.acknowledge(&current.path);
                let transition = self.ctx.rerun(&current.name).await?;
                Ok(ActionOutcome::Reset(transition))
            }
        }
    }

    /// Re-evaluate the current exercise on demand.
    pub async fn rerun_current(&mut self) -> Result<ActionOutcome> {
        let Some(name) = self.ctx.current_name() else {
            return Ok(ActionOutcome::NoSelection);
        };
        Ok(ActionOutcome::Rerun(self.ctx.rerun(&name).await?))
    }

    /// Select an exercise by file name, id (file name without extension) or
    /// 1-based position.
    pub async fn jump_to(&mut self, target: &str) -> Result<ActionOutcome> {
        let record = self
            .resolve(target)
            .ok_or_else(|| PylingsError::ExerciseNotFound(target.to_string()))?;

        if self.ctx.current_name().as_deref() == Some(record.name.as_str()) {
            return Ok(ActionOutcome::Selected(record));
        }

        self.ctx.select(&record.name)?;
        self.show_hint = false;
        self.persist(&record);
        self.watcher.restart(&record.path).await?;
        Ok(ActionOutcome::Selected(record))
    }

    /// Re-evaluate every exercise. The selection is unchanged.
    pub async fn check_all(&self, progress: Option<BatchProgress<'_>>) -> Result<Vec<Transition>> {
        self.batch.evaluate_all(&self.ctx, progress).await
    }

    pub fn toggle_hint(&mut self) -> bool {
        self.show_hint = !self.show_hint;
        self.show_hint
    }

    /// Stop watching. The session is unusable for file changes afterwards.
    pub async fn shutdown(&mut self) {
        self.watcher.stop().await;
        debug!("session shut down");
    }

    fn resolve(&self, target: &str) -> Option<ExerciseRecord> {
        let registry = self.ctx.registry();
        if let Ok(position) = target.parse::<usize>() {
            return position.checked_sub(1).and_then(|i| registry.get_index(i));
        }
        registry.get(target).or_else(|| {
            registry
                .names()
                .into_iter()
                .find(|n| exercise_id(n) == target)
                .and_then(|n| registry.get(&n))
        })
    }

    fn find_path(&self, path: &Path) -> Option<ExerciseRecord> {
        let absolute = path_utils::absolute(path);
        let absolute = absolute.canonicalize().unwrap_or(absolute);
        self.ctx
            .registry()
            .find_by_path(&absolute)
            .or_else(|| self.ctx.registry().find_by_path(path))
    }

    fn persisted(&self) -> Option<ExerciseRecord> {
        let stored = match self.selection_store.load() {
            Ok(stored) => stored?,
            Err(err) => {
                warn!(error = %err, "could not read persisted selection");
                return None;
            }
        };
        let record = self
            .ctx
            .registry()
            .find_by_path(&self.exercises_dir.join(&stored));
        if record.is_none() {
            warn!(exercise = %stored, "persisted selection no longer exists");
        }
        record
    }

    fn persist(&self, record: &ExerciseRecord) {
        let rel = record
            .path
            .strip_prefix(&self.exercises_dir)
            .unwrap_or(&record.path);
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if let Err(err) = self.selection_store.save(&rel) {
            warn!(exercise = %record.name, error = %err, "could not persist selection");
        }
    }
}
