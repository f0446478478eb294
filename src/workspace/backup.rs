// src/workspace/backup.rs

//! Pristine copies of the exercises, used by "reset".

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::errors::{PylingsError, Result};
use crate::fs::FileSystem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    /// No backup exists for the exercise; nothing was touched.
    MissingBackup(PathBuf),
}

/// Restores the original contents of an exercise file.
pub trait BackupStore: Send + Sync {
    fn restore(&self, exercise: &Path) -> Result<RestoreOutcome>;
}

/// Backups mirrored under a directory: `<backups>/<path relative to exercises>`.
#[derive(Debug, Clone)]
pub struct DirBackupStore {
    exercises_dir: PathBuf,
    backups_dir: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl DirBackupStore {
    pub fn new(
        exercises_dir: impl Into<PathBuf>,
        backups_dir: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            exercises_dir: exercises_dir.into(),
            backups_dir: backups_dir.into(),
            fs,
        }
    }

    pub fn backup_path(&self, exercise: &Path) -> Result<PathBuf> {
        let rel = exercise.strip_prefix(&self.exercises_dir).map_err(|_| {
            PylingsError::ConfigError(format!(
                "exercise {:?} is not inside {:?}",
                exercise, self.exercises_dir
            ))
        })?;
        Ok(self.backups_dir.join(rel))
    }
}

impl BackupStore for DirBackupStore {
    fn restore(&self, exercise: &Path) -> Result<RestoreOutcome> {
        let backup = self.backup_path(exercise)?;
        if !self.fs.is_file(&backup) {
            return Ok(RestoreOutcome::MissingBackup(backup));
        }

        self.fs.copy(&backup, exercise)?;
        info!(?exercise, ?backup, "exercise restored from backup");
        Ok(RestoreOutcome::Restored)
    }
}
