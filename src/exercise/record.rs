// src/exercise/record.rs

use std::path::{Path, PathBuf};

use crate::errors::{PylingsError, Result};
use crate::exec::{RunResult, status_for};
use crate::types::ExerciseStatus;

/// One discovered exercise and the outcome of its latest applied run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseRecord {
    /// File name; the registry key.
    pub name: String,
    /// Absolute location on disk.
    pub path: PathBuf,
    pub status: ExerciseStatus,
    /// Output of a successful run (empty otherwise).
    pub stdout: String,
    /// Diagnostic of a failing run (`None` on success).
    pub stderr: Option<String>,
    /// Resolved once at discovery time.
    pub hint: Option<String>,
}

impl ExerciseRecord {
    pub fn new(path: impl Into<PathBuf>, hint: Option<String>) -> Result<Self> {
        let path = path.into();
        let name = file_name(&path)?;
        Ok(Self {
            name,
            path,
            status: ExerciseStatus::Pending,
            stdout: String::new(),
            stderr: None,
            hint,
        })
    }

    /// Identifier used to look up hints: the file name without extension.
    pub fn id(&self) -> &str {
        exercise_id(&self.name)
    }

    /// Overwrite status and captures from `result`; returns the previous status.
    pub(crate) fn apply(&mut self, result: &RunResult) -> ExerciseStatus {
        let previous = self.status;
        self.status = status_for(result);
        match self.status {
            ExerciseStatus::Done => {
                self.stdout = result.stdout.clone();
                self.stderr = None;
            }
            ExerciseStatus::Pending => {
                self.stdout.clear();
                self.stderr = Some(result.stderr.clone());
            }
        }
        previous
    }
}

/// Strip the extension from an exercise file name.
pub fn exercise_id(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem.trim(),
        _ => file_name.trim(),
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            PylingsError::ConfigError(format!("exercise path has no UTF-8 file name: {:?}", path))
        })
}
