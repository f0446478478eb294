// src/workspace/solution.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::fs::FileSystem;

/// Locates reference solutions: `<solutions>/<path relative to exercises>`.
#[derive(Debug, Clone)]
pub struct SolutionStore {
    exercises_dir: PathBuf,
    solutions_dir: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl SolutionStore {
    pub fn new(
        exercises_dir: impl Into<PathBuf>,
        solutions_dir: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            exercises_dir: exercises_dir.into(),
            solutions_dir: solutions_dir.into(),
            fs,
        }
    }

    pub fn solution_for(&self, exercise: &Path) -> Option<PathBuf> {
        let rel = exercise.strip_prefix(&self.exercises_dir).ok()?;
        let candidate = self.solutions_dir.join(rel);
        self.fs.is_file(&candidate).then_some(candidate)
    }
}
