// src/workspace/mod.rs

//! The learner's workspace and the collaborators the engine relies on:
//! hints, the persisted selection, backups and solutions.

pub mod backup;
pub mod hints;
pub mod selection;
pub mod solution;

use std::path::{Path, PathBuf};

use crate::config::{ConfigFile, find_config, load_and_validate, workspace_root};
use crate::errors::Result;

pub use backup::{BackupStore, DirBackupStore, RestoreOutcome};
pub use hints::{HintStore, NoHints, TomlHintStore};
pub use selection::{MemorySelectionStore, SelectionStore, TomlSelectionStore};
pub use solution::SolutionStore;

/// A located and validated workspace.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub config: ConfigFile,
}

impl Workspace {
    /// Open the workspace whose config lives at `config_path`.
    pub fn open(config_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();
        let config = load_and_validate(&config_path)?;
        let root = workspace_root(&config_path);
        let root = root.canonicalize().unwrap_or(root);
        Ok(Self {
            root,
            config_path,
            config,
        })
    }

    /// Open `explicit` if given, otherwise search upward from `cwd`.
    pub fn locate(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::open(path),
            None => Self::open(find_config(cwd)?),
        }
    }

    pub fn exercises_dir(&self) -> PathBuf {
        self.config.resolve(&self.root, &self.config.paths.exercises)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.config.resolve(&self.root, &self.config.paths.backups)
    }

    pub fn solutions_dir(&self) -> PathBuf {
        self.config.resolve(&self.root, &self.config.paths.solutions)
    }

    pub fn hints_file(&self) -> PathBuf {
        self.config.resolve(&self.root, &self.config.paths.hints)
    }
}
