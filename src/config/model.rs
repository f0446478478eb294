// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Raw workspace configuration as read from `.pylings.toml`.
///
/// ```toml
/// [workspace]
/// firsttime = true
/// current_exercise = "00_intro/intro1.py"
///
/// [runner]
/// interpreter = "python"
/// timeout_secs = 10
///
/// [watch]
/// debounce_ms = 300
///
/// [paths]
/// exercises = "exercises"
/// pattern = "**/*.py"
/// ```
///
/// All sections are optional and have reasonable defaults. Use
/// `ConfigFile::try_from` to obtain a validated config.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub workspace: WorkspaceSection,

    #[serde(default)]
    pub runner: RunnerSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub settings: SettingsSection,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>`, so the rest of the
/// crate can rely on e.g. a non-zero timeout.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub workspace: WorkspaceSection,
    pub runner: RunnerSection,
    pub watch: WatchSection,
    pub paths: PathsSection,
    pub settings: SettingsSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            workspace: raw.workspace,
            runner: raw.runner,
            watch: raw.watch,
            paths: raw.paths,
            settings: raw.settings,
        }
    }

    /// Per-run wall clock budget for the Runner.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.runner.timeout_secs)
    }

    /// Quiet period used by the change watcher.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.watch.debounce_ms)
    }

    /// Upper bound on concurrently running exercises during a batch check.
    pub fn max_workers(&self) -> usize {
        if self.runner.max_workers > 0 {
            return self.runner.max_workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }

    /// Resolve a configured directory against the workspace root.
    pub fn resolve(&self, root: &Path, rel: &Path) -> PathBuf {
        if rel.is_absolute() {
            rel.to_path_buf()
        } else {
            root.join(rel)
        }
    }
}

/// `[workspace]` section: per-learner state that the tool rewrites.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkspaceSection {
    #[serde(default)]
    pub version: Option<String>,

    /// Show the welcome message on the next interactive start.
    #[serde(default)]
    pub firsttime: bool,

    /// Last visited exercise, relative to the exercises directory.
    #[serde(default)]
    pub current_exercise: Option<String>,
}

/// `[runner]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunnerSection {
    /// Program used to execute an exercise file.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Extra arguments placed before the exercise path.
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// `0` means "use the available parallelism".
    #[serde(default)]
    pub max_workers: usize,
}

fn default_interpreter() -> String {
    "python".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            args: Vec::new(),
            timeout_secs: default_timeout_secs(),
            max_workers: 0,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchSection {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[paths]` section. Relative paths are resolved against the workspace root.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsSection {
    #[serde(default = "default_exercises_dir")]
    pub exercises: PathBuf,

    #[serde(default = "default_backups_dir")]
    pub backups: PathBuf,

    #[serde(default = "default_solutions_dir")]
    pub solutions: PathBuf,

    #[serde(default = "default_hints_file")]
    pub hints: PathBuf,

    /// Glob, relative to the exercises directory, selecting exercise files.
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

fn default_exercises_dir() -> PathBuf {
    PathBuf::from("exercises")
}

fn default_backups_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_solutions_dir() -> PathBuf {
    PathBuf::from("solutions")
}

fn default_hints_file() -> PathBuf {
    PathBuf::from("hints.toml")
}

fn default_pattern() -> String {
    "**/*.py".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            exercises: default_exercises_dir(),
            backups: default_backups_dir(),
            solutions: default_solutions_dir(),
            hints: default_hints_file(),
            pattern: default_pattern(),
        }
    }
}

/// `[settings]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SettingsSection {
    #[serde(default)]
    pub welcome_message: Option<String>,
}
