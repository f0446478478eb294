#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Builder for an on-disk workspace in a temp directory.
///
/// Layout:
/// - `.pylings.toml`  (interpreter `sh`, pattern `**/*.sh`)
/// - `exercises/<rel>`
/// - `backups/<rel>`
/// - `solutions/<rel>`
/// - `hints.toml`
pub struct WorkspaceBuilder {
    dir: TempDir,
    timeout_secs: u64,
    debounce_ms: u64,
    max_workers: usize,
    current: Option<String>,
    firsttime: bool,
}

impl WorkspaceBuilder {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp workspace"),
            timeout_secs: 5,
            debounce_ms: 300,
            max_workers: 4,
            current: None,
            firsttime: false,
        }
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.max_workers = n;
        self
    }

    pub fn current_exercise(mut self, rel: &str) -> Self {
        self.current = Some(rel.to_string());
        self
    }

    pub fn first_time(mut self) -> Self {
        self.firsttime = true;
        self
    }

    /// Add `exercises/<rel>` with the given shell script body.
    pub fn exercise(self, rel: &str, body: &str) -> Self {
        write(&self.dir.path().join("exercises").join(rel), body);
        self
    }

    pub fn backup(self, rel: &str, body: &str) -> Self {
        write(&self.dir.path().join("backups").join(rel), body);
        self
    }

    pub fn solution(self, rel: &str, body: &str) -> Self {
        write(&self.dir.path().join("solutions").join(rel), body);
        self
    }

    pub fn hints(self, toml: &str) -> Self {
        write(&self.dir.path().join("hints.toml"), toml);
        self
    }

    pub fn build(self) -> TestWorkspace {
        let mut config = format!(
            "[workspace]\nfirsttime = {}\n",
            self.firsttime
        );
        if let Some(current) = &self.current {
            config.push_str(&format!("current_exercise = \"{current}\"\n"));
        }
        config.push_str(&format!(
            "\n[runner]\ninterpreter = \"sh\"\ntimeout_secs = {}\nmax_workers = {}\n\
             \n[watch]\ndebounce_ms = {}\n\
             \n[paths]\npattern = \"**/*.sh\"\n",
            self.timeout_secs, self.max_workers, self.debounce_ms
        ));
        write(&self.dir.path().join(".pylings.toml"), &config);
        TestWorkspace { dir: self.dir }
    }
}

impl Default for WorkspaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A built workspace; the directory is removed on drop.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    /// Canonical root, matching the paths the registry discovers.
    pub fn root(&self) -> PathBuf {
        self.dir.path().canonicalize().expect("canonical workspace root")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join(".pylings.toml")
    }

    pub fn exercises_dir(&self) -> PathBuf {
        self.root().join("exercises")
    }

    pub fn exercise_path(&self, rel: &str) -> PathBuf {
        self.exercises_dir().join(rel)
    }

    pub fn write_exercise(&self, rel: &str, body: &str) {
        write(&self.exercise_path(rel), body);
    }

    pub fn read_exercise(&self, rel: &str) -> String {
        fs::read_to_string(self.exercise_path(rel)).expect("read exercise")
    }

    pub fn config_text(&self) -> String {
        fs::read_to_string(self.config_path()).expect("read config")
    }
}

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, contents).expect("write file");
}
