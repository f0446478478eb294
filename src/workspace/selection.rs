// src/workspace/selection.rs

//! Persistence of the last visited exercise.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use toml::{Table, Value};
use tracing::debug;

use crate::errors::{PylingsError, Result};

/// Stores the current selection across sessions, as a path relative to the
/// exercises directory (e.g. `00_intro/intro1.py`).
pub trait SelectionStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, exercise: &str) -> Result<()>;
}

/// Keeps the selection in `[workspace].current_exercise` of `.pylings.toml`.
///
/// Writes rewrite only that key (and `firsttime`); other keys survive.
#[derive(Debug, Clone)]
pub struct TomlSelectionStore {
    config_path: PathBuf,
}

impl TomlSelectionStore {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Return whether this is the first interactive start, clearing the flag.
    pub fn take_first_time(&self) -> Result<bool> {
        let mut doc = self.read_doc()?;
        let first = doc
            .get("workspace")
            .and_then(|w| w.get("firsttime"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if first {
            workspace_table(&mut doc)?.insert("firsttime".to_string(), Value::Boolean(false));
            self.write_doc(&doc)?;
        }
        Ok(first)
    }

    fn read_doc(&self) -> Result<Table> {
        let contents = fs::read_to_string(&self.config_path)?;
        Ok(toml::from_str(&contents)?)
    }

    fn write_doc(&self, doc: &Table) -> Result<()> {
        fs::write(&self.config_path, toml::to_string(doc)?)?;
        Ok(())
    }
}

fn workspace_table(doc: &mut Table) -> Result<&mut Table> {
    let entry = doc
        .entry("workspace")
        .or_insert_with(|| Value::Table(Table::new()));
    match entry {
        Value::Table(table) => Ok(table),
        _ => Err(PylingsError::ConfigError(
            "[workspace] in config is not a table".to_string(),
        )),
    }
}

impl SelectionStore for TomlSelectionStore {
    fn load(&self) -> Result<Option<String>> {
        let doc = self.read_doc()?;
        Ok(doc
            .get("workspace")
            .and_then(|w| w.get("current_exercise"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn save(&self, exercise: &str) -> Result<()> {
        let mut doc = self.read_doc()?;
        workspace_table(&mut doc)?.insert(
            "current_exercise".to_string(),
            Value::String(exercise.to_string()),
        );
        self.write_doc(&doc)?;
        debug!(exercise, "persisted current exercise");
        Ok(())
    }
}

/// Selection kept in memory only (tests, non-interactive runs).
#[derive(Debug, Default)]
pub struct MemorySelectionStore {
    current: Mutex<Option<String>>,
}

impl MemorySelectionStore {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            current: Mutex::new(initial),
        }
    }
}

impl SelectionStore for MemorySelectionStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.current.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, exercise: &str) -> Result<()> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(exercise.to_string());
        Ok(())
    }
}
