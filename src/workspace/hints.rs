// src/workspace/hints.rs

//! Read-only hint lookup.
//!
//! The hints file holds one table per exercise:
//!
//! ```toml
//! [exercise_intro1]
//! name = "intro1"
//! hint = "Remove the FIXME comment."
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::Result;

/// Source of advisory text, keyed by exercise identifier (file stem).
pub trait HintStore: Send + Sync {
    fn hint_for(&self, exercise_id: &str) -> Option<String>;
}

/// A store that knows no hints.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHints;

impl HintStore for NoHints {
    fn hint_for(&self, _exercise_id: &str) -> Option<String> {
        None
    }
}

impl HintStore for HashMap<String, String> {
    fn hint_for(&self, exercise_id: &str) -> Option<String> {
        self.get(exercise_id).cloned()
    }
}

#[derive(Debug, Deserialize)]
struct HintEntry {
    name: String,
    hint: String,
}

/// Hints parsed from a TOML file.
#[derive(Debug, Clone, Default)]
pub struct TomlHintStore {
    hints: HashMap<String, String>,
}

impl TomlHintStore {
    /// Load hints from `path`. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            warn!(?path, "hints file not found; continuing without hints");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let tables: BTreeMap<String, toml::Value> = toml::from_str(contents)?;

        let mut hints = HashMap::new();
        for (section, value) in tables {
            if !section.starts_with("exercise_") {
                continue;
            }
            let entry: HintEntry = value.try_into()?;
            let name = entry.name.trim().trim_matches('"').to_string();
            hints.insert(name, entry.hint);
        }

        debug!(count = hints.len(), "loaded exercise hints");
        Ok(Self { hints })
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }
}

impl HintStore for TomlHintStore {
    fn hint_for(&self, exercise_id: &str) -> Option<String> {
        self.hints.get(exercise_id).cloned()
    }
}
