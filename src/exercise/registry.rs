// src/exercise/registry.rs

//! Ordered, thread-safe store of exercise records.
//!
//! All mutation goes through [`Registry::apply`] / [`Registry::record_result`],
//! which update the record and the progress counter under one lock. Readers
//! get clones, never references into the live map.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::errors::{PylingsError, Result};
use crate::exec::RunResult;
use crate::exercise::discovery::{discover_exercise_files, exercise_matcher};
use crate::exercise::progress::{ProgressSnapshot, ProgressTracker};
use crate::exercise::record::{ExerciseRecord, exercise_id};
use crate::fs::FileSystem;
use crate::types::ExerciseStatus;
use crate::workspace::HintStore;

/// Permission to apply the result of one run.
///
/// Tickets are numbered per exercise in the order runs are started. A result
/// is applied only if its ticket is newer than the last applied one, so a
/// slow run that was superseded by a newer run cannot overwrite it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTicket {
    name: String,
    seq: u64,
}

impl RunTicket {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A status change applied to one exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub name: String,
    pub previous: ExerciseStatus,
    pub current: ExerciseStatus,
    /// This change completed the whole set (fires once per completion).
    pub finished: bool,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Immutable copy of the registry for display.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    pub exercises: Vec<ExerciseRecord>,
    pub progress: ProgressSnapshot,
}

impl RegistrySnapshot {
    pub fn get(&self, name: &str) -> Option<&ExerciseRecord> {
        self.exercises.iter().find(|r| r.name == name)
    }
}

#[derive(Debug)]
struct Slot {
    record: ExerciseRecord,
    issued: u64,
    applied: u64,
}

#[derive(Debug)]
struct RegistryState {
    slots: IndexMap<String, Slot>,
    progress: ProgressTracker,
}

/// Shared handle to the exercise registry. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Registry {
    state: Arc<Mutex<RegistryState>>,
}

impl Registry {
    /// Build a registry from records in discovery order.
    ///
    /// The key set is fixed from here on.
    pub fn new(records: Vec<ExerciseRecord>) -> Result<Self> {
        let mut slots = IndexMap::with_capacity(records.len());
        for record in records {
            let name = record.name.clone();
            let slot = Slot {
                record,
                issued: 0,
                applied: 0,
            };
            if slots.insert(name.clone(), slot).is_some() {
                return Err(PylingsError::DuplicateExercise(name));
            }
        }

        let progress = ProgressTracker::new(slots.values().map(|s| s.record.status));

        Ok(Self {
            state: Arc::new(Mutex::new(RegistryState { slots, progress })),
        })
    }

    /// Discover every exercise under `root` matching `pattern`, each starting
    /// as pending with its hint resolved.
    pub fn discover(
        fs: &dyn FileSystem,
        root: &Path,
        pattern: &str,
        hints: &dyn HintStore,
    ) -> Result<Self> {
        let matcher = exercise_matcher(pattern)?;
        let files = discover_exercise_files(fs, root, &matcher)?;

        let mut records = Vec::with_capacity(files.len());
        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let hint = hints.hint_for(exercise_id(&name));
            records.push(ExerciseRecord::new(path, hint)?);
        }

        info!(count = records.len(), ?root, "exercise registry built");
        Self::new(records)
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // Every mutation completes under the lock, so a poisoned state is
        // still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserve a ticket for a run that is about to start.
    pub fn begin_run(&self, name: &str) -> Result<RunTicket> {
        let mut state = self.lock();
        let slot = state
            .slots
            .get_mut(name)
            .ok_or_else(|| PylingsError::ExerciseNotFound(name.to_string()))?;
        slot.issued += 1;
        Ok(RunTicket {
            name: name.to_string(),
            seq: slot.issued,
        })
    }

    /// Apply the result of a ticketed run.
    ///
    /// Returns `None` when a newer run has already been applied.
    pub fn apply(&self, ticket: &RunTicket, result: &RunResult) -> Result<Option<Transition>> {
        let mut state = self.lock();
        let RegistryState { slots, progress } = &mut *state;

        let slot = slots
            .get_mut(&ticket.name)
            .ok_or_else(|| PylingsError::ExerciseNotFound(ticket.name.clone()))?;

        if ticket.seq <= slot.applied {
            debug!(
                exercise = %ticket.name,
                ticket = ticket.seq,
                applied = slot.applied,
                "discarding result of superseded run"
            );
            return Ok(None);
        }

        slot.applied = ticket.seq;
        Ok(Some(apply_to_slot(slot, progress, result)))
    }

    /// Apply a result as the newest run of `name`.
    pub fn record_result(&self, name: &str, result: &RunResult) -> Result<Transition> {
        let mut state = self.lock();
        let RegistryState { slots, progress } = &mut *state;

        let slot = slots
            .get_mut(name)
            .ok_or_else(|| PylingsError::ExerciseNotFound(name.to_string()))?;

        slot.issued += 1;
        slot.applied = slot.issued;
        Ok(apply_to_slot(slot, progress, result))
    }

    pub fn get(&self, name: &str) -> Option<ExerciseRecord> {
        self.lock().slots.get(name).map(|s| s.record.clone())
    }

    pub fn status(&self, name: &str) -> Option<ExerciseStatus> {
        self.lock().slots.get(name).map(|s| s.record.status)
    }

    pub fn get_index(&self, index: usize) -> Option<ExerciseRecord> {
        self.lock()
            .slots
            .get_index(index)
            .map(|(_, s)| s.record.clone())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.lock().slots.get_index_of(name)
    }

    /// The record right after `name` in discovery order.
    pub fn next_after(&self, name: &str) -> Option<ExerciseRecord> {
        let state = self.lock();
        let index = state.slots.get_index_of(name)?;
        state
            .slots
            .get_index(index + 1)
            .map(|(_, s)| s.record.clone())
    }

    /// The first pending record in discovery order.
    pub fn first_pending(&self) -> Option<ExerciseRecord> {
        self.lock()
            .slots
            .values()
            .find(|s| s.record.status == ExerciseStatus::Pending)
            .map(|s| s.record.clone())
    }

    /// Look up a record by the location of its file.
    pub fn find_by_path(&self, path: &Path) -> Option<ExerciseRecord> {
        let name = path.file_name()?.to_str()?;
        let state = self.lock();
        let slot = state.slots.get(name)?;
        if slot.record.path == path || slot.record.path.ends_with(path) {
            Some(slot.record.clone())
        } else {
            None
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().slots.keys().cloned().collect()
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.lock().progress.snapshot()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let state = self.lock();
        RegistrySnapshot {
            exercises: state.slots.values().map(|s| s.record.clone()).collect(),
            progress: state.progress.snapshot(),
        }
    }
}

fn apply_to_slot(slot: &mut Slot, progress: &mut ProgressTracker, result: &RunResult) -> Transition {
    let previous = slot.record.apply(result);
    let current = slot.record.status;
    let finished = progress.record_transition(previous, current);

    debug!(
        exercise = %slot.record.name,
        %previous,
        %current,
        completed = progress.completed(),
        total = progress.total(),
        "exercise result recorded"
    );

    Transition {
        name: slot.record.name.clone(),
        previous,
        current,
        finished,
    }
}
