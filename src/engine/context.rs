// src/engine/context.rs

use std::fmt;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::{PylingsError, Result};
use crate::exec::{ExerciseRunner, RunResult};
use crate::exercise::{ExerciseRecord, Registry, RegistrySnapshot, RunTicket, Transition};

use super::EngineEvent;

/// State shared between the foreground loop, the change watcher and the
/// batch evaluator.
///
/// Cloning is cheap; every clone sees the same registry and selection.
#[derive(Clone)]
pub struct ExerciseContext {
    registry: Registry,
    selection: Arc<RwLock<Option<String>>>,
    runner: Arc<dyn ExerciseRunner>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl fmt::Debug for ExerciseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExerciseContext")
            .field("registry", &self.registry)
            .field("selection", &self.current_name())
            .finish_non_exhaustive()
    }
}

impl ExerciseContext {
    pub fn new(
        registry: Registry,
        runner: Arc<dyn ExerciseRunner>,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Self {
        Self {
            registry,
            selection: Arc::new(RwLock::new(None)),
            runner,
            events,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn runner(&self) -> Arc<dyn ExerciseRunner> {
        Arc::clone(&self.runner)
    }

    pub fn current_name(&self) -> Option<String> {
        self.selection
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The selected record, as currently stored in the registry.
    pub fn current(&self) -> Option<ExerciseRecord> {
        let name = self.current_name()?;
        self.registry.get(&name)
    }

    /// Make `name` the current selection.
    pub fn select(&self, name: &str) -> Result<ExerciseRecord> {
        let record = self
            .registry
            .get(name)
            .ok_or_else(|| PylingsError::ExerciseNotFound(name.to_string()))?;
        *self.selection.write().unwrap_or_else(|e| e.into_inner()) = Some(name.to_string());
        debug!(exercise = name, "selection changed");
        Ok(record)
    }

    /// Run `name` once and apply the result.
    ///
    /// Returns `None` if a newer run of the same exercise was applied while
    /// this one was in flight.
    pub async fn rerun(&self, name: &str) -> Result<Option<Transition>> {
        let ticket = self.registry.begin_run(name)?;
        let record = self
            .registry
            .get(name)
            .ok_or_else(|| PylingsError::ExerciseNotFound(name.to_string()))?;

        let result = self.runner.run(&record.path).await;
        self.apply(&ticket, &result)
    }

    /// Apply a ticketed result and announce completion of the whole set.
    pub fn apply(&self, ticket: &RunTicket, result: &RunResult) -> Result<Option<Transition>> {
        let transition = self.registry.apply(ticket, result)?;
        if let Some(t) = &transition {
            self.announce(t);
        }
        Ok(transition)
    }

    /// Apply `result` as the newest run of `name`.
    pub fn record_result(&self, name: &str, result: &RunResult) -> Result<Transition> {
        let transition = self.registry.record_result(name, result)?;
        self.announce(&transition);
        Ok(transition)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.registry.snapshot()
    }

    /// Post an event to the foreground loop. A closed channel means the
    /// foreground loop is gone, which is not an error for background work.
    pub fn notify(&self, event: EngineEvent) {
        if self.events.send(event).is_err() {
            debug!("engine event channel closed; dropping event");
        }
    }

    fn announce(&self, transition: &Transition) {
        if transition.finished {
            info!(exercise = %transition.name, "all exercises completed");
            self.notify(EngineEvent::Finished);
        }
    }
}
