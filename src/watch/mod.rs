// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Observing the directory of the selected exercise (`notify`).
//! - Filtering events down to real content changes of that one file, using
//!   content digests.
//! - Debouncing bursts of changes into a single re-evaluation.
//!
//! It does not render anything; results flow back through the registry and
//! an [`EngineEvent`](crate::engine::EngineEvent).

pub mod debounce;
pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod watcher;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::errors::Result;

pub use debounce::Debounce;
pub use event_handler::{ChangeDecision, classify_change, is_relevant_kind};
pub use hash::{DigestCache, compute_file_hash};
pub use watcher::ChangeWatcher;

/// Lifecycle state of a watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchState {
    Stopped,
    /// Observing the directory of this exercise.
    Watching(PathBuf),
}

/// Something that re-evaluates the selected exercise when it changes.
///
/// `restart` must fully stop the old observation before starting the new
/// one, so two watchers never run at the same time.
pub trait ExerciseWatcher: Send {
    fn start(&mut self, exercise: &Path) -> Result<()>;

    fn stop(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// The file was just rewritten on purpose and is about to be
    /// re-evaluated anyway; that write must not trigger a re-run of its own.
    fn acknowledge(&mut self, _exercise: &Path) {}

    fn restart<'a>(
        &'a mut self,
        exercise: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.stop().await;
            self.start(exercise)
        })
    }

    fn state(&self) -> WatchState;
}
