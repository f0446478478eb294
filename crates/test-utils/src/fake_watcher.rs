use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use pylings::errors::Result;
use pylings::watch::{ExerciseWatcher, WatchState};

/// A fake watcher that records lifecycle calls as `"start:<path>"`,
/// `"ack:<path>"` and `"stop"` entries.
#[derive(Debug, Clone, Default)]
pub struct RecordingWatcher {
    log: Arc<Mutex<Vec<String>>>,
    watching: Option<PathBuf>,
}

impl RecordingWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the call log; stays valid after the watcher is boxed.
    pub fn log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.log)
    }
}

impl ExerciseWatcher for RecordingWatcher {
    fn start(&mut self, exercise: &Path) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("start:{}", exercise.display()));
        self.watching = Some(exercise.to_path_buf());
        Ok(())
    }

    fn stop(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if self.watching.take().is_some() {
                self.log.lock().unwrap().push("stop".to_string());
            }
        })
    }

    fn acknowledge(&mut self, exercise: &Path) {
        self.log
            .lock()
            .unwrap()
            .push(format!("ack:{}", exercise.display()));
    }

    fn state(&self) -> WatchState {
        match &self.watching {
            Some(path) => WatchState::Watching(path.clone()),
            None => WatchState::Stopped,
        }
    }
}
