use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pylings::exec::{ExerciseRunner, RunResult};

/// What a scripted run of one exercise does.
#[derive(Debug, Clone)]
pub struct Script {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub delay: Duration,
    pub panic: bool,
}

impl Script {
    pub fn pass(stdout: &str) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
            delay: Duration::ZERO,
            panic: false,
        }
    }

    pub fn fail(stderr: &str) -> Self {
        Self {
            exit_code: 1,
            stdout: String::new(),
            stderr: stderr.to_string(),
            delay: Duration::ZERO,
            panic: false,
        }
    }

    pub fn panicking() -> Self {
        Self {
            panic: true,
            ..Self::fail("")
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A fake runner that:
/// - looks up the exercise by file name and replays its [`Script`]
/// - records every invocation in order
///
/// Unknown exercises fail with exit code 1. Scripts can be replaced while
/// the runner is shared, to simulate the learner fixing a file.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, name: &str, script: Script) -> Self {
        self.set(name, script);
        self
    }

    pub fn set(&self, name: &str, script: Script) {
        self.scripts.lock().unwrap().insert(name.to_string(), script);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }
}

impl ExerciseRunner for ScriptedRunner {
    fn run<'a>(&'a self, path: &'a Path) -> Pin<Box<dyn Future<Output = RunResult> + Send + 'a>> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let script = self.scripts.lock().unwrap().get(&name).cloned();
        self.calls.lock().unwrap().push(name.clone());

        Box::pin(async move {
            let script = script.unwrap_or_else(|| Script::fail(&format!("no script for {name}")));
            if !script.delay.is_zero() {
                tokio::time::sleep(script.delay).await;
            }
            if script.panic {
                panic!("scripted panic for {name}");
            }
            RunResult::completed(script.exit_code, script.stdout, script.stderr)
        })
    }
}
