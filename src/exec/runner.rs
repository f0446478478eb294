// src/exec/runner.rs

//! Runs a single exercise file as a child process.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::RunResult;

/// How long to wait for the output pipes to drain once the child is gone.
///
/// A grandchild process can keep a pipe open after the child exits; we keep
/// whatever was captured so far rather than block the caller.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Trait abstracting how an exercise is executed.
///
/// Production code uses [`ProcessRunner`]; tests provide scripted runners
/// that don't spawn processes. Implementations never fail: every problem is
/// reported as a [`RunResult`].
pub trait ExerciseRunner: Send + Sync {
    fn run<'a>(&'a self, path: &'a Path) -> Pin<Box<dyn Future<Output = RunResult> + Send + 'a>>;
}

/// Runs `<interpreter> [args..] <exercise>` with captured stdout/stderr and
/// a per-invocation timeout.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    interpreter: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(interpreter: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            args: Vec::new(),
            timeout,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn from_config(cfg: &crate::config::ConfigFile) -> Self {
        Self::new(&cfg.runner.interpreter, cfg.timeout()).with_args(cfg.runner.args.clone())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn run_process(&self, path: &Path) -> RunResult {
        match self.run_inner(path).await {
            Ok(result) => result,
            Err(err) => {
                warn!(exercise = ?path, error = %err, "failed to launch exercise");
                RunResult::launch_failed(format!("{err:#}"))
            }
        }
    }

    async fn run_inner(&self, path: &Path) -> Result<RunResult> {
        debug!(
            exercise = ?path,
            interpreter = ?self.interpreter,
            timeout_ms = self.timeout.as_millis() as u64,
            "starting exercise process"
        );

        let mut cmd = Command::new(&self.interpreter);
        cmd.args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout can take down anything the
        // exercise spawned along with it.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning {:?} for exercise {:?}", self.interpreter, path))?;

        let pid = child.id();
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        match timeout(self.timeout, child.wait()).await {
            Ok(status_res) => {
                let status = status_res
                    .with_context(|| format!("waiting for exercise process {:?}", path))?;
                let code = status.code().unwrap_or(-1);

                let stdout = drain(stdout).await;
                let stderr = drain(stderr).await;

                info!(
                    exercise = ?path,
                    exit_code = code,
                    success = status.success(),
                    "exercise process exited"
                );

                Ok(RunResult::completed(code, stdout, stderr))
            }
            Err(_elapsed) => {
                warn!(
                    exercise = ?path,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "exercise exceeded its time budget; killing process"
                );
                kill_process_group(pid);
                if let Err(e) = child.kill().await {
                    warn!(exercise = ?path, error = %e, "failed to kill timed out process");
                }

                let partial = drain(stdout).await;
                let _ = drain(stderr).await;

                Ok(RunResult::timed_out(partial))
            }
        }
    }
}

impl ExerciseRunner for ProcessRunner {
    fn run<'a>(&'a self, path: &'a Path) -> Pin<Box<dyn Future<Output = RunResult> + Send + 'a>> {
        Box::pin(self.run_process(path))
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = pid else {
        return;
    };
    debug!(pid, "killing exercise process group");
    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        debug!(pid, error = %e, "failed to signal exercise process group");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// Output captured by a reader task. The buffer outlives the task, so bytes
/// read before an abort are still available.
struct PipeReader {
    buf: Arc<Mutex<Vec<u8>>>,
    handle: JoinHandle<()>,
}

impl PipeReader {
    fn captured(&self) -> String {
        match self.buf.lock() {
            Ok(buf) => String::from_utf8_lossy(&buf).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }
}

/// Read a pipe to the end on its own task so neither pipe can fill up and
/// block the child.
fn spawn_reader<R>(mut reader: R) -> PipeReader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let buf = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&buf);
    let handle = tokio::spawn(async move {
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => match sink.lock() {
                    Ok(mut out) => out.extend_from_slice(&chunk[..n]),
                    Err(poisoned) => poisoned.into_inner().extend_from_slice(&chunk[..n]),
                },
                Err(e) => {
                    debug!(error = %e, "error while reading exercise output");
                    break;
                }
            }
        }
    });
    PipeReader { buf, handle }
}

async fn drain(reader: Option<PipeReader>) -> String {
    let Some(mut reader) = reader else {
        return String::new();
    };

    match timeout(OUTPUT_DRAIN_TIMEOUT, &mut reader.handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(error = %e, "output reader task failed"),
        Err(_) => {
            reader.handle.abort();
            debug!("output pipe still open after process exit; keeping captured output");
        }
    }
    reader.captured()
}
