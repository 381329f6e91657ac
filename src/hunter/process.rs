//! Analyzer process lifecycle management.
//!
//! Owns at most one external analyzer process at a time and drives it
//! through `Idle -> Starting -> Running -> {Succeeded, Failed} -> Idle`.
//! Output is captured incrementally on reader threads and surfaced through
//! fire-and-forget events; the single-process invariant is enforced by
//! force-closing any active run before a new one starts.
//!
//! The analyzer contract is small: it is invoked with the dump file path as
//! its sole argument, writes `<dumpPath>.res` on success, and signals
//! success with exit code 0.

use chrono::{DateTime, Utc};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// Interval between completion polls
const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// How long to keep draining output after the process exits
const QUIET_WINDOW: Duration = Duration::from_millis(180);

/// Result type for analyzer operations
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

/// Errors that can occur starting an analyzer run
#[derive(Debug)]
pub enum AnalyzerError {
    /// The analyzer feature is disabled
    NotEnabled,
    /// The analyzer executable path is empty
    MissingPath,
    /// The OS refused to spawn the executable
    Spawn(PathBuf, std::io::Error),
}

impl std::fmt::Display for AnalyzerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyzerError::NotEnabled => write!(f, "Analyzer is not enabled"),
            AnalyzerError::MissingPath => write!(f, "Analyzer executable path is not set"),
            AnalyzerError::Spawn(path, err) => {
                write!(f, "Failed to start analyzer {}: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for AnalyzerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalyzerError::Spawn(_, err) => Some(err),
            _ => None,
        }
    }
}

/// Lifecycle state of the single analyzer run slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Starting,
    Running,
    Succeeded,
    Failed,
}

/// Events reported while a run is pumped.
///
/// Output events are advisory and log-only; no backpressure is needed.
#[derive(Debug, Clone)]
pub enum AnalyzerEvent {
    /// A line of standard output arrived
    Stdout(String),
    /// A line of standard error arrived
    Stderr(String),
    /// The process exited (`code` is `None` when killed by a signal)
    Exited { code: Option<i32> },
}

/// A line captured by one of the reader threads
enum StreamLine {
    Out(String),
    Err(String),
}

/// Manages the lifecycle of the external analyzer process.
///
/// At most one process exists at a time; `start` while a run is active
/// force-closes the previous process first (best-effort terminate, no
/// graceful shutdown contract).
#[derive(Debug, Default)]
pub struct AnalyzerManager {
    state: RunState,
    child: Option<Child>,
    rx: Option<Receiver<StreamLine>>,
    executable: PathBuf,
    args: Vec<String>,
    stdout_buf: String,
    stderr_buf: String,
    exit_code: Option<i32>,
    started_at: Option<DateTime<Utc>>,
}

impl AnalyzerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Whether a run is in `Starting` or `Running`
    pub fn is_active(&self) -> bool {
        matches!(self.state, RunState::Starting | RunState::Running)
    }

    /// Exit code of the most recent finished run
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Captured standard output of the current or most recent run
    pub fn stdout(&self) -> &str {
        &self.stdout_buf
    }

    /// Captured standard error of the current or most recent run
    pub fn stderr(&self) -> &str {
        &self.stderr_buf
    }

    /// Executable of the current or most recent run
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Arguments of the current or most recent run
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// When the current or most recent run was started
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Start the analyzer on a dump file.
    ///
    /// Any run still in `Starting` or `Running` is force-closed first. The
    /// executable is invoked with the dump path as its single argument.
    pub fn start(
        &mut self,
        enabled: bool,
        executable: impl AsRef<Path>,
        dump_path: impl AsRef<Path>,
    ) -> AnalyzerResult<()> {
        if !enabled {
            return Err(AnalyzerError::NotEnabled);
        }
        let executable = executable.as_ref();
        if executable.as_os_str().is_empty() {
            return Err(AnalyzerError::MissingPath);
        }

        if self.is_active() {
            self.force_close();
        }

        self.state = RunState::Starting;
        self.executable = executable.to_path_buf();
        self.args = vec![dump_path.as_ref().to_string_lossy().into_owned()];
        self.stdout_buf.clear();
        self.stderr_buf.clear();
        self.exit_code = None;
        self.started_at = Some(Utc::now());

        let mut child = Command::new(executable)
            .arg(dump_path.as_ref())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                self.state = RunState::Failed;
                AnalyzerError::Spawn(executable.to_path_buf(), err)
            })?;

        let (tx, rx) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            let tx = tx.clone();
            thread::spawn(move || stream_lines(stdout, tx, StreamLine::Out));
        }
        if let Some(stderr) = child.stderr.take() {
            thread::spawn(move || stream_lines(stderr, tx, StreamLine::Err));
        }

        self.child = Some(child);
        self.rx = Some(rx);
        self.state = RunState::Running;
        Ok(())
    }

    /// Drain any captured output and poll for completion without blocking.
    ///
    /// Returns the state after the poll; on the transition out of `Running`
    /// the exit event is fired and remaining output is drained first.
    pub fn pump<F: FnMut(AnalyzerEvent)>(&mut self, mut on_event: F) -> RunState {
        self.drain_ready(&mut on_event);

        let exited = match self.child.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(status) => status,
                Err(err) => {
                    eprintln!("Warning: failed to poll analyzer process: {}", err);
                    None
                }
            },
            None => return self.state,
        };

        if let Some(status) = exited {
            self.child = None;
            self.drain_remaining(&mut on_event);
            self.exit_code = status.code();
            self.state = if status.code() == Some(0) {
                RunState::Succeeded
            } else {
                RunState::Failed
            };
            on_event(AnalyzerEvent::Exited {
                code: self.exit_code,
            });
        }

        self.state
    }

    /// Pump until the run finishes or `timeout` elapses.
    ///
    /// On timeout the process is force-closed and the run marked `Failed`
    /// with no exit code.
    pub fn wait<F: FnMut(AnalyzerEvent)>(&mut self, timeout: Duration, mut on_event: F) -> RunState {
        let deadline = Instant::now() + timeout;
        loop {
            let state = self.pump(&mut on_event);
            if !matches!(state, RunState::Starting | RunState::Running) {
                return state;
            }
            if Instant::now() >= deadline {
                self.force_close();
                self.state = RunState::Failed;
                return self.state;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Best-effort terminate the active process and return to `Idle`.
    pub fn force_close(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.rx = None;
        self.state = RunState::Idle;
    }

    /// Acknowledge a finished run and return the slot to `Idle`.
    ///
    /// Buffers and the exit code stay available for reporting.
    pub fn reset(&mut self) {
        if !self.is_active() {
            self.state = RunState::Idle;
        }
    }

    /// Human-readable report for a failed run: executable path, exit code
    /// and the stderr-derived message.
    pub fn failure_report(&self) -> String {
        let code = match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "no exit code".to_string(),
        };
        let message = self.stderr_buf.trim();
        let message = if message.is_empty() {
            "no error output"
        } else {
            message
        };
        format!(
            "Analyzer {} failed ({}): {}",
            self.executable.display(),
            code,
            message
        )
    }

    /// Absorb everything the reader threads have queued so far.
    fn drain_ready<F: FnMut(AnalyzerEvent)>(&mut self, on_event: &mut F) {
        let mut pending = Vec::new();
        if let Some(rx) = self.rx.as_ref() {
            while let Ok(msg) = rx.try_recv() {
                pending.push(msg);
            }
        }
        for msg in pending {
            self.absorb(msg, on_event);
        }
    }

    /// After exit, drain until the reader threads close or go quiet.
    fn drain_remaining<F: FnMut(AnalyzerEvent)>(&mut self, on_event: &mut F) {
        let Some(rx) = self.rx.take() else { return };
        let mut last_activity = Instant::now();
        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(msg) => {
                    self.absorb(msg, on_event);
                    last_activity = Instant::now();
                }
                Err(RecvTimeoutError::Timeout) => {
                    if last_activity.elapsed() >= QUIET_WINDOW {
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn absorb<F: FnMut(AnalyzerEvent)>(&mut self, msg: StreamLine, on_event: &mut F) {
        match msg {
            StreamLine::Out(line) => {
                self.stdout_buf.push_str(&line);
                self.stdout_buf.push('\n');
                on_event(AnalyzerEvent::Stdout(line));
            }
            StreamLine::Err(line) => {
                self.stderr_buf.push_str(&line);
                self.stderr_buf.push('\n');
                on_event(AnalyzerEvent::Stderr(line));
            }
        }
    }
}

/// Reader-thread body: forward lines until EOF or the receiver is gone.
fn stream_lines<R: Read>(stream: R, tx: Sender<StreamLine>, wrap: fn(String) -> StreamLine) {
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        match line {
            Ok(line) => {
                if tx.send(wrap(line)).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(10);

    #[cfg(unix)]
    fn write_script(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn test_start_rejected_when_not_enabled() {
        let mut manager = AnalyzerManager::new();
        let err = manager.start(false, "/bin/true", "/tmp/page.vdom").unwrap_err();
        assert!(matches!(err, AnalyzerError::NotEnabled));
        assert_eq!(manager.state(), RunState::Idle);
    }

    #[test]
    fn test_start_rejected_on_empty_path() {
        let mut manager = AnalyzerManager::new();
        let err = manager.start(true, "", "/tmp/page.vdom").unwrap_err();
        assert!(matches!(err, AnalyzerError::MissingPath));
        assert_eq!(manager.state(), RunState::Idle);
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let mut manager = AnalyzerManager::new();
        let err = manager
            .start(true, "/nonexistent/analyzer-binary", "/tmp/page.vdom")
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Spawn(_, _)));
        assert_eq!(manager.state(), RunState::Failed);
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_run_captures_output() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(&dir, "ok.sh", "echo found; echo note 1>&2; exit 0");

        let mut manager = AnalyzerManager::new();
        manager.start(true, &script, "/tmp/page.vdom").unwrap();
        assert_eq!(manager.state(), RunState::Running);

        let mut events = Vec::new();
        let state = manager.wait(WAIT, |e| events.push(e));

        assert_eq!(state, RunState::Succeeded);
        assert_eq!(manager.exit_code(), Some(0));
        assert_eq!(manager.stdout(), "found\n");
        assert_eq!(manager.stderr(), "note\n");
        assert!(events
            .iter()
            .any(|e| matches!(e, AnalyzerEvent::Stdout(line) if line == "found")));
        assert!(events
            .iter()
            .any(|e| matches!(e, AnalyzerEvent::Exited { code: Some(0) })));
    }

    #[cfg(unix)]
    #[test]
    fn test_dump_path_is_the_single_argument() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("args.txt");
        let script = write_script(&dir, "args.sh", &format!("echo \"$#:$1\" > {}", out.display()));

        let mut manager = AnalyzerManager::new();
        manager.start(true, &script, "/tmp/page.vdom").unwrap();
        assert_eq!(manager.wait(WAIT, |_| {}), RunState::Succeeded);

        let recorded = std::fs::read_to_string(&out).unwrap();
        assert_eq!(recorded.trim(), "1:/tmp/page.vdom");
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_run_produces_report() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(&dir, "fail.sh", "echo boom 1>&2; exit 3");

        let mut manager = AnalyzerManager::new();
        manager.start(true, &script, "/tmp/page.vdom").unwrap();
        let state = manager.wait(WAIT, |_| {});

        assert_eq!(state, RunState::Failed);
        assert_eq!(manager.exit_code(), Some(3));
        let report = manager.failure_report();
        assert!(report.contains("fail.sh"));
        assert!(report.contains("exit code 3"));
        assert!(report.contains("boom"));
    }

    #[cfg(unix)]
    #[test]
    fn test_new_start_supersedes_running_process() {
        let dir = tempfile::tempdir().unwrap();
        let slow = write_script(&dir, "slow.sh", "sleep 30");
        let fast = write_script(&dir, "fast.sh", "echo second; exit 0");

        let mut manager = AnalyzerManager::new();
        manager.start(true, &slow, "/tmp/page.vdom").unwrap();
        assert!(manager.is_active());

        // Supersede: the slow run is force-closed, never two processes
        manager.start(true, &fast, "/tmp/page.vdom").unwrap();
        assert!(manager.is_active());
        assert_eq!(manager.executable(), fast.as_path());

        let state = manager.wait(WAIT, |_| {});
        assert_eq!(state, RunState::Succeeded);
        assert_eq!(manager.stdout(), "second\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_timeout_force_closes() {
        let dir = tempfile::tempdir().unwrap();
        let slow = write_script(&dir, "slow.sh", "sleep 30");

        let mut manager = AnalyzerManager::new();
        manager.start(true, &slow, "/tmp/page.vdom").unwrap();
        let state = manager.wait(Duration::from_millis(300), |_| {});

        assert_eq!(state, RunState::Failed);
        assert_eq!(manager.exit_code(), None);
        assert!(!manager.is_active());
    }

    #[cfg(unix)]
    #[test]
    fn test_reset_returns_to_idle_and_allows_next_run() {
        let dir = tempfile::tempdir().unwrap();
        let fail = write_script(&dir, "fail.sh", "exit 1");
        let ok = write_script(&dir, "ok.sh", "exit 0");

        let mut manager = AnalyzerManager::new();
        manager.start(true, &fail, "/tmp/page.vdom").unwrap();
        assert_eq!(manager.wait(WAIT, |_| {}), RunState::Failed);

        manager.reset();
        assert_eq!(manager.state(), RunState::Idle);

        manager.start(true, &ok, "/tmp/page.vdom").unwrap();
        assert_eq!(manager.wait(WAIT, |_| {}), RunState::Succeeded);
    }
}
