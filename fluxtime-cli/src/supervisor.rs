//! Supervisor Side of Process Isolation
//!
//! Each call to [`ProcessWorker::run`] starts a fresh child: the current
//! executable re-invoked with `--raw`, an explicit loop count and the
//! resolved statement/setup. The child inherits the working directory and
//! stderr; its stdout carries the samples, one per line.

use crate::worker::{Worker, WorkerError, parse_samples};
use fluxtime_core::Statement;
use fluxtime_report::TimingResult;
use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How often a running child is polled when a timeout is set
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long a child gets to exit after SIGTERM before it is killed
const TERM_GRACE: Duration = Duration::from_millis(500);

/// Send SIGTERM to a process. Returns `Err` if the signal could not be delivered.
#[cfg(unix)]
fn send_sigterm(pid: u32) -> Result<(), std::io::Error> {
    let ret = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if ret == -1 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(not(unix))]
fn send_sigterm(_pid: u32) -> Result<(), std::io::Error> {
    Err(std::io::Error::from(std::io::ErrorKind::Unsupported))
}

/// Owns a running child and reaps it on drop
struct ChildGuard {
    child: Child,
}

impl ChildGuard {
    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// SIGTERM, wait up to [`TERM_GRACE`], then kill
    fn terminate(&mut self) {
        if !self.is_alive() {
            return;
        }
        let _ = send_sigterm(self.child.id());
        let deadline = Instant::now() + TERM_GRACE;
        while Instant::now() < deadline {
            if !self.is_alive() {
                return;
            }
            thread::sleep(POLL_INTERVAL);
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
    }

    /// Wait for exit, giving up at `timeout`
    fn wait(&mut self, timeout: Option<Duration>) -> Result<ExitStatus, WorkerError> {
        let Some(timeout) = timeout else {
            return Ok(self.child.wait()?);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(status);
            }
            let now = Instant::now();
            if now >= deadline {
                warn!(pid = self.child.id(), ?timeout, "worker timed out, terminating");
                self.terminate();
                return Err(WorkerError::Timeout(timeout));
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Worker that runs every batch set in a fresh child process
#[derive(Debug, Clone)]
pub struct ProcessWorker {
    binary: PathBuf,
    stmt: Statement,
    setup: Statement,
    timeout: Option<Duration>,
}

impl ProcessWorker {
    /// Worker re-invoking the current executable
    pub fn new(stmt: Statement, setup: Statement) -> Result<Self, WorkerError> {
        let binary = env::current_exe().map_err(WorkerError::Spawn)?;
        Ok(Self::with_binary(binary, stmt, setup))
    }

    /// Worker invoking a specific binary
    pub fn with_binary(binary: impl Into<PathBuf>, stmt: Statement, setup: Statement) -> Self {
        Self {
            binary: binary.into(),
            stmt,
            setup,
            timeout: None,
        }
    }

    /// Kill children that run longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments passed to the child for one run.
    ///
    /// A no-op setup is left out; the child defaults to `pass`.
    pub fn args(&self, repeat: usize, loops: u64) -> Vec<String> {
        let mut args = vec![
            "--raw".to_string(),
            "-n".to_string(),
            loops.to_string(),
            "-r".to_string(),
            repeat.to_string(),
        ];
        if !self.setup.is_pass() {
            for snippet in self.setup.snippets() {
                args.push(format!("--setup={}", snippet.name));
            }
        }
        args.push("--".to_string());
        args.extend(self.stmt.snippets().iter().map(|s| s.name.to_string()));
        args
    }
}

impl Worker for ProcessWorker {
    fn run(&mut self, repeat: usize, loops: u64) -> Result<TimingResult, WorkerError> {
        let mut command = Command::new(&self.binary);
        command
            .args(self.args(repeat, loops))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        let mut guard = ChildGuard {
            child: command.spawn().map_err(WorkerError::Spawn)?,
        };
        debug!(
            pid = guard.child.id(),
            binary = %self.binary.display(),
            stmt = %self.stmt.text(),
            repeat,
            loops,
            "spawned worker"
        );

        let stdout = guard
            .child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("worker stdout was not captured"))?;
        let reader = drain(stdout);

        let status = guard.wait(self.timeout)?;
        debug!(pid = guard.child.id(), %status, "worker exited");

        let output = reader
            .join()
            .map_err(|_| std::io::Error::other("worker stdout reader panicked"))??;

        if !status.success() {
            return Err(WorkerError::Failed { status });
        }
        parse_samples(&output)
    }
}

/// Read a pipe to the end on a helper thread so the child never blocks on a full pipe
fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<String>> {
    thread::spawn(move || {
        let mut output = String::new();
        pipe.read_to_string(&mut output)?;
        Ok(output)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxtime_core::Snippet;

    fn fill() {}

    #[test]
    fn test_args_layout() {
        let worker = ProcessWorker::with_binary("/bin/true", Statement::pass(), Statement::pass());
        assert_eq!(
            worker.args(3, 1000),
            vec!["--raw", "-n", "1000", "-r", "3", "--", "pass"]
        );

        let setup = Statement::new(vec![
            Snippet { name: "fill", func: fill },
            Snippet::pass(),
        ]);
        let worker = ProcessWorker::with_binary("/bin/true", Statement::pass(), setup);
        assert_eq!(
            worker.args(1, 10),
            vec!["--raw", "-n", "10", "-r", "1", "--setup=fill", "--setup=pass", "--", "pass"]
        );
    }

    #[cfg(unix)]
    fn script(name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let dir = env::temp_dir().join(format!("fluxtime-supervisor-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_reads_samples_from_child() {
        let binary = script("ok.sh", "echo 0.001\necho 0.002");
        let mut worker = ProcessWorker::with_binary(binary, Statement::pass(), Statement::pass());
        let result = worker.run(2, 10).unwrap();
        assert_eq!(result.values(), &[0.001, 0.002]);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_exit_status() {
        let binary = script("fail.sh", "echo 0.001\nexit 3");
        let mut worker = ProcessWorker::with_binary(binary, Statement::pass(), Statement::pass());
        match worker.run(1, 1) {
            Err(WorkerError::Failed { status }) => assert_eq!(status.code(), Some(3)),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_binary() {
        let mut worker = ProcessWorker::with_binary(
            "/nonexistent/fluxtime-worker",
            Statement::pass(),
            Statement::pass(),
        );
        assert!(matches!(worker.run(1, 1), Err(WorkerError::Spawn(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_numeric_output_is_a_parse_error() {
        let binary = script("garbage.sh", "echo 0.5\necho hello");
        let mut worker = ProcessWorker::with_binary(binary, Statement::pass(), Statement::pass());
        match worker.run(2, 1) {
            Err(WorkerError::Parse { line_no, line }) => {
                assert_eq!(line_no, 2);
                assert_eq!(line, "hello");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_terminates_child() {
        let binary = script("slow.sh", "exec sleep 30");
        let mut worker = ProcessWorker::with_binary(binary, Statement::pass(), Statement::pass())
            .with_timeout(Some(Duration::from_millis(100)));

        let started = Instant::now();
        let outcome = worker.run(1, 1);
        assert!(matches!(outcome, Err(WorkerError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
