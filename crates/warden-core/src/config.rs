//! Supervisor configuration

use std::env;
use std::path::{Path, PathBuf};

/// Configuration for a [`Supervisor`](crate::Supervisor).
///
/// Immutable once handed to the supervisor. All paths are resolved
/// against the working directory at configuration time, not at use
/// time, so a later `chdir` into the working directory cannot change
/// their meaning.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pid_file: Option<PathBuf>,
    daemonize: bool,
    stdin: Option<PathBuf>,
    stdout: Option<PathBuf>,
    stderr: Option<PathBuf>,
    working_dir: Option<PathBuf>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            pid_file: None,
            // Detaching is the normal mode for a daemon supervisor;
            // foreground operation is the opt-in.
            daemonize: true,
            stdin: None,
            stdout: None,
            stderr: None,
            working_dir: None,
        }
    }
}

impl SupervisorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path where the PID file will be created.
    pub fn pid_file(mut self, path: impl AsRef<Path>) -> Self {
        self.pid_file = Some(absolutize(path.as_ref()));
        self
    }

    /// Whether `start` detaches from the controlling terminal.
    pub fn daemonize(mut self, daemonize: bool) -> Self {
        self.daemonize = daemonize;
        self
    }

    /// Reopen stdin for reading from `path` once the workload starts.
    pub fn stdin(mut self, path: impl AsRef<Path>) -> Self {
        self.stdin = Some(absolutize(path.as_ref()));
        self
    }

    /// Append stdout to `path` once the workload starts.
    pub fn stdout(mut self, path: impl AsRef<Path>) -> Self {
        self.stdout = Some(absolutize(path.as_ref()));
        self
    }

    /// Append stderr to `path` once the workload starts.
    pub fn stderr(mut self, path: impl AsRef<Path>) -> Self {
        self.stderr = Some(absolutize(path.as_ref()));
        self
    }

    /// Change into `path` before running the workload.
    pub fn chdir(mut self, path: impl AsRef<Path>) -> Self {
        self.working_dir = Some(absolutize(path.as_ref()));
        self
    }

    pub fn pid_file_path(&self) -> Option<&Path> {
        self.pid_file.as_deref()
    }

    pub fn should_daemonize(&self) -> bool {
        self.daemonize
    }

    pub fn stdin_path(&self) -> Option<&Path> {
        self.stdin.as_deref()
    }

    pub fn stdout_path(&self) -> Option<&Path> {
        self.stdout.as_deref()
    }

    pub fn stderr_path(&self) -> Option<&Path> {
        self.stderr.as_deref()
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
