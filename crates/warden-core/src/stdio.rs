//! Standard-stream redirection
//!
//! Redirecting is an explicit operation performed once before the
//! workload runs, never a side effect of configuration assignment.
//! stdout and stderr are opened in append mode so a restart does not
//! truncate earlier output.

use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, RawFd};
use std::path::Path;

use nix::unistd::dup2;
use tracing::debug;

use crate::error::{Result, SupervisorError};

const STDIN_FD: RawFd = 0;
const STDOUT_FD: RawFd = 1;
const STDERR_FD: RawFd = 2;

/// Reopen stdin for reading from `path`.
pub fn attach_stdin(path: &Path) -> Result<()> {
    let file = File::open(path)
        .map_err(|e| SupervisorError::io(format!("opening {} for stdin", path.display()), e))?;
    dup_onto(file, STDIN_FD, "stdin")
}

/// Reopen stdout for appending to `path`.
pub fn attach_stdout(path: &Path) -> Result<()> {
    dup_onto(open_append(path)?, STDOUT_FD, "stdout")
}

/// Reopen stderr for appending to `path`.
pub fn attach_stderr(path: &Path) -> Result<()> {
    dup_onto(open_append(path)?, STDERR_FD, "stderr")
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SupervisorError::io(format!("opening {} for append", path.display()), e))
}

fn dup_onto(file: File, fd: RawFd, stream: &str) -> Result<()> {
    dup2(file.as_raw_fd(), fd).map_err(|errno| SupervisorError::Io {
        context: format!("redirecting {stream}"),
        source: errno.into(),
    })?;
    // `file` drops here; the duplicated descriptor stays open.
    debug!(stream, fd, "redirected standard stream");
    Ok(())
}
