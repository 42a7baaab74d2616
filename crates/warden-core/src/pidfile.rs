//! PID file persistence
//!
//! The PID file is plain text holding one decimal process id.
//! Existence of the file is a claim, not proof, of a running
//! workload; callers verify the claim against the process probe
//! before trusting it.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use nix::unistd::Pid;
use tracing::debug;

use crate::error::{Result, SupervisorError};

/// Handle to the PID file at a fixed path.
///
/// Single-writer assumption, no cross-process locking: two
/// supervisors pointed at the same path are outside the consistency
/// guarantee.
#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Atomically create or overwrite the file with `pid`'s decimal
    /// text, via a temporary sibling renamed into place.
    pub fn write(&self, pid: Pid) -> Result<()> {
        let tmp = self.sibling_tmp_path();
        fs::write(&tmp, pid.to_string())
            .map_err(|e| SupervisorError::io(format!("writing {}", tmp.display()), e))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            SupervisorError::io(
                format!("renaming {} to {}", tmp.display(), self.path.display()),
                e,
            )
        })?;
        debug!(pid = pid.as_raw(), path = %self.path.display(), "wrote PID file");
        Ok(())
    }

    /// Read the recorded pid. `Ok(None)` when the file does not
    /// exist; unparsable or non-positive content is corrupt.
    pub fn read(&self) -> Result<Option<Pid>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SupervisorError::io(
                    format!("reading {}", self.path.display()),
                    e,
                ));
            }
        };

        let pid: i32 = content.trim().parse().map_err(|_| self.corrupt(&content))?;
        if pid <= 0 {
            // A non-positive pid handed to kill() would target a
            // process group, never the recorded workload.
            return Err(self.corrupt(&content));
        }
        Ok(Some(Pid::from_raw(pid)))
    }

    /// Remove the file. Absence is success, which keeps the
    /// signal-triggered cleanup path safe to re-enter.
    pub fn delete(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed PID file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SupervisorError::io(
                format!("removing {}", self.path.display()),
                e,
            )),
        }
    }

    fn sibling_tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn corrupt(&self, content: &str) -> SupervisorError {
        SupervisorError::CorruptPidFile {
            path: self.path.clone(),
            content: content.to_string(),
        }
    }
}
