//! Error types for the warden supervisor

use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use nix::unistd::Pid;
use thiserror::Error;

/// Core error type for supervisor operations
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("process is already running with PID {0}")]
    AlreadyRunning(Pid),

    #[error("no PID file is set but daemonize is enabled")]
    MissingPidFileConfig,

    #[error("couldn't find the PID file")]
    NoPidFile,

    #[error("no process is running with PID {0}")]
    ProcessNotFound(Pid),

    #[error("PID file {} has unparsable content {content:?}", .path.display())]
    CorruptPidFile { path: PathBuf, content: String },

    #[error("failed to detach from the terminal: {0}")]
    DetachFailed(Errno),

    #[error("delivering signal to PID {pid} failed: {errno}")]
    Signal { pid: Pid, errno: Errno },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl SupervisorError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit code for this failure, so automation can branch
    /// on the outcome: 2 for already running, 3 for no such process,
    /// 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AlreadyRunning(_) => 2,
            Self::ProcessNotFound(_) => 3,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
