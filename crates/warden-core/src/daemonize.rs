//! Terminal detach

use nix::unistd::{ForkResult, fork, setsid};
use tracing::debug;

use crate::error::{Result, SupervisorError};

/// Detach the calling process from its controlling terminal.
///
/// Classic double fork: the intermediate parents exit, the surviving
/// process continues as a member of a fresh session with no
/// controlling terminal. Open file descriptors are kept; callers
/// redirect the standard streams beforehand if they need to.
///
/// Irreversible, and the surviving process has a new pid: callers
/// must re-read their own pid after this returns and never reuse the
/// pre-fork one.
pub fn detach() -> Result<()> {
    // SAFETY: the supervisor is single-threaded when it detaches;
    // nothing can hold a lock across the fork.
    match unsafe { fork() }.map_err(SupervisorError::DetachFailed)? {
        ForkResult::Parent { .. } => std::process::exit(0),
        ForkResult::Child => {}
    }

    setsid().map_err(SupervisorError::DetachFailed)?;

    // Second fork so the survivor is not a session leader and can
    // never reacquire a controlling terminal.
    // SAFETY: as above.
    match unsafe { fork() }.map_err(SupervisorError::DetachFailed)? {
        ForkResult::Parent { .. } => std::process::exit(0),
        ForkResult::Child => {}
    }

    debug!(pid = std::process::id(), "detached from terminal");
    Ok(())
}
