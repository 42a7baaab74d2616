//! Process liveness checks

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

/// Whether a process with `pid` currently exists.
///
/// Uses `kill(pid, 0)` semantics: no signal is delivered and the
/// target is never affected. `ESRCH` means no such process; `EPERM`
/// means the process exists but belongs to another user, which still
/// counts as alive. Non-positive pids are never alive.
///
/// Liveness of the pid number is all this checks: if the OS recycled
/// the number since it was recorded, the answer refers to the new
/// process.
pub fn is_alive(pid: Pid) -> bool {
    if pid.as_raw() <= 0 {
        return false;
    }
    match kill(pid, None) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false,
        Err(_) => true,
    }
}
