//! Termination-signal handling
//!
//! An external stop request arrives as SIGINT (sent by
//! [`Supervisor::stop`](crate::Supervisor::stop)) or SIGTERM (sent by
//! an operator). Either way the workload must not outlive its PID
//! file claim, so the guard runs a cleanup callback and then ends the
//! process.

use std::io;
use std::process;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::info;

type Callback = Box<dyn FnMut() + Send>;

static CALLBACK: Mutex<Option<Callback>> = Mutex::new(None);
static WATCHER_SPAWNED: AtomicBool = AtomicBool::new(false);

/// Process-global guard running a cleanup callback on termination
/// signals.
pub struct SignalGuard;

impl SignalGuard {
    /// Run `on_terminate` when the process receives SIGINT or
    /// SIGTERM, then exit; execution never resumes past the workload.
    ///
    /// Installation is idempotent: calling again replaces the
    /// callback, and the watcher thread is only spawned once. The
    /// callback runs on the watcher thread, not inside an
    /// async-signal context, so it may perform ordinary I/O.
    pub fn install<F>(on_terminate: F) -> io::Result<()>
    where
        F: FnMut() + Send + 'static,
    {
        *lock_callback() = Some(Box::new(on_terminate));

        if WATCHER_SPAWNED.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        thread::spawn(move || {
            if let Some(signal) = signals.forever().next() {
                info!(signal, "termination signal received, cleaning up");
                // Take the callback so a second signal arriving
                // mid-cleanup cannot re-enter it.
                if let Some(mut callback) = lock_callback().take() {
                    callback();
                }
                process::exit(0);
            }
        });
        Ok(())
    }
}

fn lock_callback() -> std::sync::MutexGuard<'static, Option<Callback>> {
    CALLBACK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Delivering a real signal would end the test process, so only
    // the installation contract is checked here; end-to-end delivery
    // is covered by the wardend integration tests.
    #[test]
    fn install_twice_replaces_the_callback() {
        SignalGuard::install(|| {}).unwrap();
        SignalGuard::install(|| {}).unwrap();
        assert!(lock_callback().is_some());
    }
}
