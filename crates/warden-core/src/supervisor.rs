//! The supervisor state machine
//!
//! Composes the PID file store, the process probe, terminal detach
//! and the signal guard into the start/stop/restart/status lifecycle
//! for one workload.

use std::env;

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::{Pid, getpid};
use tracing::{info, warn};

use crate::config::SupervisorConfig;
use crate::daemonize;
use crate::error::{Result, SupervisorError};
use crate::pidfile::PidFile;
use crate::probe;
use crate::signal::SignalGuard;
use crate::stdio;

/// Supervises one long-running workload through a PID file.
///
/// "Running" is never stored state: every query re-derives it from
/// the PID file and the process probe, so a stale file left behind by
/// a crashed workload reads as not running, the same as never
/// started.
pub struct Supervisor {
    config: SupervisorConfig,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Whether this supervisor detaches from the terminal on start.
    pub fn is_daemon(&self) -> bool {
        self.config.should_daemonize()
    }

    /// The recorded pid, if a PID file is configured and present.
    pub fn pid(&self) -> Result<Option<Pid>> {
        match self.pid_file() {
            Some(file) => file.read(),
            None => Ok(None),
        }
    }

    /// Freshly computed liveness: a PID file is configured, present,
    /// parsable, and the recorded process exists.
    pub fn is_running(&self) -> bool {
        let Some(file) = self.pid_file() else {
            return false;
        };
        match file.read() {
            Ok(Some(pid)) => probe::is_alive(pid),
            Ok(None) | Err(_) => false,
        }
    }

    /// Start the workload.
    ///
    /// Fails with [`SupervisorError::AlreadyRunning`] if the PID file
    /// points at a live process, and with
    /// [`SupervisorError::MissingPidFileConfig`] if daemonizing was
    /// requested without a PID file path — both checked before any
    /// detach happens. Otherwise the process optionally detaches,
    /// records its (possibly new) pid, arms the signal guard and runs
    /// the workload. A stale PID file is superseded by the overwrite.
    ///
    /// The workload is expected to run until signaled; if it returns
    /// normally the PID file is deleted, since no live process
    /// remains to guard.
    pub fn start<F>(&self, workload: F) -> Result<()>
    where
        F: FnOnce(),
    {
        if let Some(file) = self.pid_file()
            && let Ok(Some(pid)) = file.read()
            && probe::is_alive(pid)
        {
            return Err(SupervisorError::AlreadyRunning(pid));
        }

        if self.config.should_daemonize() && self.config.pid_file_path().is_none() {
            return Err(SupervisorError::MissingPidFileConfig);
        }

        self.run(workload)
    }

    /// Stop a previously started workload by interrupting the
    /// recorded pid.
    ///
    /// Success means the signal was delivered, not that the process
    /// has exited; there is no confirmation wait. When the recorded
    /// process no longer exists, the stale PID file is removed before
    /// failing with [`SupervisorError::ProcessNotFound`], so the next
    /// `start` needs no manual cleanup cycle.
    pub fn stop(&self) -> Result<()> {
        let Some(file) = self.pid_file() else {
            return Err(SupervisorError::NoPidFile);
        };
        let Some(pid) = file.read()? else {
            return Err(SupervisorError::NoPidFile);
        };

        match kill(pid, Signal::SIGINT) {
            Ok(()) => {
                info!(pid = pid.as_raw(), "interrupt delivered");
                file.delete()?;
                Ok(())
            }
            Err(Errno::ESRCH) => {
                if let Err(error) = file.delete() {
                    warn!(%error, "failed to remove stale PID file");
                }
                Err(SupervisorError::ProcessNotFound(pid))
            }
            Err(errno) => Err(SupervisorError::Signal { pid, errno }),
        }
    }

    /// `stop` (when running) followed by `start`.
    ///
    /// Not atomic: an external start between the two steps is a
    /// documented race, acceptable for a single-operator tool.
    pub fn restart<F>(&self, workload: F) -> Result<()>
    where
        F: FnOnce(),
    {
        if self.is_running() {
            self.stop()?;
        }
        self.start(workload)
    }

    fn pid_file(&self) -> Option<PidFile> {
        self.config.pid_file_path().map(PidFile::new)
    }

    fn run<F>(&self, workload: F) -> Result<()>
    where
        F: FnOnce(),
    {
        if let Some(dir) = self.config.working_dir() {
            env::set_current_dir(dir).map_err(|e| {
                SupervisorError::io(format!("changing directory to {}", dir.display()), e)
            })?;
        }
        if let Some(path) = self.config.stdin_path() {
            stdio::attach_stdin(path)?;
        }
        if let Some(path) = self.config.stdout_path() {
            stdio::attach_stdout(path)?;
        }
        if let Some(path) = self.config.stderr_path() {
            stdio::attach_stderr(path)?;
        }

        if self.config.should_daemonize() {
            daemonize::detach()?;
        }

        // Detaching forked: this pid is not the one the caller saw,
        // so it is only read now, after the claim holder is final.
        let pid = getpid();

        if let Some(file) = self.pid_file() {
            file.write(pid)?;
            let claim = file.clone();
            SignalGuard::install(move || {
                if let Err(error) = claim.delete() {
                    warn!(%error, "failed to remove PID file during shutdown");
                }
            })
            .map_err(|e| SupervisorError::io("installing signal handlers", e))?;
        }

        info!(pid = pid.as_raw(), "workload starting");
        workload();

        // Normal return: nothing is left to guard, drop the claim.
        if let Some(file) = self.pid_file() {
            file.delete()?;
        }
        info!(pid = pid.as_raw(), "workload finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::process::Command;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn foreground_config(dir: &tempfile::TempDir) -> SupervisorConfig {
        SupervisorConfig::new()
            .pid_file(dir.path().join("test.pid"))
            .daemonize(false)
    }

    /// A pid guaranteed dead: spawn a short-lived child and reap it.
    fn dead_pid() -> Pid {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = Pid::from_raw(child.id() as i32);
        child.wait().unwrap();
        pid
    }

    #[test]
    fn not_running_without_pid_file_config() {
        let supervisor = Supervisor::new(SupervisorConfig::new().daemonize(false));
        assert!(!supervisor.is_running());
    }

    #[test]
    fn not_running_when_file_absent() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = Supervisor::new(foreground_config(&dir));
        assert!(!supervisor.is_running());
    }

    #[test]
    fn not_running_for_stale_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = foreground_config(&dir);
        PidFile::new(config.pid_file_path().unwrap())
            .write(dead_pid())
            .unwrap();

        let supervisor = Supervisor::new(config);
        assert!(!supervisor.is_running());
    }

    #[test]
    fn not_running_for_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = foreground_config(&dir);
        fs::write(config.pid_file_path().unwrap(), "garbage").unwrap();

        let supervisor = Supervisor::new(config);
        assert!(!supervisor.is_running());
    }

    #[test]
    fn start_fails_when_already_running() {
        let dir = tempfile::tempdir().unwrap();
        let config = foreground_config(&dir);
        // The test process itself stands in for a live workload.
        let own_pid = getpid();
        PidFile::new(config.pid_file_path().unwrap())
            .write(own_pid)
            .unwrap();

        let supervisor = Supervisor::new(config.clone());
        let ran = AtomicBool::new(false);
        let result = supervisor.start(|| ran.store(true, Ordering::SeqCst));

        assert!(matches!(result, Err(SupervisorError::AlreadyRunning(pid)) if pid == own_pid));
        assert!(!ran.load(Ordering::SeqCst));
        // No PID file mutation on the failure path.
        let content = fs::read_to_string(config.pid_file_path().unwrap()).unwrap();
        assert_eq!(content, own_pid.to_string());
    }

    #[test]
    fn start_daemonized_without_pid_file_fails_before_detach() {
        let supervisor = Supervisor::new(SupervisorConfig::new().daemonize(true));
        let ran = AtomicBool::new(false);
        let result = supervisor.start(|| ran.store(true, Ordering::SeqCst));

        assert!(matches!(result, Err(SupervisorError::MissingPidFileConfig)));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn start_records_own_pid_and_cleans_up_on_normal_return() {
        let dir = tempfile::tempdir().unwrap();
        let config = foreground_config(&dir);
        let supervisor = Supervisor::new(config.clone());
        let pid_path = config.pid_file_path().unwrap().to_path_buf();

        supervisor
            .start(|| {
                // While the workload runs the claim maps to us.
                let content = fs::read_to_string(&pid_path).unwrap();
                assert_eq!(content, getpid().to_string());
                assert!(supervisor.is_running());
            })
            .unwrap();

        assert!(!pid_path.exists());
        assert!(!supervisor.is_running());
    }

    #[test]
    fn start_supersedes_a_stale_claim() {
        let dir = tempfile::tempdir().unwrap();
        let config = foreground_config(&dir);
        PidFile::new(config.pid_file_path().unwrap())
            .write(dead_pid())
            .unwrap();

        let supervisor = Supervisor::new(config);
        let ran = AtomicBool::new(false);
        supervisor.start(|| ran.store(true, Ordering::SeqCst)).unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn stop_without_pid_file_config_fails() {
        let supervisor = Supervisor::new(SupervisorConfig::new().daemonize(false));
        assert!(matches!(supervisor.stop(), Err(SupervisorError::NoPidFile)));
    }

    #[test]
    fn stop_with_absent_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = Supervisor::new(foreground_config(&dir));
        assert!(matches!(supervisor.stop(), Err(SupervisorError::NoPidFile)));
    }

    #[test]
    fn stop_with_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = foreground_config(&dir);
        fs::write(config.pid_file_path().unwrap(), "garbage").unwrap();

        let supervisor = Supervisor::new(config);
        assert!(matches!(
            supervisor.stop(),
            Err(SupervisorError::CorruptPidFile { .. })
        ));
    }

    #[test]
    fn stop_on_stale_claim_fails_but_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = foreground_config(&dir);
        let stale = dead_pid();
        PidFile::new(config.pid_file_path().unwrap())
            .write(stale)
            .unwrap();

        let supervisor = Supervisor::new(config.clone());
        let result = supervisor.stop();

        assert!(matches!(result, Err(SupervisorError::ProcessNotFound(pid)) if pid == stale));
        assert!(!config.pid_file_path().unwrap().exists());
    }

    #[test]
    fn stop_interrupts_the_recorded_process() {
        let dir = tempfile::tempdir().unwrap();
        let config = foreground_config(&dir);

        let mut child = Command::new("sleep").arg("60").spawn().unwrap();
        PidFile::new(config.pid_file_path().unwrap())
            .write(Pid::from_raw(child.id() as i32))
            .unwrap();

        let supervisor = Supervisor::new(config.clone());
        assert!(supervisor.is_running());

        supervisor.stop().unwrap();
        assert!(!config.pid_file_path().unwrap().exists());
        assert!(!supervisor.is_running());

        // sleep dies on SIGINT; reap it so the pid cannot linger.
        let status = child.wait().unwrap();
        assert!(!status.success());
    }

    #[test]
    fn restart_stops_the_old_claim_then_starts() {
        let dir = tempfile::tempdir().unwrap();
        let config = foreground_config(&dir);

        let mut child = Command::new("sleep").arg("60").spawn().unwrap();
        PidFile::new(config.pid_file_path().unwrap())
            .write(Pid::from_raw(child.id() as i32))
            .unwrap();

        let supervisor = Supervisor::new(config.clone());
        let ran = AtomicBool::new(false);
        supervisor
            .restart(|| ran.store(true, Ordering::SeqCst))
            .unwrap();

        assert!(ran.load(Ordering::SeqCst));
        assert!(!config.pid_file_path().unwrap().exists());
        child.wait().unwrap();
    }

    #[test]
    fn restart_when_not_running_just_starts() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = Supervisor::new(foreground_config(&dir));
        let ran = AtomicBool::new(false);
        supervisor
            .restart(|| ran.store(true, Ordering::SeqCst))
            .unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn daemon_flag_accessor() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!Supervisor::new(foreground_config(&dir)).is_daemon());
        assert!(Supervisor::new(SupervisorConfig::new()).is_daemon());
    }
}
