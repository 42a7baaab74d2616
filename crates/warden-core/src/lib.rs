//! PID-file-based daemon supervision
//!
//! This crate is the heart of warden, containing:
//! - PID file persistence (atomic claim of a workload's identity)
//! - The process probe (is the recorded pid still alive?)
//! - Terminal detach (double fork + setsid)
//! - Signal-driven cleanup (PID file teardown on SIGINT/SIGTERM)
//! - The [`Supervisor`] state machine tying them together into
//!   start / stop / restart / running
//!
//! One supervisor instance manages exactly one workload. The PID file
//! is the only shared mutable resource, and its existence is always a
//! claim to be verified against the probe, never trusted on its own.

mod config;
mod daemonize;
mod error;
mod pidfile;
mod probe;
mod signal;
mod stdio;
mod supervisor;

pub use config::*;
pub use daemonize::*;
pub use error::*;
pub use pidfile::*;
pub use probe::*;
pub use signal::*;
pub use stdio::*;
pub use supervisor::*;

/// Process identity type used throughout the crate.
pub use nix::unistd::Pid;
