//! wardend - an example daemon supervised through a PID file
//!
//! Runs a trivial tick workload (a UTC timestamp once per interval)
//! under the warden supervisor, exposing the start / stop / restart /
//! status lifecycle on the command line.

use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;
use warden_core::{Supervisor, SupervisorConfig};

/// wardend - PID-file supervised example daemon
#[derive(Parser, Debug)]
#[command(name = "wardend")]
#[command(about = "PID-file supervised example daemon", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Cmd,

    /// PID file path
    #[arg(long, global = true, default_value = "/tmp/wardend.pid")]
    pid_file: PathBuf,

    /// Stay attached to the terminal instead of daemonizing
    #[arg(long, global = true)]
    foreground: bool,

    /// Reopen stdin for reading from this file once started
    #[arg(long, global = true)]
    stdin: Option<PathBuf>,

    /// Append stdout to this file once started
    #[arg(long, global = true)]
    stdout: Option<PathBuf>,

    /// Append stderr to this file once started
    #[arg(long, global = true)]
    stderr: Option<PathBuf>,

    /// Change into this working directory before running
    #[arg(long, global = true)]
    chdir: Option<PathBuf>,

    /// Seconds between workload ticks
    #[arg(long, global = true, default_value_t = 1)]
    interval: u64,

    /// Log level (or set RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Start the workload as a background process
    Start,
    /// Stop a previously started workload
    Stop,
    /// Stop the workload if running, then start it again
    Restart,
    /// Report whether the workload is currently running
    Status,
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = SupervisorConfig::new()
        .pid_file(&args.pid_file)
        .daemonize(!args.foreground);
    if let Some(path) = &args.stdin {
        config = config.stdin(path);
    }
    if let Some(path) = &args.stdout {
        config = config.stdout(path);
    }
    if let Some(path) = &args.stderr {
        config = config.stderr(path);
    }
    if let Some(dir) = &args.chdir {
        config = config.chdir(dir);
    }

    let supervisor = Supervisor::new(config);
    let interval = Duration::from_secs(args.interval.max(1));

    let outcome = match args.command {
        Cmd::Start => supervisor.start(|| tick_loop(interval)),
        Cmd::Stop => supervisor.stop(),
        Cmd::Restart => supervisor.restart(|| tick_loop(interval)),
        Cmd::Status => {
            if supervisor.is_running() {
                println!("wardend is running");
            } else {
                println!("wardend is not running");
            }
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!(error = %err, "command failed");
        process::exit(err.exit_code());
    }
}

/// The demo workload: prints a timestamp every tick until signaled.
fn tick_loop(interval: Duration) {
    loop {
        println!("{}", Utc::now());
        thread::sleep(interval);
    }
}
