#![warn(missing_docs)]
//! fluxtime CLI Library
//!
//! This module provides the command line harness for snippet binaries.
//! Use `fluxtime::run()` (or `fluxtime_cli::run()`) in your main function to
//! time the snippets registered in that binary.
//!
//! # Example
//!
//! ```ignore
//! #[fluxtime::snippet]
//! fn sort_small() {
//!     let mut v = vec![3, 1, 2];
//!     v.sort();
//!     std::hint::black_box(v);
//! }
//!
//! fn main() {
//!     if let Err(e) = fluxtime::run() {
//!         eprintln!("Error: {e:#}");
//!         std::process::exit(1);
//!     }
//! }
//! ```
//!
//! ```text
//! $ my-snippets -p 3 -r 5 sort_small
//! Average on 3 process x 5 runs (100000 loops): 1.23 us +- 0.04 us
//! ```

mod config;
mod orchestrator;
mod supervisor;
mod worker;

pub use config::*;
pub use orchestrator::{Orchestrator, RunError, RunOutcome, RunSettings};
pub use supervisor::ProcessWorker;
pub use worker::{InProcessWorker, Worker, WorkerError, parse_samples};

use anyhow::Context;
use clap::Parser;
use fluxtime_core::{RawWorker, Statement, Timer, registered_snippets};
use fluxtime_report::OutputFormat;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// fluxtime CLI arguments
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "fluxtime")]
#[command(author, version, about = "fluxtime - time small registered snippets")]
pub struct Cli {
    /// Statement lines: names of registered snippets, run in order (default: pass)
    pub stmt: Vec<String>,

    /// Loops per timed batch (default: calibrate)
    #[arg(short = 'n', long)]
    pub number: Option<u64>,

    /// Setup line, run once before every batch; repeatable
    #[arg(short, long)]
    pub setup: Vec<String>,

    /// Timed batches per worker [default: 3]
    #[arg(short, long)]
    pub repeat: Option<usize>,

    /// Number of workers [default: 3]
    #[arg(short, long)]
    pub processes: Option<usize>,

    /// Print each worker's result and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Run workers inside this process instead of child processes
    #[arg(long)]
    pub in_process: bool,

    /// Per-worker timeout in seconds; 0 disables it
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the aggregated result as JSON
    #[arg(long)]
    pub json: bool,

    /// Name of the aggregated result
    #[arg(long)]
    pub name: Option<String>,

    /// Configuration file (default: nearest fluxtime.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// List registered snippets and exit
    #[arg(long)]
    pub list: bool,

    /// Worker mode: print one per-loop sample per line and nothing else
    #[arg(long)]
    pub raw: bool,
}

impl Cli {
    /// Output format selected by the flags
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }

    /// Layer flags over the file configuration: CLI > file > defaults
    pub fn settings(&self, config: &FluxtimeConfig) -> RunSettings {
        RunSettings {
            processes: self.processes.unwrap_or(config.runner.processes).max(1),
            repeat: self.repeat.unwrap_or(config.runner.repeat).max(1),
            loops: self.number,
            verbose: self.verbose,
            progress: !self.verbose && !self.json,
            name: self.name.clone(),
        }
    }

    /// Worker timeout: `--timeout` wins, `0` disables
    pub fn worker_timeout(&self, config: &FluxtimeConfig) -> anyhow::Result<Option<Duration>> {
        match self.timeout {
            Some(0) => Ok(None),
            Some(secs) => Ok(Some(Duration::from_secs(secs))),
            None => config.runner.timeout(),
        }
    }

    /// Whether workers run as child processes
    pub fn isolated(&self, config: &FluxtimeConfig) -> bool {
        !self.in_process && config.runner.isolation.is_isolated()
    }
}

/// Run the fluxtime CLI with the process arguments.
/// This is the main entry point for snippet binaries.
///
/// Usage errors exit with status 2 and `--help` with 0 before this returns.
///
/// # Returns
/// Returns `Ok(())` on success, or an error if the run failed.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the fluxtime CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let stdout = io::stdout();
    execute(&cli, &mut stdout.lock())
}

/// Run the CLI, writing the result (or raw samples) to `out`
fn execute<W: Write>(cli: &Cli, out: &mut W) -> anyhow::Result<()> {
    // Worker mode writes the protocol to stdout; no subscriber, no progress bar
    if cli.raw {
        return run_raw_mode(cli, out);
    }

    init_logging(cli.verbose);

    if cli.list {
        return list_snippets(out);
    }

    let config = match &cli.config {
        Some(path) => FluxtimeConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => FluxtimeConfig::discover().unwrap_or_default(),
    };

    let stmt = Statement::resolve_lines(&cli.stmt).map_err(RunError::from)?;
    let setup = Statement::resolve_lines(&cli.setup).map_err(RunError::from)?;
    debug!(stmt = %stmt.text(), setup = %setup.text(), "resolved statement");
    let timer = Timer::new(stmt.clone(), setup.clone());
    let orchestrator = Orchestrator::new(cli.settings(&config));

    // stdout carries a single JSON document in JSON mode
    let mut stderr = io::stderr();
    let per_worker: &mut dyn Write = match cli.format() {
        OutputFormat::Json => &mut stderr,
        OutputFormat::Human => &mut *out,
    };

    let outcome = if cli.isolated(&config) {
        let timeout = cli.worker_timeout(&config)?;
        let mut worker = ProcessWorker::new(stmt, setup)
            .map_err(|source| RunError::Worker {
                index: 1,
                total: orchestrator.settings().processes,
                source,
            })?
            .with_timeout(timeout);
        orchestrator.run(&timer, &mut worker, per_worker)?
    } else {
        let mut worker = InProcessWorker::new(&timer);
        orchestrator.run(&timer, &mut worker, per_worker)?
    };

    writeln!(out, "{}", outcome.render(cli.format())?)?;
    Ok(())
}

/// Run as a worker process: time the batches and stream samples to `out`
fn run_raw_mode<W: Write>(cli: &Cli, out: &mut W) -> anyhow::Result<()> {
    let stmt = Statement::resolve_lines(&cli.stmt)?;
    let setup = Statement::resolve_lines(&cli.setup)?;
    let timer = Timer::new(stmt, setup);

    let loops = match cli.number.filter(|&n| n > 0) {
        Some(loops) => loops,
        None => timer.calibrate()?,
    };
    let repeat = cli.repeat.unwrap_or(RunnerConfig::default().repeat);

    RawWorker::new(&timer, repeat, loops).run(out)?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "fluxtime=debug"
    } else {
        "fluxtime=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded in a larger program
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn list_snippets<W: Write>(out: &mut W) -> anyhow::Result<()> {
    let snippets = registered_snippets();

    writeln!(out, "fluxtime snippets:")?;
    for def in &snippets {
        writeln!(out, "├── {} ({}:{})", def.name, def.file, def.line)?;
    }
    writeln!(out, "{} snippets found.", snippets.len())?;
    Ok(())
}
