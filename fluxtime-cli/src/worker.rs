//! Workers
//!
//! A worker performs `repeat` timed batches of `loops` iterations and hands
//! back one per-loop sample per batch. The orchestrator only sees the
//! [`Worker`] trait; [`InProcessWorker`] loops inside the harness and
//! [`ProcessWorker`](crate::ProcessWorker) re-runs the binary in raw mode.

use fluxtime_core::{Clock, Timer, TimingError};
use fluxtime_report::TimingResult;
use fluxtime_stats::StatsError;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a single worker
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to spawn worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("worker I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker exited with {status}")]
    Failed { status: ExitStatus },

    #[error("line {line_no}: expected a sample, got {line:?}")]
    Parse { line_no: usize, line: String },

    #[error("worker produced no samples")]
    NoSamples,

    #[error("worker timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Timing(#[from] TimingError),

    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// One unit of the fan-out
pub trait Worker {
    /// Run `repeat` batches of `loops` iterations
    fn run(&mut self, repeat: usize, loops: u64) -> Result<TimingResult, WorkerError>;
}

impl<W: Worker + ?Sized> Worker for &mut W {
    fn run(&mut self, repeat: usize, loops: u64) -> Result<TimingResult, WorkerError> {
        (**self).run(repeat, loops)
    }
}

impl<W: Worker + ?Sized> Worker for Box<W> {
    fn run(&mut self, repeat: usize, loops: u64) -> Result<TimingResult, WorkerError> {
        (**self).run(repeat, loops)
    }
}

/// Runs batches inside the current process
#[derive(Debug)]
pub struct InProcessWorker<'a, C> {
    timer: &'a Timer<C>,
}

impl<'a, C: Clock> InProcessWorker<'a, C> {
    /// Create a worker timing with `timer`
    pub fn new(timer: &'a Timer<C>) -> Self {
        Self { timer }
    }
}

impl<C: Clock> Worker for InProcessWorker<'_, C> {
    fn run(&mut self, repeat: usize, loops: u64) -> Result<TimingResult, WorkerError> {
        let samples = self.timer.repeat(repeat.max(1), loops)?;
        Ok(TimingResult::from_values(samples)?)
    }
}

/// Parse raw-mode output: one decimal sample per line.
///
/// Every line must hold a finite, non-negative number. Line numbers in
/// errors start at 1.
pub fn parse_samples(output: &str) -> Result<TimingResult, WorkerError> {
    let mut samples = Vec::new();
    for (index, line) in output.lines().enumerate() {
        let text = line.trim();
        let sample = text
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| WorkerError::Parse {
                line_no: index + 1,
                line: line.to_string(),
            })?;
        samples.push(sample);
    }
    if samples.is_empty() {
        return Err(WorkerError::NoSamples);
    }
    Ok(TimingResult::from_values(samples)?)
}
