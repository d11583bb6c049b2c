//! Raw Worker Loop
//!
//! The worker side of process isolation. The supervisor re-invokes the same
//! binary with `--raw`; the worker times `repeat` batches and writes each
//! per-loop sample as a decimal number on its own line. Nothing else may be
//! written to that stream.

use crate::measure::Clock;
use crate::timer::{Timer, TimingError};
use std::io::Write;

/// Times batches and streams one sample per line
#[derive(Debug)]
pub struct RawWorker<'a, C> {
    timer: &'a Timer<C>,
    repeat: usize,
    loops: u64,
}

impl<'a, C: Clock> RawWorker<'a, C> {
    /// Create a worker running `repeat` batches of `loops` iterations
    pub fn new(timer: &'a Timer<C>, repeat: usize, loops: u64) -> Self {
        Self {
            timer,
            repeat: repeat.max(1),
            loops,
        }
    }

    /// Run all batches, writing each sample as soon as it is measured.
    ///
    /// Returns the samples that were written. On error, lines already
    /// written stay on `out`; the caller reports failure via exit status.
    pub fn run<W: Write>(&self, mut out: W) -> Result<Vec<f64>, TimingError> {
        let mut samples = Vec::with_capacity(self.repeat);
        for _ in 0..self.repeat {
            let elapsed = self.timer.timeit(self.loops)?;
            let sample = elapsed / self.loops as f64;
            // `{}` prints the shortest text that parses back to the same f64
            writeln!(out, "{}", sample)?;
            out.flush()?;
            samples.push(sample);
        }
        Ok(samples)
    }
}
