#![warn(missing_docs)]
//! fluxtime Statistical Engine
//!
//! Provides the statistical aggregate used across a benchmark run:
//! - Arithmetic mean and Bessel-corrected sample standard deviation
//! - `BenchResult`, an ordered sample set with a name and string metadata
//! - Merge semantics for folding per-worker results into one aggregate
//! - Pluggable rendering through the `SampleFormat` trait

mod result;
mod summary;

pub use result::{BenchResult, PlainFormat, SampleFormat};
pub use summary::{StatsError, mean, stdev};

/// Minimum number of samples required for a standard deviation
pub const MIN_STDEV_SAMPLES: usize = 2;

