#![warn(missing_docs)]
//! # fluxtime
//!
//! Micro-benchmark harness for small snippets of Rust code.
//!
//! fluxtime answers "how long does this take?" for a tiny piece of code:
//! - **Calibration**: picks the smallest power of ten of loops whose batch takes at least 0.2 s
//! - **Process Isolation**: every worker is a fresh child process, so one worker's warm caches
//!   and allocator state never leak into the next
//! - **Aggregation**: worker samples are merged in launch order and summarised as mean and
//!   sample standard deviation
//! - **Readable Units**: durations print in sec, ms, us or ns with 3 significant digits
//!
//! ## Quick Start
//!
//! ```ignore
//! use fluxtime::prelude::*;
//!
//! #[snippet]
//! fn sort_small() {
//!     let mut v = vec![5, 3, 1, 4, 2];
//!     v.sort();
//!     black_box(v);
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
//! $ cargo run --release -- sort_small
//! Average on 3 process x 3 runs (1000000 loops): 41.2 ns +- 0.93 ns
//! ```
//!
//! ## Using the pieces directly
//!
//! ```
//! use fluxtime::{TimingResult, format_duration};
//!
//! let mut total = TimingResult::new();
//! total.merge(&TimingResult::from_values(vec![0.001, 0.002]).unwrap());
//! total.merge(&TimingResult::from_values(vec![0.0015]).unwrap());
//! assert_eq!(total.to_string(), "1.50 ms +- 0.50 ms");
//! assert_eq!(format_duration(2.3e-9, None), "2.30 ns");
//! ```

// Re-export core types
pub use fluxtime_core::{
    Clock, MAX_CALIBRATION_EXPONENT, MIN_CALIBRATION_TIME, MonotonicClock, PASS, RawWorker,
    Snippet, SnippetDef, Statement, Timer, TimingError, calibrate, find_snippet,
    registered_snippets,
};

// Re-export macros
pub use fluxtime_macros::snippet;

// Re-export stats
pub use fluxtime_stats::{BenchResult, PlainFormat, SampleFormat, StatsError, mean, stdev};

// Re-export report
pub use fluxtime_report::{
    OutputFormat, RunReport, TimingFormat, TimingResult, UNIT_TIERS, UnitTier, format_duration,
    generate_json_report,
};

// Re-export the harness
pub use fluxtime_cli::{
    Cli, FluxtimeConfig, InProcessWorker, IsolationMode, Orchestrator, ProcessWorker, RunError,
    RunOutcome, RunSettings, RunnerConfig, Worker, WorkerError, parse_samples, run_with_cli,
};

/// Internal re-exports for macro use
#[doc(hidden)]
pub mod internal {
    pub use inventory;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Statement, Timer, TimingResult, format_duration, snippet};
    pub use std::hint::black_box;
}

/// Run the fluxtime CLI harness.
///
/// Call this from your snippet binary's `main()`:
/// ```ignore
/// fn main() {
///     fluxtime::run().unwrap();
/// }
/// ```
pub use fluxtime_cli::run;
