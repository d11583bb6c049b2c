#![warn(missing_docs)]
//! fluxtime Core - Timing Runtime
//!
//! This crate provides the execution environment for snippets:
//! - `Clock` abstraction with a monotonic default
//! - Snippet registry populated by `#[fluxtime::snippet]`
//! - `Timer` for timing batches of statement executions
//! - Calibration of the loop count
//! - The raw worker loop that prints one sample per line

mod calibrate;
mod measure;
mod snippet;
mod timer;
mod worker;

pub use calibrate::{MAX_CALIBRATION_EXPONENT, MIN_CALIBRATION_TIME, calibrate};
pub use measure::{Clock, MonotonicClock};
pub use snippet::{PASS, Snippet, SnippetDef, Statement, find_snippet, registered_snippets};
pub use timer::{Timer, TimingError};
pub use worker::RawWorker;

// Collect all registered snippets
inventory::collect!(SnippetDef);

/// Anchor to prevent LTO from stripping inventory entries
#[used]
#[doc(hidden)]
pub static REGISTRY_ANCHOR: fn() = || for _ in inventory::iter::<SnippetDef> {};
