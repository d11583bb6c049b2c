#![warn(missing_docs)]
//! fluxtime Report - Formatting and Output
//!
//! Turns benchmark results into text:
//! - Human-readable durations with an auto-selected unit and precision
//! - `TimingResult`, a `BenchResult` rendered with time units
//! - JSON (machine-readable)

mod format;
mod json;

pub use format::{TimingFormat, TimingResult, UNIT_TIERS, UnitTier, format_duration};
pub use json::{RunReport, generate_json_report};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One human-readable summary line
    #[default]
    Human,
    /// JSON document describing the aggregated result
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
