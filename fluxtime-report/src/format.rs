//! Duration Formatting
//!
//! Picks a unit (sec, ms, us, ns) and a precision for a duration by scanning
//! a table ordered from the largest threshold to the smallest. Each unit has
//! three tiers: at least 100 units prints no decimals, at least 10 units one
//! decimal, at least 1 unit two decimals.

use fluxtime_stats::{BenchResult, SampleFormat};

/// One row of the unit table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitTier {
    /// Smallest duration in seconds rendered with this row
    pub min_seconds: f64,
    /// Multiplier from seconds to `unit`
    pub factor: f64,
    /// Unit suffix
    pub unit: &'static str,
    /// Decimal digits
    pub precision: usize,
}

const fn tier(min_seconds: f64, factor: f64, unit: &'static str, precision: usize) -> UnitTier {
    UnitTier {
        min_seconds,
        factor,
        unit,
        precision,
    }
}

/// Unit table, largest threshold first. The last row doubles as the
/// fallback for durations below one nanosecond.
pub const UNIT_TIERS: [UnitTier; 12] = [
    tier(100.0, 1.0, "sec", 0),
    tier(10.0, 1.0, "sec", 1),
    tier(1.0, 1.0, "sec", 2),
    tier(100e-3, 1e3, "ms", 0),
    tier(10e-3, 1e3, "ms", 1),
    tier(1e-3, 1e3, "ms", 2),
    tier(100e-6, 1e6, "us", 0),
    tier(10e-6, 1e6, "us", 1),
    tier(1e-6, 1e6, "us", 2),
    tier(100e-9, 1e9, "ns", 0),
    tier(10e-9, 1e9, "ns", 1),
    tier(1e-9, 1e9, "ns", 2),
];

impl UnitTier {
    /// Select the row for a duration in seconds
    pub fn select(seconds: f64) -> &'static UnitTier {
        UNIT_TIERS
            .iter()
            .find(|tier| seconds >= tier.min_seconds)
            .unwrap_or(&UNIT_TIERS[UNIT_TIERS.len() - 1])
    }

    fn render(&self, seconds: f64) -> String {
        format!("{:.*} {}", self.precision, seconds * self.factor, self.unit)
    }
}

/// Format a mean duration, with its standard deviation when given.
///
/// The row is chosen from the mean alone; the standard deviation is printed
/// in the same unit and precision.
///
/// ```
/// use fluxtime_report::format_duration;
///
/// assert_eq!(format_duration(0.015, None), "15.0 ms");
/// assert_eq!(format_duration(1.5e-6, Some(2e-8)), "1.50 us +- 0.02 us");
/// ```
pub fn format_duration(seconds: f64, stdev: Option<f64>) -> String {
    let tier = UnitTier::select(seconds);
    match stdev {
        Some(stdev) => format!("{} +- {}", tier.render(seconds), tier.render(stdev)),
        None => tier.render(seconds),
    }
}

/// Renders samples as durations in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingFormat;

impl SampleFormat for TimingFormat {
    fn format(mean: f64, stdev: Option<f64>) -> String {
        format_duration(mean, stdev)
    }
}

/// A result whose samples are durations in seconds
pub type TimingResult = BenchResult<TimingFormat>;
