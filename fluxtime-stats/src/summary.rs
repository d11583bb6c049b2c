//! Summary Statistics
//!
//! Mean and sample standard deviation over timing samples.
//!
//! The standard deviation takes a second pass over the deviations from the
//! computed mean and removes any residual bias, which keeps the result stable
//! when the floating point mean is not exact.

use crate::MIN_STDEV_SAMPLES;
use thiserror::Error;

/// Errors raised by statistics and result operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("mean requires at least one data point")]
    EmptyData,

    #[error("stdev requires at least {required} data points, got {got}")]
    InsufficientData { required: usize, got: usize },

    #[error("invalid sample {0}: samples must be finite and non-negative")]
    InvalidSample(f64),

    #[error("metadata keys and values must be non-empty (key {key:?})")]
    EmptyMetadata { key: String },
}

/// Arithmetic mean of `data`
pub fn mean(data: &[f64]) -> Result<f64, StatsError> {
    if data.is_empty() {
        return Err(StatsError::EmptyData);
    }
    Ok(data.iter().sum::<f64>() / data.len() as f64)
}

/// Sample standard deviation of `data` (divides by n - 1)
pub fn stdev(data: &[f64]) -> Result<f64, StatsError> {
    let n = data.len();
    if n < MIN_STDEV_SAMPLES {
        return Err(StatsError::InsufficientData {
            required: MIN_STDEV_SAMPLES,
            got: n,
        });
    }

    let c = mean(data)?;
    let (total, total2) = data.iter().fold((0.0, 0.0), |(squares, deviations), &x| {
        let d = x - c;
        (squares + d * d, deviations + d)
    });

    let ss = total - total2 * total2 / n as f64;
    // Rounding can leave a tiny negative sum for constant data
    let variance = ss.max(0.0) / (n - 1) as f64;

    Ok(variance.sqrt())
}
