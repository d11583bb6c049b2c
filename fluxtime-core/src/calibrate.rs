//! Loop Count Calibration
//!
//! Finds the smallest power of ten whose timed batch takes at least
//! `MIN_CALIBRATION_TIME`, so the measurement is dominated by the snippet
//! rather than by clock and loop overhead.

use tracing::{debug, warn};

/// Minimum duration of one calibration batch, in seconds
pub const MIN_CALIBRATION_TIME: f64 = 0.2;

/// Largest exponent tried (10^9 loops)
pub const MAX_CALIBRATION_EXPONENT: u32 = 9;

/// Pick a loop count by timing batches of 10, 100, ... 10^9 iterations.
///
/// `measure_batch(n)` must run the workload `n` times and return the elapsed
/// seconds. Calibration stops at the first batch reaching
/// [`MIN_CALIBRATION_TIME`]. If none does, 10^9 is returned. Errors from
/// `measure_batch` abort calibration and are returned unchanged.
pub fn calibrate<F, E>(mut measure_batch: F) -> Result<u64, E>
where
    F: FnMut(u64) -> Result<f64, E>,
{
    let mut loops = 1;
    for exponent in 1..=MAX_CALIBRATION_EXPONENT {
        loops = 10u64.pow(exponent);
        let elapsed = measure_batch(loops)?;
        debug!(loops, elapsed, "calibration batch");
        if elapsed >= MIN_CALIBRATION_TIME {
            return Ok(loops);
        }
    }

    warn!(
        loops,
        "calibration never reached {MIN_CALIBRATION_TIME}s, using the largest batch"
    );
    Ok(loops)
}
