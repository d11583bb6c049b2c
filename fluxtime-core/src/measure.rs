//! Clocks
//!
//! The timer reads time through the `Clock` trait so that tests can drive it
//! with a scripted clock. The process-wide default is monotonic and anchored
//! on first use.

use std::sync::OnceLock;
use std::time::Instant;

/// Source of monotonic time in seconds
pub trait Clock {
    /// Seconds since an arbitrary, fixed origin
    fn now(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline(always)]
    fn now(&self) -> f64 {
        (**self).now()
    }
}

static ORIGIN: OnceLock<Instant> = OnceLock::new();

/// Monotonic clock backed by `std::time::Instant`
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl MonotonicClock {
    /// Resolve the clock, fixing its origin for the rest of the process
    pub fn new() -> Self {
        ORIGIN.get_or_init(Instant::now);
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline(always)]
    fn now(&self) -> f64 {
        ORIGIN.get_or_init(Instant::now).elapsed().as_secs_f64()
    }
}
