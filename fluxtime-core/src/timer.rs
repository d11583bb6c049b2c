//! Timer - Batch Timing of Statements
//!
//! `Timer::timeit(n)` runs the setup statement once, then times `n`
//! executions of the statement. Panics raised by snippets are caught and
//! turned into `TimingError::Panicked` naming the offending snippet.

use crate::calibrate::calibrate;
use crate::measure::{Clock, MonotonicClock};
use crate::snippet::{PASS, Statement};
use std::any::Any;
use std::hint::black_box;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// Errors raised while resolving or timing snippets
#[derive(Debug, Error)]
pub enum TimingError {
    #[error("snippet `{snippet}` panicked: {message}")]
    Panicked { snippet: String, message: String },

    #[error("unknown snippet `{name}` (registered: {})", .available.join(", "))]
    UnknownSnippet {
        name: String,
        available: Vec<String>,
    },

    #[error("loop count must be at least 1")]
    ZeroLoops,

    #[error("failed to emit sample: {0}")]
    Io(#[from] std::io::Error),
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Run every snippet of `statement`, `loops` times, catching panics
fn run_guarded(statement: &Statement, loops: u64) -> Result<(), TimingError> {
    let snippets = statement.snippets();
    let mut current = 0;

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        if let [snippet] = snippets {
            let func = snippet.func;
            for _ in 0..loops {
                black_box(func)();
            }
        } else {
            for _ in 0..loops {
                for (index, snippet) in snippets.iter().enumerate() {
                    current = index;
                    black_box(snippet.func)();
                }
            }
        }
    }));

    outcome.map_err(|payload| TimingError::Panicked {
        snippet: snippets
            .get(current)
            .map_or(PASS, |snippet| snippet.name)
            .to_string(),
        message: panic_message(payload.as_ref()),
    })
}

/// Times batches of a statement after running its setup
#[derive(Debug, Clone)]
pub struct Timer<C = MonotonicClock> {
    stmt: Statement,
    setup: Statement,
    clock: C,
}

impl Timer<MonotonicClock> {
    /// Create a timer reading the process-wide monotonic clock
    pub fn new(stmt: Statement, setup: Statement) -> Self {
        Self::with_clock(stmt, setup, MonotonicClock::new())
    }
}

impl<C: Clock> Timer<C> {
    /// Create a timer reading `clock`
    pub fn with_clock(stmt: Statement, setup: Statement, clock: C) -> Self {
        Self { stmt, setup, clock }
    }

    /// Run setup once, then return the seconds taken by `loops` executions
    /// of the statement.
    pub fn timeit(&self, loops: u64) -> Result<f64, TimingError> {
        if loops == 0 {
            return Err(TimingError::ZeroLoops);
        }

        run_guarded(&self.setup, 1)?;

        let start = self.clock.now();
        let outcome = run_guarded(&self.stmt, loops);
        let end = self.clock.now();
        outcome?;

        Ok((end - start).max(0.0))
    }

    /// Time `repeat` batches of `loops` executions.
    ///
    /// Each returned sample is the batch time divided by `loops`.
    pub fn repeat(&self, repeat: usize, loops: u64) -> Result<Vec<f64>, TimingError> {
        (0..repeat)
            .map(|_| self.timeit(loops).map(|elapsed| elapsed / loops as f64))
            .collect()
    }

    /// Choose a loop count for this statement, see [`calibrate`]
    pub fn calibrate(&self) -> Result<u64, TimingError> {
        calibrate(|loops| self.timeit(loops))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snippet::Snippet;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Clock that advances by a fixed step on every read
    struct StepClock {
        now: Cell<f64>,
        step: f64,
    }

    impl StepClock {
        fn new(step: f64) -> Self {
            Self {
                now: Cell::new(0.0),
                step,
            }
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> f64 {
            let t = self.now.get();
            self.now.set(t + self.step);
            t
        }
    }

    static SETUP_RUNS: AtomicU64 = AtomicU64::new(0);
    static STMT_RUNS: AtomicU64 = AtomicU64::new(0);

    fn count_setup() {
        SETUP_RUNS.fetch_add(1, Ordering::Relaxed);
    }

    fn count_stmt() {
        STMT_RUNS.fetch_add(1, Ordering::Relaxed);
    }

    fn boom() {
        panic!("boom");
    }

    fn single(name: &'static str, func: fn()) -> Statement {
        Statement::new(vec![Snippet { name, func }])
    }

    #[test]
    fn test_timeit_runs_setup_once_and_stmt_n_times() {
        let timer = Timer::with_clock(
            single("count_stmt", count_stmt),
            single("count_setup", count_setup),
            StepClock::new(0.25),
        );

        let elapsed = timer.timeit(1_000).unwrap();
        assert_eq!(elapsed, 0.25);
        assert_eq!(SETUP_RUNS.load(Ordering::Relaxed), 1);
        assert_eq!(STMT_RUNS.load(Ordering::Relaxed), 1_000);
    }

    #[test]
    fn test_repeat_divides_by_loops() {
        let timer = Timer::with_clock(Statement::pass(), Statement::pass(), StepClock::new(0.5));
        let samples = timer.repeat(3, 1_000).unwrap();
        assert_eq!(samples, vec![0.0005; 3]);
    }

    #[test]
    fn test_zero_loops_rejected() {
        let timer = Timer::with_clock(Statement::pass(), Statement::pass(), StepClock::new(1.0));
        assert!(matches!(timer.timeit(0), Err(TimingError::ZeroLoops)));
    }

    #[test]
    fn test_calibrate_with_slow_clock_stops_early() {
        let timer = Timer::with_clock(Statement::pass(), Statement::pass(), StepClock::new(0.3));
        assert_eq!(timer.calibrate().unwrap(), 10);
    }

    #[test]
    fn test_panicking_statement_is_reported() {
        let stmt = Statement::new(vec![Snippet::pass(), Snippet { name: "boom", func: boom }]);
        let timer = Timer::with_clock(stmt, Statement::pass(), StepClock::new(1.0));

        match timer.timeit(10) {
            Err(TimingError::Panicked { snippet, message }) => {
                assert_eq!(snippet, "boom");
                assert_eq!(message, "boom");
            }
            other => panic!("expected a panic error, got {other:?}"),
        }
    }

    #[test]
    fn test_panicking_setup_aborts_calibration() {
        let timer = Timer::with_clock(Statement::pass(), single("boom", boom), StepClock::new(1.0));
        assert!(matches!(
            timer.calibrate(),
            Err(TimingError::Panicked { .. })
        ));
    }

    #[test]
    fn test_real_clock_measures_something() {
        let timer = Timer::new(Statement::pass(), Statement::pass());
        let elapsed = timer.timeit(1_000).unwrap();
        assert!(elapsed >= 0.0);
        assert!(elapsed < 1.0);
    }
}
