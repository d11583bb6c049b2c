//! Run Orchestration
//!
//! ```text
//! settings ──► calibrate (unless -n) ──► worker 1..=processes ──► merge ──► report
//! ```
//!
//! Workers run strictly one after the other. Their results are merged in
//! launch order into an accumulator seeded with the run's provenance
//! metadata (`processes`, `runs`, `loops`).

use crate::worker::{Worker, WorkerError};
use fluxtime_core::{Clock, Timer, TimingError};
use fluxtime_report::{OutputFormat, TimingResult, generate_json_report};
use fluxtime_stats::StatsError;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use thiserror::Error;
use tracing::debug;

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Timing(#[from] TimingError),

    #[error("calibration failed: {0}")]
    Calibration(#[source] TimingError),

    #[error("worker {index}/{total} failed: {source}")]
    Worker {
        index: usize,
        total: usize,
        #[source]
        source: WorkerError,
    },

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode JSON report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Resolved run parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Number of workers
    pub processes: usize,
    /// Timed batches per worker
    pub repeat: usize,
    /// Loops per batch; `None` (or zero) calibrates
    pub loops: Option<u64>,
    /// Print every worker's result as it arrives
    pub verbose: bool,
    /// Draw a progress bar over the fan-out
    pub progress: bool,
    /// Name given to the aggregated result
    pub name: Option<String>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            processes: 3,
            repeat: 3,
            loops: None,
            verbose: false,
            progress: false,
            name: None,
        }
    }
}

/// Aggregated outcome of a run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Every sample of every worker, in launch order
    pub result: TimingResult,
    /// Number of workers that ran
    pub processes: usize,
    /// Batches per worker
    pub repeat: usize,
    /// Loops per batch
    pub loops: u64,
}

impl RunOutcome {
    /// The one-line human summary
    pub fn summary_line(&self) -> String {
        format!(
            "Average on {} process x {} runs ({} loops): {}",
            self.processes, self.repeat, self.loops, self.result
        )
    }

    /// Render in the requested format
    pub fn render(&self, format: OutputFormat) -> Result<String, RunError> {
        match format {
            OutputFormat::Human => Ok(self.summary_line()),
            OutputFormat::Json => Ok(generate_json_report(&self.result)?),
        }
    }
}

/// Drives calibration, the worker fan-out and aggregation
#[derive(Debug, Clone)]
pub struct Orchestrator {
    settings: RunSettings,
}

impl Orchestrator {
    /// Create an orchestrator; `processes` and `repeat` are raised to at least 1
    pub fn new(mut settings: RunSettings) -> Self {
        settings.processes = settings.processes.max(1);
        settings.repeat = settings.repeat.max(1);
        Self { settings }
    }

    /// Settings in effect
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Loop count for this run: the explicit one, or calibrated with `timer`
    pub fn resolve_loops<C: Clock>(&self, timer: &Timer<C>) -> Result<u64, RunError> {
        match self.settings.loops.filter(|&loops| loops > 0) {
            Some(loops) => Ok(loops),
            None => {
                let loops = timer.calibrate().map_err(RunError::Calibration)?;
                debug!(loops, "calibrated loop count");
                Ok(loops)
            }
        }
    }

    /// Run the whole pipeline.
    ///
    /// `timer` is only used for calibration. In verbose mode each worker's
    /// result is written to `out` as `[i/n] <result>` before aggregation.
    pub fn run<C, W, O>(
        &self,
        timer: &Timer<C>,
        worker: &mut W,
        out: &mut O,
    ) -> Result<RunOutcome, RunError>
    where
        C: Clock,
        W: Worker + ?Sized,
        O: Write + ?Sized,
    {
        let loops = self.resolve_loops(timer)?;
        let RunSettings {
            processes, repeat, ..
        } = self.settings;

        let mut total = TimingResult::with_metadata([
            ("processes", processes.to_string()),
            ("runs", repeat.to_string()),
            ("loops", loops.to_string()),
        ])?;
        if let Some(name) = &self.settings.name {
            total.set_name(name.as_str());
        }

        let pb = self.progress_bar(processes as u64);
        for index in 1..=processes {
            pb.set_message(format!("worker {}", index));
            let result = match worker.run(repeat, loops) {
                Ok(result) => result,
                Err(source) => {
                    pb.abandon();
                    return Err(RunError::Worker {
                        index,
                        total: processes,
                        source,
                    });
                }
            };
            debug!(index, samples = result.len(), "worker finished");

            if self.settings.verbose {
                writeln!(out, "[{}/{}] {}", index, processes, result)?;
            }
            total.merge(&result);
            pb.inc(1);
        }
        pb.finish_and_clear();

        Ok(RunOutcome {
            result: total,
            processes,
            repeat,
            loops,
        })
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.settings.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxtime_core::Statement;
    use std::cell::Cell;
    use std::collections::VecDeque;

    /// Replays canned worker outcomes
    struct ScriptedWorker {
        outcomes: VecDeque<Result<Vec<f64>, WorkerError>>,
        calls: Vec<(usize, u64)>,
    }

    impl ScriptedWorker {
        fn new(outcomes: Vec<Result<Vec<f64>, WorkerError>>) -> Self {
            Self {
                outcomes: outcomes.into(),
                calls: Vec::new(),
            }
        }
    }

    impl Worker for ScriptedWorker {
        fn run(&mut self, repeat: usize, loops: u64) -> Result<TimingResult, WorkerError> {
            self.calls.push((repeat, loops));
            let values = self.outcomes.pop_front().ok_or(WorkerError::NoSamples)??;
            Ok(TimingResult::from_values(values)?)
        }
    }

    struct StepClock(Cell<f64>);

    impl Clock for StepClock {
        fn now(&self) -> f64 {
            let t = self.0.get();
            self.0.set(t + 0.3);
            t
        }
    }

    fn timer() -> Timer<StepClock> {
        Timer::with_clock(
            Statement::pass(),
            Statement::pass(),
            StepClock(Cell::new(0.0)),
        )
    }

    fn settings(loops: Option<u64>) -> RunSettings {
        RunSettings {
            processes: 3,
            repeat: 2,
            loops,
            ..RunSettings::default()
        }
    }

    #[test]
    fn test_end_to_end_aggregation() {
        let mut worker = ScriptedWorker::new(vec![
            Ok(vec![0.001, 0.002]),
            Ok(vec![0.0015]),
            Ok(vec![0.002, 0.002]),
        ]);
        let mut out = Vec::new();
        let outcome = Orchestrator::new(settings(Some(1000)))
            .run(&timer(), &mut worker, &mut out)
            .unwrap();

        assert_eq!(
            outcome.result.values(),
            &[0.001, 0.002, 0.0015, 0.002, 0.002]
        );
        let expected = (0.001 + 0.002 + 0.0015 + 0.002 + 0.002) / 5.0;
        assert!((outcome.result.mean().unwrap() - expected).abs() < 1e-15);
        assert_eq!(worker.calls, vec![(2, 1000); 3]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_metadata_seeded() {
        let mut worker = ScriptedWorker::new(vec![Ok(vec![0.1]), Ok(vec![0.1]), Ok(vec![0.1])]);
        let outcome = Orchestrator::new(settings(Some(50)))
            .run(&timer(), &mut worker, &mut Vec::new())
            .unwrap();

        let metadata = outcome.result.metadata();
        assert_eq!(metadata["processes"], "3");
        assert_eq!(metadata["runs"], "2");
        assert_eq!(metadata["loops"], "50");
        assert_eq!(
            outcome.summary_line(),
            "Average on 3 process x 2 runs (50 loops): 100 ms +- 0 ms"
        );
    }

    #[test]
    fn test_calibrates_without_explicit_loops() {
        let mut worker = ScriptedWorker::new(vec![Ok(vec![0.03]), Ok(vec![0.03]), Ok(vec![0.03])]);
        let outcome = Orchestrator::new(settings(None))
            .run(&timer(), &mut worker, &mut Vec::new())
            .unwrap();

        // Every batch takes 0.3 s on the step clock, so the first attempt is enough
        assert_eq!(outcome.loops, 10);
        assert_eq!(worker.calls[0], (2, 10));
    }

    #[test]
    fn test_zero_loops_means_calibrate() {
        let orchestrator = Orchestrator::new(settings(Some(0)));
        assert_eq!(orchestrator.resolve_loops(&timer()).unwrap(), 10);
    }

    #[test]
    fn test_verbose_lines() {
        let mut worker = ScriptedWorker::new(vec![Ok(vec![0.001, 0.002]), Ok(vec![0.0015])]);
        let mut out = Vec::new();
        let settings = RunSettings {
            processes: 2,
            repeat: 2,
            loops: Some(1000),
            verbose: true,
            ..RunSettings::default()
        };
        Orchestrator::new(settings)
            .run(&timer(), &mut worker, &mut out)
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "[1/2] 1.50 ms +- 0.71 ms\n[2/2] 1.50 ms\n");
    }

    #[test]
    fn test_worker_failure_names_index() {
        let mut worker = ScriptedWorker::new(vec![
            Ok(vec![0.001]),
            Err(WorkerError::Parse {
                line_no: 2,
                line: "hello".to_string(),
            }),
            Ok(vec![0.001]),
        ]);
        let err = Orchestrator::new(settings(Some(10)))
            .run(&timer(), &mut worker, &mut Vec::new())
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "worker 2/3 failed: line 2: expected a sample, got \"hello\""
        );
        assert_eq!(worker.calls.len(), 2);
    }

    #[test]
    fn test_named_result() {
        let mut worker = ScriptedWorker::new(vec![Ok(vec![2e-6])]);
        let settings = RunSettings {
            processes: 1,
            repeat: 1,
            loops: Some(100),
            name: Some("sort".to_string()),
            ..RunSettings::default()
        };
        let outcome = Orchestrator::new(settings)
            .run(&timer(), &mut worker, &mut Vec::new())
            .unwrap();
        assert_eq!(
            outcome.summary_line(),
            "Average on 1 process x 1 runs (100 loops): sort: 2.00 us"
        );
    }

    #[test]
    fn test_json_render() {
        let mut worker = ScriptedWorker::new(vec![Ok(vec![0.5])]);
        let settings = RunSettings {
            processes: 1,
            repeat: 1,
            loops: Some(1),
            ..RunSettings::default()
        };
        let outcome = Orchestrator::new(settings)
            .run(&timer(), &mut worker, &mut Vec::new())
            .unwrap();

        let json = outcome.render(OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["values"][0], 0.5);
        assert!(value["stdev"].is_null());
        assert_eq!(value["metadata"]["loops"], "1");
    }

    #[test]
    fn test_settings_coerced() {
        let orchestrator = Orchestrator::new(RunSettings {
            processes: 0,
            repeat: 0,
            ..RunSettings::default()
        });
        assert_eq!(orchestrator.settings().processes, 1);
        assert_eq!(orchestrator.settings().repeat, 1);
    }
}
