//! Wall-clock summary of a batch run.
use std::fmt;
use std::time::Duration;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Elapsed time, worker count and target count of one batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchTiming {
    pub elapsed: Duration,
    pub workers: usize,
    pub targets: usize,
}

impl BatchTiming {
    pub fn new(elapsed: Duration, workers: usize, targets: usize) -> Self {
        BatchTiming {
            elapsed,
            workers,
            targets,
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn elapsed_hours(&self) -> f64 {
        self.elapsed_secs() / SECONDS_PER_HOUR
    }

    /// Estimated cost of one target on a single worker:
    /// `elapsed × workers / targets`.
    ///
    /// Return
    /// ----------
    /// * `None` for an empty batch.
    pub fn avg_single_threaded_secs(&self) -> Option<f64> {
        (self.targets > 0)
            .then(|| self.elapsed_secs() * self.workers as f64 / self.targets as f64)
    }
}

impl fmt::Display for BatchTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Finished analysing set in: {:.2} s ({:.4} h) for {} targets,",
            self.elapsed_secs(),
            self.elapsed_hours(),
            self.targets
        )?;
        match self.avg_single_threaded_secs() {
            Some(avg) => write!(
                f,
                "using {} threads ({avg:.2} s average per target single threaded).",
                self.workers
            ),
            None => write!(
                f,
                "using {} threads (average per target unavailable).",
                self.workers
            ),
        }
    }
}
