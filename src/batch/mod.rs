//! # Parallel batch runner
//!
//! Runs one adapter over a list of targets on a fixed-size pool of workers and
//! returns one outcome per target, **in input order**, regardless of which worker
//! finished first.
//!
//! Guarantees
//! -----------------
//! * **Order**: the i-th outcome belongs to the i-th target. Outcomes are written
//!   into an index-addressed buffer (rayon's indexed `collect`), so completion
//!   order never leaks into the output.
//! * **Fault isolation**: each adapter call runs under [`std::panic::catch_unwind`].
//!   A target that fails, in any way, yields its adapter's failure value
//!   ([`AdapterKind::failure_result`]) and never aborts its siblings.
//! * **Timing**: the elapsed wall-clock time is returned as a [`BatchTiming`]
//!   (logged at `debug` level; callers print it).
//!
//! The worker pool is created per batch and torn down when the call returns.
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use rayon::prelude::*;

use crate::adapters::{AdapterConfig, AdapterKind, Pipeline, TargetFailure, TargetOutcome};
use crate::batch_errors::BatchError;
use crate::eclipse_result::EclipseResult;
use crate::target::Target;

pub mod progress_bar;
pub mod timing;

use progress_bar::BatchProgress;
pub use timing::BatchTiming;

/// Workers kept free for the rest of the host when sizing the default pool.
const RESERVED_CORES: usize = 2;

/// Number of concurrent workers of a batch, always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerCount(usize);

impl WorkerCount {
    pub fn new(n: usize) -> Result<Self, BatchError> {
        if n == 0 {
            return Err(BatchError::InvalidWorkerCount(n));
        }
        Ok(WorkerCount(n))
    }

    /// Host cores minus two, floored at 1.
    pub fn host_default() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        WorkerCount(cores.saturating_sub(RESERVED_CORES).max(1))
    }

    /// `Some(n)` is validated, `None` falls back to [`WorkerCount::host_default`].
    pub fn from_option(n: Option<usize>) -> Result<Self, BatchError> {
        n.map_or_else(|| Ok(Self::host_default()), Self::new)
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        Self::host_default()
    }
}

/// Outcomes of a batch, aligned with its targets, and its timing.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub outcomes: Vec<TargetOutcome>,
    pub timing: BatchTiming,
}

impl BatchOutcome {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Per-target results, `None` where the adapter produced nothing.
    pub fn results(&self) -> impl Iterator<Item = Option<&EclipseResult>> + '_ {
        self.outcomes.iter().map(|o| o.result.as_ref())
    }

    pub fn n_succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn n_failed(&self) -> usize {
        self.len() - self.n_succeeded()
    }

    /// Pair each outcome with the target it was computed for.
    pub fn paired<'a>(
        &'a self,
        targets: &'a [Target],
    ) -> impl Iterator<Item = (&'a Target, &'a TargetOutcome)> + 'a {
        targets.iter().zip(self.outcomes.iter())
    }

    /// Drop the diagnostics and keep the externally visible results.
    pub fn into_results(self) -> Vec<Option<EclipseResult>> {
        self.outcomes.into_iter().map(|o| o.result).collect()
    }
}

/// Reusable batch configuration: an adapter, its pool size and its collaborators.
#[derive(Debug)]
pub struct BatchRunner {
    adapter: AdapterKind,
    workers: WorkerCount,
    config: AdapterConfig,
    pipeline: Pipeline,
}

impl BatchRunner {
    pub fn new(adapter: AdapterKind) -> Self {
        BatchRunner {
            adapter,
            workers: WorkerCount::default(),
            config: AdapterConfig::default(),
            pipeline: Pipeline::default(),
        }
    }

    pub fn workers(mut self, workers: WorkerCount) -> Self {
        self.workers = workers;
        self
    }

    pub fn config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn adapter(&self) -> AdapterKind {
        self.adapter
    }

    pub fn worker_count(&self) -> WorkerCount {
        self.workers
    }

    /// Run the adapter over `targets`.
    ///
    /// Errors
    /// ----------
    /// * [`BatchError::ThreadPool`] if the worker pool cannot be created. Per-target
    ///   failures are never returned here: they live in the outcomes.
    pub fn run(&self, targets: &[Target]) -> Result<BatchOutcome, BatchError> {
        let workers = self.workers.get();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("eclipse-worker-{i}"))
            .build()?;

        log::info!(
            "analysing {} targets with adapter {} on {workers} workers",
            targets.len(),
            self.adapter
        );

        let progress = BatchProgress::new(targets.len());
        let start = Instant::now();
        let outcomes: Vec<TargetOutcome> = pool.install(|| {
            targets
                .par_iter()
                .map(|target| {
                    let t0 = Instant::now();
                    let outcome = run_isolated(self.adapter, target, &self.config, &self.pipeline);
                    progress.tick(&target.identity(), t0.elapsed());
                    outcome
                })
                .collect()
        });
        let timing = BatchTiming::new(start.elapsed(), workers, targets.len());
        progress.finish();

        log::debug!("{timing}");
        Ok(BatchOutcome { outcomes, timing })
    }
}

/// Run `adapter_name` over `targets` with the default collaborators.
///
/// Arguments
/// -----------------
/// * `targets` – File paths or catalog identifiers, depending on the adapter.
/// * `adapter_name` – One of [`AdapterKind::names`].
/// * `workers` – Pool size; `None` uses the host default.
/// * `config` – Forwarded to every adapter invocation.
///
/// Errors
/// ----------
/// * [`BatchError::UnknownAdapter`] and [`BatchError::InvalidWorkerCount`] before
///   any target is processed.
pub fn analyse_set(
    targets: &[Target],
    adapter_name: &str,
    workers: Option<usize>,
    config: AdapterConfig,
) -> Result<BatchOutcome, BatchError> {
    let adapter: AdapterKind = adapter_name.parse()?;
    BatchRunner::new(adapter)
        .workers(WorkerCount::from_option(workers)?)
        .config(config)
        .run(targets)
}

fn run_isolated(
    adapter: AdapterKind,
    target: &Target,
    config: &AdapterConfig,
    pipeline: &Pipeline,
) -> TargetOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| adapter.run(target, config, pipeline))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            log::error!("adapter {adapter} panicked on {target}: {message}");
            TargetOutcome::failed(adapter.failure_result(), TargetFailure::Panic(message))
        }
    }
}
