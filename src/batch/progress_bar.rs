//! Progress reporting for a running batch.
//!
//! Components
//! -----------------
//! * [`BatchProgress`] – Counts finished targets across workers and, with the
//!   `progress` feature, drives an `indicatif` bar whose message shows the mean
//!   wall-clock time per finished target.
//!
//! * [`fmt_dur`] – Human-readable formatter for [`Duration`] values,
//!   producing strings like `"253µs"`, `"42ms"`, or `"3.14s"` depending
//!   on the scale.
//!
//! Without the `progress` feature, [`BatchProgress`] only logs at `debug` level.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Shared, thread-safe progress counter of one batch.
pub struct BatchProgress {
    start: Instant,
    total: usize,
    done: AtomicUsize,
    #[cfg(feature = "progress")]
    bar: ProgressBar,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        #[cfg(feature = "progress")]
        let bar = {
            let bar = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} targets ({msg})",
            ) {
                bar.set_style(style.progress_chars("=>-"));
            }
            bar
        };

        Self {
            start: Instant::now(),
            total,
            done: AtomicUsize::new(0),
            #[cfg(feature = "progress")]
            bar,
        }
    }

    /// Record one finished target; `spent` is the time its adapter took.
    pub fn tick(&self, target: &str, spent: Duration) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        log::debug!(
            "[{done}/{}] {target} done in {}",
            self.total,
            fmt_dur(spent)
        );

        #[cfg(feature = "progress")]
        {
            self.bar.inc(1);
            self.bar
                .set_message(format!("{} / target", fmt_dur(self.mean_wall_time())));
        }
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    /// Wall-clock time elapsed per finished target so far.
    pub fn mean_wall_time(&self) -> Duration {
        match self.done() {
            0 => Duration::ZERO,
            n => self.start.elapsed() / n as u32,
        }
    }

    pub fn finish(&self) {
        #[cfg(feature = "progress")]
        self.bar.finish_and_clear();
    }
}

#[inline]
pub fn fmt_dur(d: Duration) -> String {
    let us = d.as_micros();
    if us < 1_000 {
        format!("{us}µs")
    } else {
        let ms = d.as_millis();
        if ms < 1_000 {
            format!("{ms}ms")
        } else {
            let s = d.as_secs_f32();
            format!("{s:.2}s")
        }
    }
}
