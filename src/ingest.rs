//! # Signal ingestion
//!
//! Turn raw `(times, signal[, quality])` arrays into analysis-ready series.
//!
//! The [`SignalIngestor`] trait is the seam used by every adapter; the crate ships
//! [`StandardIngestor`] as the default policy:
//!
//! 1. keep only samples with a `true` quality mask entry (when a mask is given),
//! 2. drop samples with a non-finite time or flux,
//! 3. sort by time and drop repeated timestamps (first occurrence wins),
//! 4. normalise the flux to a median of 1, either globally or, when the
//!    **multi-segment** flag is set, per acquisition segment (segments are split
//!    at time gaps larger than [`StandardIngestor::segment_gap`]).
//!
//! The output may be shorter than the input but both arrays always share a length.
use itertools::Itertools;

use crate::batch_errors::BatchError;
use crate::constants::{CleanSeries, Days, Flux};

/// Raw arrays read from a data source, before ingestion.
///
/// Invariant: `times`, `signal` and `quality` (when present) have the same length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSeries {
    times: Vec<Days>,
    signal: Vec<Flux>,
    quality: Option<Vec<bool>>,
}

impl RawSeries {
    /// Build a series without quality information.
    pub fn new(times: Vec<Days>, signal: Vec<Flux>) -> Result<Self, BatchError> {
        Self::with_quality(times, signal, None)
    }

    /// Build a series with an optional keep-mask (`true` = keep).
    pub fn with_quality(
        times: Vec<Days>,
        signal: Vec<Flux>,
        quality: Option<Vec<bool>>,
    ) -> Result<Self, BatchError> {
        let q_len = quality.as_ref().map_or(times.len(), Vec::len);
        if times.len() != signal.len() || q_len != times.len() {
            return Err(BatchError::LengthMismatch {
                times: times.len(),
                signal: signal.len(),
                quality: q_len,
            });
        }
        Ok(RawSeries {
            times,
            signal,
            quality,
        })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[Days] {
        &self.times
    }

    pub fn signal(&self) -> &[Flux] {
        &self.signal
    }

    pub fn quality(&self) -> Option<&[bool]> {
        self.quality.as_deref()
    }

    /// Add a constant to every signal value.
    pub fn offset_signal(mut self, offset: f64) -> Self {
        self.signal.iter_mut().for_each(|s| *s += offset);
        self
    }

    pub fn into_parts(self) -> (Vec<Days>, Vec<Flux>, Option<Vec<bool>>) {
        (self.times, self.signal, self.quality)
    }
}

/// Normalise raw arrays into detector input.
pub trait SignalIngestor: Send + Sync {
    /// Clean `raw` into `(times, signal)` of equal length.
    ///
    /// Arguments
    /// -----------------
    /// * `raw`: The raw series, consumed.
    /// * `multi_segment`: The series may mix several acquisition windows.
    ///
    /// Return
    /// ----------
    /// * The cleaned arrays, or an ingestion error.
    fn ingest(&self, raw: RawSeries, multi_segment: bool) -> Result<CleanSeries, BatchError>;
}

/// Default ingestion policy, see the module documentation.
#[derive(Debug, Clone)]
pub struct StandardIngestor {
    /// Gap (days) separating two acquisition segments.
    pub segment_gap: Days,
}

impl Default for StandardIngestor {
    fn default() -> Self {
        StandardIngestor { segment_gap: 0.5 }
    }
}

impl StandardIngestor {
    pub fn new(segment_gap: Days) -> Self {
        StandardIngestor { segment_gap }
    }

    /// Segment boundaries as half-open index ranges over sorted times.
    fn segments(&self, times: &[Days], multi_segment: bool) -> Vec<(usize, usize)> {
        if times.is_empty() {
            return Vec::new();
        }
        if !multi_segment {
            return vec![(0, times.len())];
        }
        let mut bounds = vec![0];
        bounds.extend(
            times
                .iter()
                .tuple_windows()
                .positions(|(a, b)| b - a > self.segment_gap)
                .map(|i| i + 1),
        );
        bounds.push(times.len());
        bounds.into_iter().tuple_windows().collect()
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    let n = sorted.len();
    Some(if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    })
}

impl SignalIngestor for StandardIngestor {
    fn ingest(&self, raw: RawSeries, multi_segment: bool) -> Result<CleanSeries, BatchError> {
        let (times, signal, quality) = raw.into_parts();

        let kept: Vec<(Days, Flux)> = times
            .into_iter()
            .zip(signal)
            .enumerate()
            .filter(|(i, _)| quality.as_ref().map_or(true, |q| q[*i]))
            .map(|(_, pair)| pair)
            .filter(|(t, s)| t.is_finite() && s.is_finite())
            .sorted_by(|a, b| a.0.total_cmp(&b.0))
            .dedup_by(|a, b| a.0 == b.0)
            .collect();

        let (times, mut signal): (Vec<Days>, Vec<Flux>) = kept.into_iter().unzip();

        for (start, end) in self.segments(&times, multi_segment) {
            let segment = &mut signal[start..end];
            match median(segment) {
                Some(m) if m != 0.0 => segment.iter_mut().for_each(|s| *s /= m),
                _ => {}
            }
        }

        Ok((times, signal))
    }
}
