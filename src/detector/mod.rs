//! # Eclipse detection
//!
//! The detector is the analysis step of every adapter: given cleaned
//! `(times, signal)` arrays and a [`DetectorParams`] configuration it produces an
//! [`EclipseResult`] or fails with a [`DetectionError`].
//!
//! Adapters only depend on the [`EclipseDetector`] trait. The crate ships
//! [`threshold::ThresholdDetector`] as a reference implementation; any other
//! algorithm can be plugged in through
//! [`Pipeline::with_detector`](crate::adapters::Pipeline::with_detector).
//!
//! ## Modes
//!
//! * [`DetectionMode::Summary`] – scalar outputs, flags and bounding boxes only.
//! * [`DetectionMode::Full`] – also the per-eclipse measurements, index table,
//!   candidate indices and classification codes.
//!
//! ## Failure contract
//!
//! Implementations return `Err` on malformed or degenerate input (too few points,
//! non-monotonic time, non-finite samples, flat signal). Callers treat every error
//! as "no usable signal" for that target only.
use thiserror::Error;

use crate::constants::{Days, Flux, DEFAULT_MAX_N};
use crate::eclipse_result::EclipseResult;

pub mod threshold;

/// Detector failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("Not enough points for detection: {found} (minimum {required})")]
    TooFewPoints { found: usize, required: usize },

    #[error("Time stamps are not strictly increasing at index {0}")]
    NonMonotonicTime(usize),

    #[error("Non-finite sample at index {0}")]
    NonFinite(usize),

    #[error("Times and signal differ in length: {0} vs {1}")]
    LengthMismatch(usize, usize),

    #[error("Degenerate signal: {0}")]
    Degenerate(String),
}

/// Amount of output requested from the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMode {
    Summary = 1,
    Full = 2,
}

/// Settings forwarded to [`EclipseDetector::detect`].
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorParams {
    pub mode: DetectionMode,
    /// Cap on the number of eclipse candidates considered.
    pub max_n: usize,
    /// The input mixes several acquisition segments.
    pub multi_segment: bool,
}

impl DetectorParams {
    pub fn summary(max_n: usize) -> Self {
        DetectorParams {
            mode: DetectionMode::Summary,
            max_n,
            multi_segment: false,
        }
    }

    pub fn full(max_n: usize, multi_segment: bool) -> Self {
        DetectorParams {
            mode: DetectionMode::Full,
            max_n,
            multi_segment,
        }
    }
}

impl Default for DetectorParams {
    fn default() -> Self {
        DetectorParams::full(DEFAULT_MAX_N, false)
    }
}

/// Eclipse detection algorithm.
///
/// Implementations must be pure with respect to their inputs: the batch runner
/// calls them concurrently from several worker threads.
pub trait EclipseDetector: Send + Sync {
    fn detect(
        &self,
        times: &[Days],
        signal: &[Flux],
        params: &DetectorParams,
    ) -> Result<EclipseResult, DetectionError>;
}

impl<F> EclipseDetector for F
where
    F: Fn(&[Days], &[Flux], &DetectorParams) -> Result<EclipseResult, DetectionError>
        + Send
        + Sync,
{
    fn detect(
        &self,
        times: &[Days],
        signal: &[Flux],
        params: &DetectorParams,
    ) -> Result<EclipseResult, DetectionError> {
        self(times, signal, params)
    }
}
