//! # Eclipse detection result
//!
//! [`EclipseResult`] is the fixed-shape record produced by the eclipse detector for a
//! single target. Success and failure share this shape: when no usable signal could be
//! analysed, adapters substitute the **sentinel empty result** returned by
//! [`EclipseResult::empty`].
//!
//! ## Layout
//!
//! ```text
//! EclipseResult
//! ├── period, period_error, n_eclipses       (primary scalar outputs)
//! ├── sine_like, wide                        (boolean indicators)
//! ├── quality_code                           (integer outcome code)
//! ├── primary_box, secondary_box             (2×2 bounding boxes)
//! ├── mid_times, widths, depths,
//! │   ratios, added_snr                      (per-eclipse measurements)
//! ├── event_ranges                           (N×4 index table)
//! ├── candidates                             (candidate indices)
//! └── classification                         (per-candidate codes)
//! ```
//!
//! The bounding boxes are laid out as
//!
//! ```text
//! [[width_min, width_max],
//!  [depth_min, depth_max]]
//! ```
//!
//! ## Sentinel
//!
//! The sentinel uses `-1` scalars, `false` flags, a quality code of `1`, all `-1`
//! bounding boxes and empty sequences. It is built once per process and shared by
//! reference; callers clone it when they need an owned value.
use std::sync::LazyLock;

use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};

/// Quality code of a result where no eclipse signal was found (also the sentinel's code).
pub const QUALITY_NO_ECLIPSES: i32 = 1;
/// Quality code of a result with eclipses but no periodicity.
pub const QUALITY_APERIODIC: i32 = 2;
/// Quality code of a result with periodic eclipses.
pub const QUALITY_PERIODIC: i32 = 3;

/// Per-candidate classification: primary eclipse.
pub const CLASS_PRIMARY: i32 = 1;
/// Per-candidate classification: secondary eclipse.
pub const CLASS_SECONDARY: i32 = 2;
/// Per-candidate classification: unclassified dip.
pub const CLASS_OTHER: i32 = 0;

/// Outcome of eclipse detection on one light curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EclipseResult {
    /// Orbital period estimate (days), `-1` when unknown.
    pub period: f64,
    /// Uncertainty on the period (days), `-1` when unknown.
    pub period_error: f64,
    /// Number of eclipses found, `-1` when no analysis was possible.
    pub n_eclipses: i64,
    /// The light curve looks sinusoidal rather than eclipsing.
    pub sine_like: bool,
    /// Eclipses cover a large fraction of the orbit.
    pub wide: bool,
    pub quality_code: i32,
    pub primary_box: Matrix2<f64>,
    pub secondary_box: Matrix2<f64>,
    pub mid_times: Vec<f64>,
    pub widths: Vec<f64>,
    pub depths: Vec<f64>,
    pub ratios: Vec<f64>,
    pub added_snr: Vec<f64>,
    /// `[outer_start, inner_start, inner_end, outer_end]` sample indices per eclipse.
    pub event_ranges: Vec<[i64; 4]>,
    pub candidates: Vec<i64>,
    pub classification: Vec<i32>,
}

static EMPTY_RESULT: LazyLock<EclipseResult> = LazyLock::new(|| EclipseResult {
    period: -1.0,
    period_error: -1.0,
    n_eclipses: -1,
    sine_like: false,
    wide: false,
    quality_code: QUALITY_NO_ECLIPSES,
    primary_box: Matrix2::repeat(-1.0),
    secondary_box: Matrix2::repeat(-1.0),
    mid_times: Vec::new(),
    widths: Vec::new(),
    depths: Vec::new(),
    ratios: Vec::new(),
    added_snr: Vec::new(),
    event_ranges: Vec::new(),
    candidates: Vec::new(),
    classification: Vec::new(),
});

impl EclipseResult {
    /// The process-wide sentinel meaning "no usable result".
    pub fn empty() -> &'static EclipseResult {
        &EMPTY_RESULT
    }

    /// `true` if this record is field-for-field the sentinel.
    pub fn is_empty_sentinel(&self) -> bool {
        self == Self::empty()
    }

    /// Number of eclipses listed in the per-eclipse sequences.
    pub fn n_listed(&self) -> usize {
        self.mid_times.len()
    }
}

#[cfg(test)]
mod eclipse_result_test {
    use super::*;

    #[test]
    fn test_sentinel_shape() {
        let empty = EclipseResult::empty();
        assert_eq!(empty.period, -1.0);
        assert_eq!(empty.period_error, -1.0);
        assert_eq!(empty.n_eclipses, -1);
        assert!(!empty.sine_like);
        assert!(!empty.wide);
        assert_eq!(empty.quality_code, 1);
        assert_eq!(empty.primary_box, Matrix2::new(-1.0, -1.0, -1.0, -1.0));
        assert_eq!(empty.secondary_box, Matrix2::new(-1.0, -1.0, -1.0, -1.0));
        assert!(empty.mid_times.is_empty());
        assert!(empty.event_ranges.is_empty());
        assert!(empty.candidates.is_empty());
        assert!(empty.classification.is_empty());
        assert!(empty.is_empty_sentinel());
    }

    #[test]
    fn test_sentinel_is_shared() {
        assert!(std::ptr::eq(EclipseResult::empty(), EclipseResult::empty()));
    }

    #[test]
    fn test_modified_copy_is_not_sentinel() {
        let mut copy = EclipseResult::empty().clone();
        assert!(copy.is_empty_sentinel());
        copy.n_eclipses = 0;
        assert!(!copy.is_empty_sentinel());
        assert!(EclipseResult::empty().is_empty_sentinel());
    }

    #[test]
    fn test_json_roundtrip_of_sentinel() {
        let json = serde_json::to_string(EclipseResult::empty()).unwrap();
        let back: EclipseResult = serde_json::from_str(&json).unwrap();
        assert!(back.is_empty_sentinel());
    }
}
