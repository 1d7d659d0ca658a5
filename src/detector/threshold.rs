//! # Threshold eclipse detector
//!
//! A robust-statistics dip finder implementing [`EclipseDetector`].
//!
//! ## Algorithm
//!
//! 1. Validate the input (equal lengths, at least [`ThresholdDetector::min_points`]
//!    samples, finite values, strictly increasing times).
//! 2. Estimate the baseline with the median and the noise with the scaled median
//!    absolute deviation (falling back to the mean absolute deviation when more than
//!    half of the samples sit exactly on the baseline).
//! 3. Every run of consecutive samples below `median - threshold_sigma · σ` is a dip.
//!    Runs never span a time gap larger than `segment_gap` when the multi-segment
//!    flag is set.
//! 4. Dips are ranked by added signal-to-noise, capped at `max_n`, and classified
//!    by depth relative to the deepest one (primary ≥ 75 %, secondary ≥ 25 %).
//! 5. With at least two primaries, the period is the least-squares slope of primary
//!    mid-times against their cycle numbers, using the shortest spacing as the
//!    initial cycle length.
use itertools::Itertools;
use nalgebra::Matrix2;

use super::{DetectionError, DetectionMode, DetectorParams, EclipseDetector};
use crate::constants::{Days, Flux};
use crate::eclipse_result::{
    EclipseResult, CLASS_OTHER, CLASS_PRIMARY, CLASS_SECONDARY, QUALITY_APERIODIC,
    QUALITY_NO_ECLIPSES, QUALITY_PERIODIC,
};

/// MAD → σ for normally distributed noise.
const MAD_TO_SIGMA: f64 = 1.4826;
/// Mean absolute deviation → σ for normally distributed noise.
const MEAN_DEV_TO_SIGMA: f64 = 1.2533;

const PRIMARY_DEPTH_FRACTION: f64 = 0.75;
const SECONDARY_DEPTH_FRACTION: f64 = 0.25;

/// Fraction of samples below threshold above which the curve is flagged sine-like.
const SINE_LIKE_DUTY_CYCLE: f64 = 0.25;
/// Primary width, as a fraction of the period, above which eclipses are wide.
const WIDE_FRACTION: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct ThresholdDetector {
    /// Detection threshold in units of the noise level.
    pub threshold_sigma: f64,
    /// Gap (days) that splits a dip in multi-segment mode.
    pub segment_gap: Days,
    /// Minimum number of samples accepted.
    pub min_points: usize,
}

impl Default for ThresholdDetector {
    fn default() -> Self {
        ThresholdDetector {
            threshold_sigma: 3.0,
            segment_gap: 0.5,
            min_points: 3,
        }
    }
}

#[derive(Debug, Clone)]
struct Dip {
    outer: (usize, usize),
    inner: (usize, usize),
    minimum: usize,
    mid_time: Days,
    width: Days,
    depth: Flux,
    ratio: f64,
    snr: f64,
    class: i32,
}

fn median(values: &[f64]) -> f64 {
    let sorted: Vec<f64> = values.iter().copied().sorted_by(f64::total_cmp).collect();
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    }
}

/// Mean absolute deviation about `center`.
fn mean_abs_dev(values: &[f64], center: f64) -> f64 {
    values.iter().map(|v| (v - center).abs()).sum::<f64>() / values.len() as f64
}

/// `[[w_min, w_max], [d_min, d_max]]` over the given dips, `-1` when empty.
fn bounding_box<'a>(dips: impl Iterator<Item = &'a Dip>) -> Matrix2<f64> {
    let (widths, depths): (Vec<f64>, Vec<f64>) = dips.map(|d| (d.width, d.depth)).unzip();
    let w = widths.into_iter().minmax_by(f64::total_cmp).into_option();
    let d = depths.into_iter().minmax_by(f64::total_cmp).into_option();
    match (w, d) {
        (Some((w_min, w_max)), Some((d_min, d_max))) => Matrix2::new(w_min, w_max, d_min, d_max),
        _ => Matrix2::repeat(-1.0),
    }
}

impl ThresholdDetector {
    fn validate(&self, times: &[Days], signal: &[Flux]) -> Result<(), DetectionError> {
        if times.len() != signal.len() {
            return Err(DetectionError::LengthMismatch(times.len(), signal.len()));
        }
        if times.len() < self.min_points {
            return Err(DetectionError::TooFewPoints {
                found: times.len(),
                required: self.min_points,
            });
        }
        if let Some(i) = times
            .iter()
            .zip(signal)
            .position(|(t, s)| !t.is_finite() || !s.is_finite())
        {
            return Err(DetectionError::NonFinite(i));
        }
        if let Some(i) = times.iter().tuple_windows().position(|(a, b)| b <= a) {
            return Err(DetectionError::NonMonotonicTime(i + 1));
        }
        Ok(())
    }

    /// Runs of consecutive below-threshold samples, as inclusive index pairs.
    fn runs(&self, times: &[Days], below: &[bool], multi_segment: bool) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        let mut start: Option<usize> = None;
        for i in 0..below.len() {
            let gap_break = multi_segment && i > 0 && times[i] - times[i - 1] > self.segment_gap;
            match (start, below[i]) {
                (Some(s), true) if gap_break => {
                    runs.push((s, i - 1));
                    start = Some(i);
                }
                (Some(s), false) => {
                    runs.push((s, i - 1));
                    start = None;
                }
                (None, true) => start = Some(i),
                _ => {}
            }
        }
        if let Some(s) = start {
            runs.push((s, below.len() - 1));
        }
        runs
    }

    fn measure(
        &self,
        (s, e): (usize, usize),
        times: &[Days],
        signal: &[Flux],
        baseline: Flux,
        sigma: Flux,
        cadence: Days,
    ) -> Dip {
        let minimum = (s..=e)
            .min_by(|&a, &b| signal[a].total_cmp(&signal[b]))
            .unwrap_or(s);
        let depth = baseline - signal[minimum];
        let half = baseline - 0.5 * depth;
        let inner_start = (s..=e).find(|&i| signal[i] <= half).unwrap_or(minimum);
        let inner_end = (s..=e).rev().find(|&i| signal[i] <= half).unwrap_or(minimum);

        let width = times[e] - times[s] + cadence;
        let inner_width = times[inner_end] - times[inner_start] + cadence;

        Dip {
            outer: (s, e),
            inner: (inner_start, inner_end),
            minimum,
            mid_time: 0.5 * (times[s] + times[e]),
            width,
            depth,
            ratio: inner_width / width,
            snr: depth / sigma * ((e - s + 1) as f64).sqrt(),
            class: CLASS_OTHER,
        }
    }

    /// Least-squares period from primary mid-times.
    ///
    /// Return
    /// ----------
    /// * `Some((period, error))`, or `None` with fewer than two primaries.
    fn period(&self, primaries: &[Days], cadence: Days) -> Option<(f64, f64)> {
        if primaries.len() < 2 {
            return None;
        }
        let spacing = primaries
            .iter()
            .tuple_windows()
            .map(|(a, b)| b - a)
            .min_by(f64::total_cmp)?;
        if spacing <= 0.0 {
            return None;
        }
        let t0 = primaries[0];
        let cycles: Vec<f64> = primaries
            .iter()
            .map(|t| ((t - t0) / spacing).round())
            .collect();

        let n = cycles.len() as f64;
        let c_mean = cycles.iter().sum::<f64>() / n;
        let t_mean = primaries.iter().sum::<f64>() / n;
        let sxx: f64 = cycles.iter().map(|c| (c - c_mean).powi(2)).sum();
        if sxx == 0.0 {
            return None;
        }
        let sxy: f64 = cycles
            .iter()
            .zip(primaries)
            .map(|(c, t)| (c - c_mean) * (t - t_mean))
            .sum();
        let period = sxy / sxx;

        let error = if primaries.len() > 2 {
            let intercept = t_mean - period * c_mean;
            let rss: f64 = cycles
                .iter()
                .zip(primaries)
                .map(|(c, t)| (t - intercept - period * c).powi(2))
                .sum();
            (rss / (n - 2.0) / sxx).sqrt()
        } else {
            cadence / cycles.last().copied().unwrap_or(1.0).max(1.0)
        };
        Some((period, error))
    }
}

impl EclipseDetector for ThresholdDetector {
    fn detect(
        &self,
        times: &[Days],
        signal: &[Flux],
        params: &DetectorParams,
    ) -> Result<EclipseResult, DetectionError> {
        self.validate(times, signal)?;

        let baseline = median(signal);
        let deviations: Vec<f64> = signal.iter().map(|s| (s - baseline).abs()).collect();
        let mut sigma = MAD_TO_SIGMA * median(&deviations);
        if sigma == 0.0 {
            sigma = MEAN_DEV_TO_SIGMA * mean_abs_dev(signal, baseline);
        }
        if sigma == 0.0 {
            return Err(DetectionError::Degenerate("flat signal".into()));
        }

        let cadence = median(
            &times
                .iter()
                .tuple_windows()
                .map(|(a, b)| b - a)
                .collect::<Vec<_>>(),
        );

        let threshold = baseline - self.threshold_sigma * sigma;
        let below: Vec<bool> = signal.iter().map(|&s| s < threshold).collect();
        let duty_cycle = below.iter().filter(|&&b| b).count() as f64 / below.len() as f64;

        let mut dips: Vec<Dip> = self
            .runs(times, &below, params.multi_segment)
            .into_iter()
            .map(|run| self.measure(run, times, signal, baseline, sigma, cadence))
            .sorted_by(|a, b| b.snr.total_cmp(&a.snr))
            .take(params.max_n)
            .sorted_by_key(|d| d.outer.0)
            .collect();

        let max_depth = dips.iter().map(|d| d.depth).fold(0.0, f64::max);
        for dip in dips.iter_mut() {
            dip.class = if dip.depth >= PRIMARY_DEPTH_FRACTION * max_depth {
                CLASS_PRIMARY
            } else if dip.depth >= SECONDARY_DEPTH_FRACTION * max_depth {
                CLASS_SECONDARY
            } else {
                CLASS_OTHER
            };
        }

        let primary_times: Vec<Days> = dips
            .iter()
            .filter(|d| d.class == CLASS_PRIMARY)
            .map(|d| d.mid_time)
            .collect();
        let period = self.period(&primary_times, cadence);

        let quality_code = match (dips.is_empty(), period) {
            (true, _) => QUALITY_NO_ECLIPSES,
            (false, None) => QUALITY_APERIODIC,
            (false, Some(_)) => QUALITY_PERIODIC,
        };
        let (period, period_error) = period.unwrap_or((-1.0, -1.0));

        let widest_primary = dips
            .iter()
            .filter(|d| d.class == CLASS_PRIMARY)
            .map(|d| d.width)
            .fold(0.0, f64::max);

        let mut result = EclipseResult {
            period,
            period_error,
            n_eclipses: dips.len() as i64,
            sine_like: duty_cycle > SINE_LIKE_DUTY_CYCLE,
            wide: period > 0.0 && widest_primary > WIDE_FRACTION * period,
            quality_code,
            primary_box: bounding_box(dips.iter().filter(|d| d.class == CLASS_PRIMARY)),
            secondary_box: bounding_box(dips.iter().filter(|d| d.class == CLASS_SECONDARY)),
            mid_times: Vec::new(),
            widths: Vec::new(),
            depths: Vec::new(),
            ratios: Vec::new(),
            added_snr: Vec::new(),
            event_ranges: Vec::new(),
            candidates: Vec::new(),
            classification: Vec::new(),
        };

        if params.mode == DetectionMode::Full {
            for dip in &dips {
                result.mid_times.push(dip.mid_time);
                result.widths.push(dip.width);
                result.depths.push(dip.depth);
                result.ratios.push(dip.ratio);
                result.added_snr.push(dip.snr);
                result.event_ranges.push([
                    dip.outer.0 as i64,
                    dip.inner.0 as i64,
                    dip.inner.1 as i64,
                    dip.outer.1 as i64,
                ]);
                result.candidates.push(dip.minimum as i64);
                result.classification.push(dip.class);
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod threshold_test {
    use super::*;
    use approx::assert_relative_eq;

    /// Box-shaped eclipses: primaries of depth 0.5 every `period`, secondaries of
    /// depth 0.2 half a period later, each `width` days long.
    fn synthetic(n: usize, dt: f64, period: f64, width: f64) -> (Vec<f64>, Vec<f64>) {
        let times: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();
        let signal = times
            .iter()
            .map(|t| {
                let phase = (t + 0.5 * width) % period;
                if phase < width {
                    0.5
                } else if (phase - 0.5 * period).abs() < 0.5 * width {
                    0.8
                } else {
                    1.0
                }
            })
            .collect();
        (times, signal)
    }

    #[test]
    fn test_validation_errors() {
        let det = ThresholdDetector::default();
        let params = DetectorParams::default();

        assert_eq!(
            det.detect(&[0.0, 1.0], &[1.0, 1.0], &params),
            Err(DetectionError::TooFewPoints {
                found: 2,
                required: 3
            })
        );
        assert_eq!(
            det.detect(&[0.0, 2.0, 1.0], &[1.0, 0.5, 1.0], &params),
            Err(DetectionError::NonMonotonicTime(2))
        );
        assert_eq!(
            det.detect(&[0.0, 1.0, 2.0], &[1.0, f64::NAN, 1.0], &params),
            Err(DetectionError::NonFinite(1))
        );
        assert_eq!(
            det.detect(&[0.0, 1.0, 2.0], &[1.0, 1.0, 1.0], &params),
            Err(DetectionError::Degenerate("flat signal".into()))
        );
    }

    #[test]
    fn test_periodic_eclipses_full_mode() {
        let (t, s) = synthetic(2000, 0.01, 2.0, 0.1);
        let res = ThresholdDetector::default()
            .detect(&t, &s, &DetectorParams::full(80, false))
            .unwrap();

        assert_eq!(res.quality_code, QUALITY_PERIODIC);
        assert_relative_eq!(res.period, 2.0, epsilon = 0.02);
        assert!(res.n_eclipses >= 18);
        assert_eq!(res.n_listed(), res.n_eclipses as usize);
        assert_eq!(res.event_ranges.len(), res.candidates.len());
        assert_eq!(res.classification.len(), res.candidates.len());
        assert!(res.classification.contains(&CLASS_PRIMARY));
        assert!(res.classification.contains(&CLASS_SECONDARY));
        assert!(!res.sine_like);
        assert!(res.primary_box[(1, 0)] > 0.4);
        assert!(res.secondary_box[(1, 1)] < 0.3);
        for range in &res.event_ranges {
            assert!(range[0] <= range[1] && range[1] <= range[2] && range[2] <= range[3]);
        }
    }

    #[test]
    fn test_summary_mode_has_no_sequences() {
        let (t, s) = synthetic(2000, 0.01, 2.0, 0.1);
        let res = ThresholdDetector::default()
            .detect(&t, &s, &DetectorParams::summary(80))
            .unwrap();
        assert_eq!(res.quality_code, QUALITY_PERIODIC);
        assert!(res.n_eclipses > 0);
        assert!(res.mid_times.is_empty());
        assert!(res.event_ranges.is_empty());
        assert!(res.candidates.is_empty());
    }

    #[test]
    fn test_max_n_caps_candidates() {
        let (t, s) = synthetic(2000, 0.01, 2.0, 0.1);
        let res = ThresholdDetector::default()
            .detect(&t, &s, &DetectorParams::full(3, false))
            .unwrap();
        assert_eq!(res.n_eclipses, 3);
        assert_eq!(res.candidates.len(), 3);
    }

    #[test]
    fn test_single_dip_is_aperiodic() {
        let t: Vec<f64> = (0..100).map(|i| i as f64 * 0.1).collect();
        let s: Vec<f64> = (0..100)
            .map(|i| if (50..53).contains(&i) { 0.6 } else { 1.0 })
            .collect();
        let res = ThresholdDetector::default()
            .detect(&t, &s, &DetectorParams::default())
            .unwrap();
        assert_eq!(res.quality_code, QUALITY_APERIODIC);
        assert_eq!(res.period, -1.0);
        assert_eq!(res.n_eclipses, 1);
        assert_eq!(res.event_ranges[0], [50, 50, 52, 52]);
        assert_eq!(res.secondary_box, Matrix2::repeat(-1.0));
    }

    #[test]
    fn test_dip_split_across_segment_gap() {
        let t = vec![0.0, 0.1, 0.2, 0.3, 5.0, 5.1, 5.2, 5.3, 5.4, 5.5, 5.6, 5.7];
        let s = vec![1.0, 1.0, 1.0, 0.5, 0.5, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let det = ThresholdDetector::default();

        let single = det.detect(&t, &s, &DetectorParams::full(80, false)).unwrap();
        assert_eq!(single.n_eclipses, 1);

        let multi = det.detect(&t, &s, &DetectorParams::full(80, true)).unwrap();
        assert_eq!(multi.n_eclipses, 2);
    }
}
