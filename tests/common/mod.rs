#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use eclipse_batch::constants::{Days, Flux};
use eclipse_batch::detector::{DetectionError, DetectorParams, EclipseDetector};
use eclipse_batch::eclipse_result::EclipseResult;
use eclipse_batch::readers::fits_writer::BinTableBuilder;
use eclipse_batch::target::CatalogId;
use tempfile::TempDir;

pub fn temp_dir() -> (TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
    (dir, path)
}

/// A result whose `period` carries `label`, to trace which target produced it.
pub fn labelled_result(label: f64) -> EclipseResult {
    EclipseResult {
        period: label,
        n_eclipses: 1,
        ..EclipseResult::empty().clone()
    }
}

/// Write `n` rows of `time signal`, times starting at `t0`, flat signal 0.
pub fn write_text_lc(dir: &Utf8Path, name: &str, t0: f64, n: usize) -> Utf8PathBuf {
    let mut content = String::from("# time signal\n");
    for i in 0..n {
        writeln!(content, "{} 0.0", t0 + i as f64 * 0.01).expect("write to string");
    }
    let path = dir.join(name);
    fs::write(&path, content).expect("write text light curve");
    path
}

/// Mission file name of `id` for one sector, in the archive naming scheme.
pub fn mission_file_name(id: CatalogId, sector: u32) -> String {
    format!("tess2019-s{sector:04}-{}-0123-s_lc.fits", id.padded())
}

/// Write a mission light curve with all-good quality flags.
pub fn write_mission_lc(
    dir: &Utf8Path,
    id: CatalogId,
    sector: u32,
    times: Vec<f64>,
    flux_columns: &[(&str, Vec<f64>)],
) -> Utf8PathBuf {
    let quality = vec![0; times.len()];
    write_flagged_mission_lc(dir, id, sector, times, flux_columns, quality)
}

/// Write a mission light curve with explicit `QUALITY` flags (0 is good).
pub fn write_flagged_mission_lc(
    dir: &Utf8Path,
    id: CatalogId,
    sector: u32,
    times: Vec<f64>,
    flux_columns: &[(&str, Vec<f64>)],
    quality: Vec<i32>,
) -> Utf8PathBuf {
    let mut builder = BinTableBuilder::new().f64_column("TIME", times);
    for (name, values) in flux_columns {
        builder = builder.f32_column(name, values.iter().map(|v| *v as f32).collect());
    }
    builder = builder.i32_column("QUALITY", quality);

    let path = dir.join(mission_file_name(id, sector));
    builder.write(&path).expect("write mission light curve");
    path
}

/// Counts its invocations and records the series it was given.
#[derive(Clone, Default)]
pub struct RecordingDetector {
    pub calls: Arc<AtomicUsize>,
    pub seen: Arc<Mutex<Vec<(Vec<Days>, Vec<Flux>)>>>,
}

impl RecordingDetector {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_signal(&self) -> Option<Vec<Flux>> {
        self.seen
            .lock()
            .expect("poisoned")
            .last()
            .map(|(_, s)| s.clone())
    }
}

impl EclipseDetector for RecordingDetector {
    fn detect(
        &self,
        times: &[Days],
        signal: &[Flux],
        _: &DetectorParams,
    ) -> Result<EclipseResult, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .expect("poisoned")
            .push((times.to_vec(), signal.to_vec()));
        Ok(labelled_result(times.first().copied().unwrap_or(f64::NAN)))
    }
}

/// Labels each result with its first time stamp and sleeps `cost(first time)`,
/// so the completion order differs from the input order.
pub struct SlowDetector<F: Fn(f64) -> Duration + Send + Sync> {
    pub cost: F,
}

impl<F: Fn(f64) -> Duration + Send + Sync> EclipseDetector for SlowDetector<F> {
    fn detect(
        &self,
        times: &[Days],
        _: &[Flux],
        _: &DetectorParams,
    ) -> Result<EclipseResult, DetectionError> {
        let first = times.first().copied().unwrap_or(f64::NAN);
        thread::sleep((self.cost)(first));
        Ok(labelled_result(first))
    }
}

/// Rejects series shorter than `min_points`, labels the others.
pub struct PickyDetector {
    pub min_points: usize,
}

impl EclipseDetector for PickyDetector {
    fn detect(
        &self,
        times: &[Days],
        _: &[Flux],
        _: &DetectorParams,
    ) -> Result<EclipseResult, DetectionError> {
        if times.len() < self.min_points {
            return Err(DetectionError::TooFewPoints {
                found: times.len(),
                required: self.min_points,
            });
        }
        Ok(labelled_result(times[0]))
    }
}
