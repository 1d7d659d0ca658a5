use std::fs;

use camino::Utf8PathBuf;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use eclipse_batch::adapters::{AdapterConfig, AdapterKind};
use eclipse_batch::batch::{BatchRunner, WorkerCount};
use eclipse_batch::detector::threshold::ThresholdDetector;
use eclipse_batch::detector::{DetectorParams, EclipseDetector};
use eclipse_batch::target::Target;

/// Noisy detached binary: primaries of depth 0.4 and secondaries of depth 0.15.
fn synthetic_light_curve(rng: &mut StdRng, n: usize, period: f64) -> (Vec<f64>, Vec<f64>) {
    let width = 0.08;
    let times: Vec<f64> = (0..n).map(|i| i as f64 * 0.01).collect();
    let signal = times
        .iter()
        .map(|t| {
            let phase = (t + 0.5 * width) % period;
            let dip = if phase < width {
                0.4
            } else if (phase - 0.5 * period).abs() < 0.5 * width {
                0.15
            } else {
                0.0
            };
            1.0 - dip + rng.random_range(-0.005..0.005)
        })
        .collect();
    (times, signal)
}

fn bench_detector(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xEC11);
    let (t, s) = synthetic_light_curve(&mut rng, 20_000, 2.7);
    let detector = ThresholdDetector::default();

    let mut group = c.benchmark_group("threshold_detector");
    for (label, params) in [
        ("summary", DetectorParams::summary(80)),
        ("full", DetectorParams::full(80, false)),
    ] {
        group.bench_function(label, |b| {
            b.iter(|| detector.detect(black_box(&t), black_box(&s), &params))
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xBA7C);
    let dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 path");

    let targets: Vec<Target> = (0..32)
        .map(|i| {
            let period = rng.random_range(0.8..5.0);
            let (t, s) = synthetic_light_curve(&mut rng, 5_000, period);
            let rows: String = t.iter().zip(&s).map(|(t, s)| format!("{t} {}\n", s - 1.0)).collect();
            let path = root.join(format!("lc_{i:03}.txt"));
            fs::write(&path, rows).expect("write light curve");
            Target::from(path)
        })
        .collect();

    let mut group = c.benchmark_group("batch_from_file");
    group.sample_size(10);
    for workers in [1usize, 2, 4] {
        let runner = BatchRunner::new(AdapterKind::FromFile)
            .workers(WorkerCount::new(workers).expect("non-zero"))
            .config(AdapterConfig::default());
        group.bench_with_input(BenchmarkId::from_parameter(workers), &targets, |b, targets| {
            b.iter(|| runner.run(black_box(targets)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_detector, bench_batch);
criterion_main!(benches);
