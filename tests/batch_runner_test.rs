mod common;

use std::time::Duration;

use approx::assert_relative_eq;
use eclipse_batch::adapters::{AdapterConfig, AdapterKind, Pipeline, TargetFailure};
use eclipse_batch::batch::{analyse_set, BatchRunner, BatchTiming, WorkerCount};
use eclipse_batch::batch_errors::BatchError;
use eclipse_batch::target::Target;

use common::{temp_dir, write_text_lc, PickyDetector, SlowDetector};

#[test]
fn outcomes_follow_input_order() {
    let (_guard, dir) = temp_dir();
    let n = 12;
    let targets: Vec<Target> = (0..n)
        .map(|i| Target::from(write_text_lc(&dir, &format!("star_{i:02}.txt"), i as f64, 20)))
        .collect();

    // early targets are the slowest, so they finish last
    let pipeline = Pipeline::default().with_detector(SlowDetector {
        cost: move |t0: f64| Duration::from_millis(((n as f64 - t0) * 5.0) as u64),
    });

    let outcome = BatchRunner::new(AdapterKind::FromFile)
        .workers(WorkerCount::new(4).unwrap())
        .pipeline(pipeline)
        .run(&targets)
        .unwrap();

    assert_eq!(outcome.len(), n);
    for (i, result) in outcome.results().enumerate() {
        assert_relative_eq!(result.unwrap().period, i as f64);
    }
}

#[test]
fn one_failure_does_not_affect_siblings() {
    let (_guard, dir) = temp_dir();
    let targets = vec![
        Target::from(write_text_lc(&dir, "a.txt", 1.0, 20)),
        Target::from(write_text_lc(&dir, "b.txt", 2.0, 2)),
        Target::from(dir.join("missing.txt")),
        Target::from(write_text_lc(&dir, "d.txt", 4.0, 20)),
    ];

    for adapter in [AdapterKind::FromFile, AdapterKind::EphemerisFromFile] {
        let outcome = BatchRunner::new(adapter)
            .workers(WorkerCount::new(2).unwrap())
            .pipeline(Pipeline::default().with_detector(PickyDetector { min_points: 5 }))
            .run(&targets)
            .unwrap();

        assert_eq!(outcome.n_succeeded(), 2);
        assert_eq!(outcome.n_failed(), 2);

        let results: Vec<_> = outcome.results().collect();
        assert_relative_eq!(results[0].unwrap().period, 1.0);
        assert_relative_eq!(results[3].unwrap().period, 4.0);

        assert!(matches!(
            outcome.outcomes[1].failure,
            Some(TargetFailure::Detection(_))
        ));
        assert!(matches!(
            outcome.outcomes[2].failure,
            Some(TargetFailure::Ingestion(_))
        ));

        match adapter {
            AdapterKind::EphemerisFromFile => {
                assert!(results[1].is_none());
                assert!(results[2].is_none());
            }
            _ => {
                assert!(results[1].unwrap().is_empty_sentinel());
                assert!(results[2].unwrap().is_empty_sentinel());
            }
        }
    }
}

#[test]
fn timing_reports_workers_and_targets() {
    let (_guard, dir) = temp_dir();
    let targets: Vec<Target> = (0..5)
        .map(|i| Target::from(write_text_lc(&dir, &format!("t{i}.txt"), i as f64, 10)))
        .collect();

    let outcome = BatchRunner::new(AdapterKind::FromFile)
        .workers(WorkerCount::new(3).unwrap())
        .pipeline(Pipeline::default().with_detector(PickyDetector { min_points: 1 }))
        .run(&targets)
        .unwrap();

    assert_eq!(outcome.timing.workers, 3);
    assert_eq!(outcome.timing.targets, 5);
    let expected = outcome.timing.elapsed_secs() * 3.0 / 5.0;
    assert_relative_eq!(outcome.timing.avg_single_threaded_secs().unwrap(), expected);
}

#[test]
fn average_single_threaded_time() {
    let timing = BatchTiming::new(Duration::from_secs(10), 4, 5);
    assert_relative_eq!(timing.avg_single_threaded_secs().unwrap(), 8.0);
}

#[test]
fn more_workers_than_targets() {
    let (_guard, dir) = temp_dir();
    let targets = vec![Target::from(write_text_lc(&dir, "only.txt", 7.0, 10))];

    let outcome = BatchRunner::new(AdapterKind::EphemerisFromFile)
        .workers(WorkerCount::new(16).unwrap())
        .pipeline(Pipeline::default().with_detector(PickyDetector { min_points: 1 }))
        .run(&targets)
        .unwrap();

    assert_eq!(outcome.len(), 1);
    assert_relative_eq!(outcome.outcomes[0].results()[0].period, 7.0);
}

#[test]
fn invalid_arguments_are_rejected_upfront() {
    assert_eq!(
        analyse_set(&[], "from_nowhere", Some(2), AdapterConfig::default()).unwrap_err(),
        BatchError::UnknownAdapter("from_nowhere".into())
    );
    assert_eq!(
        analyse_set(&[], "from_file", Some(0), AdapterConfig::default()).unwrap_err(),
        BatchError::InvalidWorkerCount(0)
    );
}
