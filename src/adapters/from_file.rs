//! Full analysis of a two-column text light curve.
//!
//! Same ingestion as the ephemeris adapter, detector in full mode. Failures are
//! replaced by the sentinel [`EclipseResult`]. When a save directory is configured,
//! the result (regular or sentinel) is persisted under the file name of the target.
use camino::Utf8Path;

use super::{AdapterConfig, Pipeline, TargetFailure, TargetOutcome};
use crate::constants::TEXT_SIGNAL_OFFSET;
use crate::detector::DetectorParams;
use crate::eclipse_result::EclipseResult;
use crate::readers::text_reader::load_time_series;

pub fn from_file(path: &Utf8Path, config: &AdapterConfig, pipeline: &Pipeline) -> TargetOutcome {
    let source_id = path.file_name().unwrap_or(path.as_str()).to_string();

    let ingested = load_time_series(path, config.delimiter).and_then(|raw| {
        pipeline
            .ingestor()
            .ingest(raw.offset_signal(TEXT_SIGNAL_OFFSET), false)
    });

    let mut outcome = match ingested {
        Err(e) => {
            log::warn!("an error happened while reading the following file: {path}: {e}");
            TargetOutcome::failed(
                Some(EclipseResult::empty().clone()),
                TargetFailure::Ingestion(e.to_string()),
            )
        }
        Ok((times, signal)) => match pipeline.detector().detect(
            &times,
            &signal,
            &DetectorParams::full(config.max_n, false),
        ) {
            Ok(result) => TargetOutcome::success(result),
            Err(e) => {
                log::warn!("an error happened in the following file: {path}: {e}");
                TargetOutcome::failed(
                    Some(EclipseResult::empty().clone()),
                    TargetFailure::Detection(e.to_string()),
                )
            }
        },
    };

    if let Some(result) = &outcome.result {
        outcome.persist_error = pipeline.persist(config, result, &source_id);
    }
    outcome
}
