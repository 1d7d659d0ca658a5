//! Ephemeris adapter: quick summary of a two-column text light curve.
//!
//! The signal column is offset by +1 before ingestion (text sources store the
//! signal around 0), the series is ingested as a single segment, and the detector
//! runs in summary mode. Any failure yields **no result** rather than the sentinel.
use camino::Utf8Path;

use super::{AdapterConfig, Pipeline, TargetFailure, TargetOutcome};
use crate::constants::TEXT_SIGNAL_OFFSET;
use crate::detector::DetectorParams;
use crate::readers::text_reader::load_time_series;

pub fn ephem_from_file(path: &Utf8Path, config: &AdapterConfig, pipeline: &Pipeline) -> TargetOutcome {
    let ingested = load_time_series(path, config.delimiter).and_then(|raw| {
        pipeline
            .ingestor()
            .ingest(raw.offset_signal(TEXT_SIGNAL_OFFSET), false)
    });
    let (times, signal) = match ingested {
        Ok(series) => series,
        Err(e) => {
            log::warn!("an error happened while reading the following file: {path}: {e}");
            return TargetOutcome::failed(None, TargetFailure::Ingestion(e.to_string()));
        }
    };

    match pipeline
        .detector()
        .detect(&times, &signal, &DetectorParams::summary(config.max_n))
    {
        Ok(result) => TargetOutcome::success(result),
        Err(e) => {
            log::warn!("an error happened in the following file: {path}: {e}");
            TargetOutcome::failed(None, TargetFailure::Detection(e.to_string()))
        }
    }
}
