//! Full analysis of one catalog identifier from mission light-curve files.
//!
//! Steps
//! -----------------
//! 1. Select the files of the pool whose name contains the zero-padded identifier.
//! 2. Read the light-curve table of each file and concatenate `TIME`, the selected
//!    flux column (see [`select_flux`]) and `QUALITY`.
//! 3. Keep samples whose quality flag is 0 and ingest as a multi-segment series.
//! 4. With fewer than `min_samples` ingested samples, return the sentinel without
//!    calling the detector (and without logging).
//! 5. Otherwise run the detector in full, multi-segment mode; a failure yields the
//!    sentinel.
//! 6. Persist under the identifier when a save directory is configured.
use camino::Utf8PathBuf;

use super::{AdapterConfig, Pipeline, TargetFailure, TargetOutcome};
use crate::batch_errors::BatchError;
use crate::constants::{
    GOOD_QUALITY, KSPSAP_FLUX, PDCSAP_FLUX, QUALITY_COLUMN, SAP_FLUX, TIME_COLUMN,
};
use crate::detector::DetectorParams;
use crate::eclipse_result::EclipseResult;
use crate::ingest::RawSeries;
use crate::readers::Table;
use crate::target::CatalogId;

/// Pick the flux column of a light-curve table.
///
/// Priority
/// -----------------
/// 1. `PDCSAP_FLUX` when present.
/// 2. When `KSPSAP_FLUX` is present (quick-look products), its values are not
///    trusted and `SAP_FLUX` of the same table is used instead.
/// 3. `SAP_FLUX` otherwise.
///
/// Return
/// ----------
/// * The name of the column used and its values.
pub fn select_flux(table: &Table) -> Result<(&'static str, &[f64]), BatchError> {
    let name = match (table.has_column(PDCSAP_FLUX), table.has_column(KSPSAP_FLUX)) {
        (true, _) => PDCSAP_FLUX,
        // quick-look products: KSPSAP_FLUX is present but unreliable
        (false, true) => SAP_FLUX,
        (false, false) => SAP_FLUX,
    };
    Ok((name, table.require(name)?))
}

/// Files of `pool` belonging to `id`, in pool order.
pub fn files_for(id: CatalogId, pool: &[Utf8PathBuf]) -> Vec<&Utf8PathBuf> {
    pool.iter().filter(|path| id.matches_file(path)).collect()
}

/// Concatenate the light curves of `files` into one raw series with a quality mask.
fn merge_light_curves(
    files: &[&Utf8PathBuf],
    config: &AdapterConfig,
    pipeline: &Pipeline,
) -> Result<RawSeries, BatchError> {
    let mut times = Vec::new();
    let mut signal = Vec::new();
    let mut flags = Vec::new();

    for file in files {
        let table = pipeline.tables().read_table(file, config.table_index)?;
        times.extend_from_slice(table.require(TIME_COLUMN)?);
        let (_, flux) = select_flux(&table)?;
        signal.extend_from_slice(flux);
        flags.extend_from_slice(table.require(QUALITY_COLUMN)?);
    }

    let quality = flags.iter().map(|&q| q == GOOD_QUALITY as f64).collect();
    RawSeries::with_quality(times, signal, Some(quality))
}

pub fn from_identifier(id: CatalogId, config: &AdapterConfig, pipeline: &Pipeline) -> TargetOutcome {
    let files = files_for(id, &config.available_files);
    log::debug!("{id}: {} light-curve files", files.len());

    let ingested = merge_light_curves(&files, config, pipeline)
        .and_then(|raw| pipeline.ingestor().ingest(raw, true));

    let mut outcome = match ingested {
        Err(e) => {
            log::warn!("an error happened while reading the following identifier: {id}: {e}");
            TargetOutcome::failed(
                Some(EclipseResult::empty().clone()),
                TargetFailure::Ingestion(e.to_string()),
            )
        }
        Ok((times, _)) if times.len() < config.min_samples => TargetOutcome::failed(
            Some(EclipseResult::empty().clone()),
            TargetFailure::InsufficientData {
                samples: times.len(),
                required: config.min_samples,
            },
        ),
        Ok((times, signal)) => match pipeline.detector().detect(
            &times,
            &signal,
            &DetectorParams::full(config.max_n, true),
        ) {
            Ok(result) => TargetOutcome::success(result),
            Err(e) => {
                log::warn!("an error happened in the following identifier: {id}: {e}");
                TargetOutcome::failed(
                    Some(EclipseResult::empty().clone()),
                    TargetFailure::Detection(e.to_string()),
                )
            }
        },
    };

    if let Some(result) = &outcome.result {
        outcome.persist_error = pipeline.persist(config, result, &id.to_string());
    }
    outcome
}
