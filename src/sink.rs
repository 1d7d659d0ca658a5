//! # Result persistence
//!
//! Adapters hand every finished [`EclipseResult`] to a [`ResultSink`] when a save
//! directory is configured. The default [`JsonSink`] writes one JSON document per
//! target:
//!
//! ```text
//! <save_dir>/<identity>_eclipses.json
//! {
//!   "identifier": "<identity>",
//!   "result": { "period": ..., "quality_code": ..., ... }
//! }
//! ```
use std::fs::{self, File};
use std::io::{BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::batch_errors::BatchError;
use crate::eclipse_result::EclipseResult;

/// Persisted form of one result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedResult {
    pub identifier: String,
    pub result: EclipseResult,
}

/// Destination of finished results.
pub trait ResultSink: Send + Sync {
    /// Persist `result` for `identifier` under `destination` (a path stem).
    fn save(
        &self,
        result: &EclipseResult,
        destination: &Utf8Path,
        identifier: &str,
    ) -> Result<(), BatchError>;
}

/// Destination stem of a target inside `save_dir`.
pub fn destination_for(save_dir: &Utf8Path, identity: &str) -> Utf8PathBuf {
    save_dir.join(format!("{identity}_eclipses"))
}

/// Writes `<destination>.json`, creating parent directories as needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSink;

impl JsonSink {
    pub fn path_for(destination: &Utf8Path) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{destination}.json"))
    }

    /// Read back a file written by this sink.
    pub fn load(path: &Utf8Path) -> Result<SavedResult, BatchError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl ResultSink for JsonSink {
    fn save(
        &self,
        result: &EclipseResult,
        destination: &Utf8Path,
        identifier: &str,
    ) -> Result<(), BatchError> {
        if let Some(parent) = destination.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(Self::path_for(destination))?;
        let saved = SavedResult {
            identifier: identifier.to_string(),
            result: result.clone(),
        };
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &saved)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod sink_test {
    use super::*;

    #[test]
    fn test_json_sink_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let save_dir = Utf8PathBuf::from_path_buf(dir.path().join("out")).unwrap();
        let dest = destination_for(&save_dir, "star.txt");
        assert_eq!(dest, save_dir.join("star.txt_eclipses"));

        JsonSink.save(EclipseResult::empty(), &dest, "star.txt").unwrap();

        let saved = JsonSink::load(&JsonSink::path_for(&dest)).unwrap();
        assert_eq!(saved.identifier, "star.txt");
        assert!(saved.result.is_empty_sentinel());
    }
}
