//! # Source adapters
//!
//! An adapter is the per-target pipeline run by a batch worker: it reads one
//! target, ingests the raw arrays, runs the eclipse detector, and optionally
//! persists the result.
//!
//! Three adapters are available, selected by name through [`AdapterKind`]:
//!
//! | name              | target     | detector mode        | on failure        |
//! |-------------------|------------|----------------------|-------------------|
//! | `ephem_from_file` | text file  | summary              | no result (empty) |
//! | `from_file`       | text file  | full                 | sentinel result   |
//! | `from_identifier` | catalog id | full, multi-segment  | sentinel result   |
//!
//! The failure contracts differ on purpose: the ephemeris adapter reports "no result
//! produced" with an empty collection, the other two always yield a record of the
//! canonical [`EclipseResult`] shape.
//!
//! Every adapter returns a [`TargetOutcome`], which carries the externally visible
//! result together with a [`TargetFailure`] classification of what went wrong, if
//! anything.
//!
//! ## Collaborators
//!
//! Adapters reach their collaborators through a [`Pipeline`]: a [`SignalIngestor`],
//! an [`EclipseDetector`], a [`ResultSink`] and a [`TableReader`]. The default
//! pipeline uses the implementations shipped with the crate; tests and callers
//! substitute their own with the `with_*` methods.
use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};

use crate::batch_errors::BatchError;
use crate::constants::{DEFAULT_MAX_N, LIGHT_CURVE_HDU, MIN_SAMPLES};
use crate::detector::threshold::ThresholdDetector;
use crate::detector::EclipseDetector;
use crate::eclipse_result::EclipseResult;
use crate::ingest::{SignalIngestor, StandardIngestor};
use crate::readers::{FitsReader, TableReader};
use crate::sink::{destination_for, JsonSink, ResultSink};
use crate::target::Target;

pub mod ephemeris;
pub mod from_file;
pub mod from_identifier;

/// Why a target did not produce a regular detector result.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetFailure {
    /// The data could not be read or ingested.
    Ingestion(String),
    /// The detector rejected the ingested series.
    Detection(String),
    /// Too few samples to attempt detection; the detector was not called.
    InsufficientData { samples: usize, required: usize },
    /// The adapter panicked; caught by the batch runner.
    Panic(String),
}

impl fmt::Display for TargetFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetFailure::Ingestion(e) => write!(f, "ingestion failed: {e}"),
            TargetFailure::Detection(e) => write!(f, "detection failed: {e}"),
            TargetFailure::InsufficientData { samples, required } => {
                write!(f, "insufficient data: {samples} samples (minimum {required})")
            }
            TargetFailure::Panic(e) => write!(f, "adapter panicked: {e}"),
        }
    }
}

/// Result of running one adapter on one target.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetOutcome {
    /// The result; `None` is the ephemeris adapter's "no result produced".
    pub result: Option<EclipseResult>,
    pub failure: Option<TargetFailure>,
    /// Set when the sink failed; the result is unaffected.
    pub persist_error: Option<String>,
}

impl TargetOutcome {
    pub fn success(result: EclipseResult) -> Self {
        TargetOutcome {
            result: Some(result),
            failure: None,
            persist_error: None,
        }
    }

    pub fn failed(result: Option<EclipseResult>, failure: TargetFailure) -> Self {
        TargetOutcome {
            result,
            failure: Some(failure),
            persist_error: None,
        }
    }

    /// The results as a collection of zero or one records.
    pub fn results(&self) -> &[EclipseResult] {
        self.result.as_slice()
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Keyword configuration forwarded to every adapter invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    /// Field delimiter of text files, `None` for whitespace.
    pub delimiter: Option<u8>,
    /// Directory receiving persisted results, `None` to skip persistence.
    pub save_dir: Option<Utf8PathBuf>,
    /// Pool of mission files searched by the identifier adapter.
    pub available_files: Vec<Utf8PathBuf>,
    pub max_n: usize,
    /// Guard threshold of the identifier adapter.
    pub min_samples: usize,
    /// Extension holding the light-curve table in mission files.
    pub table_index: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig {
            delimiter: None,
            save_dir: None,
            available_files: Vec::new(),
            max_n: DEFAULT_MAX_N,
            min_samples: MIN_SAMPLES,
            table_index: LIGHT_CURVE_HDU,
        }
    }
}

impl AdapterConfig {
    pub fn builder() -> AdapterConfigBuilder {
        AdapterConfigBuilder::new()
    }
}

/// Builder for [`AdapterConfig`].
#[derive(Debug, Clone, Default)]
pub struct AdapterConfigBuilder {
    config: AdapterConfig,
}

impl AdapterConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delimiter(mut self, v: u8) -> Self {
        self.config.delimiter = Some(v);
        self
    }
    pub fn save_dir(mut self, v: impl Into<Utf8PathBuf>) -> Self {
        self.config.save_dir = Some(v.into());
        self
    }
    pub fn available_files(mut self, v: Vec<Utf8PathBuf>) -> Self {
        self.config.available_files = v;
        self
    }
    pub fn max_n(mut self, v: usize) -> Self {
        self.config.max_n = v;
        self
    }
    pub fn min_samples(mut self, v: usize) -> Self {
        self.config.min_samples = v;
        self
    }
    pub fn table_index(mut self, v: usize) -> Self {
        self.config.table_index = v;
        self
    }

    pub fn build(self) -> AdapterConfig {
        self.config
    }
}

/// Collaborators shared read-only by every worker.
pub struct Pipeline {
    ingestor: Box<dyn SignalIngestor>,
    detector: Box<dyn EclipseDetector>,
    sink: Box<dyn ResultSink>,
    tables: Box<dyn TableReader>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline {
            ingestor: Box::new(StandardIngestor::default()),
            detector: Box::new(ThresholdDetector::default()),
            sink: Box::new(JsonSink),
            tables: Box::new(FitsReader),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ingestor(mut self, ingestor: impl SignalIngestor + 'static) -> Self {
        self.ingestor = Box::new(ingestor);
        self
    }

    pub fn with_detector(mut self, detector: impl EclipseDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    pub fn with_sink(mut self, sink: impl ResultSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_table_reader(mut self, tables: impl TableReader + 'static) -> Self {
        self.tables = Box::new(tables);
        self
    }

    pub fn ingestor(&self) -> &dyn SignalIngestor {
        self.ingestor.as_ref()
    }

    pub fn detector(&self) -> &dyn EclipseDetector {
        self.detector.as_ref()
    }

    pub fn tables(&self) -> &dyn TableReader {
        self.tables.as_ref()
    }

    /// Persist `result` when a save directory is configured.
    ///
    /// Return
    /// ----------
    /// * The sink error message, if saving failed.
    pub(crate) fn persist(
        &self,
        config: &AdapterConfig,
        result: &EclipseResult,
        identity: &str,
    ) -> Option<String> {
        let save_dir: &Utf8Path = config.save_dir.as_deref()?;
        let destination = destination_for(save_dir, identity);
        self.sink
            .save(result, &destination, identity)
            .err()
            .map(|e| {
                log::error!("unable to save the result of {identity} to {destination}: {e}");
                e.to_string()
            })
    }
}

/// The available adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    EphemerisFromFile,
    FromFile,
    FromIdentifier,
}

/// Name → adapter registry, first entry per adapter is its canonical name.
static ADAPTERS: &[(&str, AdapterKind)] = &[
    ("ephem_from_file", AdapterKind::EphemerisFromFile),
    ("from_file", AdapterKind::FromFile),
    ("from_identifier", AdapterKind::FromIdentifier),
    ("from_tic", AdapterKind::FromIdentifier),
];

impl AdapterKind {
    pub fn name(&self) -> &'static str {
        ADAPTERS
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }

    /// Every accepted adapter name, aliases included.
    pub fn names() -> impl Iterator<Item = &'static str> {
        ADAPTERS.iter().map(|(name, _)| *name)
    }

    /// `true` if the adapter consumes catalog identifiers rather than file paths.
    pub fn takes_identifiers(&self) -> bool {
        matches!(self, AdapterKind::FromIdentifier)
    }

    /// What the adapter returns when a target fails.
    pub fn failure_result(&self) -> Option<EclipseResult> {
        match self {
            AdapterKind::EphemerisFromFile => None,
            AdapterKind::FromFile | AdapterKind::FromIdentifier => {
                Some(EclipseResult::empty().clone())
            }
        }
    }

    /// Run the adapter on one target.
    pub fn run(&self, target: &Target, config: &AdapterConfig, pipeline: &Pipeline) -> TargetOutcome {
        match (self, target) {
            (AdapterKind::EphemerisFromFile, Target::Path(path)) => {
                ephemeris::ephem_from_file(path, config, pipeline)
            }
            (AdapterKind::FromFile, Target::Path(path)) => {
                from_file::from_file(path, config, pipeline)
            }
            (AdapterKind::FromIdentifier, Target::Identifier(id)) => {
                from_identifier::from_identifier(*id, config, pipeline)
            }
            _ => {
                let err = BatchError::UnsupportedTarget {
                    adapter: self.name().to_string(),
                    target: target.to_string(),
                };
                log::warn!("{err}");
                TargetOutcome::failed(self.failure_result(), TargetFailure::Ingestion(err.to_string()))
            }
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AdapterKind {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ADAPTERS
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| BatchError::UnknownAdapter(s.to_string()))
    }
}
