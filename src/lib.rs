//! # eclipse_batch
//!
//! Fault-isolating parallel batch runner for eclipse detection on stellar light
//! curves.
//!
//! A batch applies one **adapter** to every target of a list (text light-curve
//! files or catalog identifiers resolved against a pool of mission FITS files) on
//! a fixed pool of workers. Each adapter reads its target, cleans the series with
//! a [`SignalIngestor`](crate::ingest::SignalIngestor), runs an
//! [`EclipseDetector`](crate::detector::EclipseDetector), and optionally persists
//! the result through a [`ResultSink`](crate::sink::ResultSink).
//!
//! Module map
//! -----------------
//! * [`batch`] – worker pool, order-preserving collection, timing summary.
//! * [`adapters`] – the three adapters, their configuration and registry.
//! * [`readers`] – text and FITS binary-table readers.
//! * [`ingest`] – raw series cleaning and normalisation.
//! * [`detector`] – detector contract and the reference threshold detector.
//! * [`eclipse_result`] – the result record and its failure sentinel.
//! * [`sink`] – JSON persistence of results.
//! * [`target`] – target kinds and catalog identifiers.
//!
//! Quick start
//! -----------------
//! ```rust, no_run
//! use eclipse_batch::adapters::AdapterConfig;
//! use eclipse_batch::batch::analyse_set;
//! use eclipse_batch::target::Target;
//!
//! let targets = vec![Target::from("data/star_a.txt"), Target::from("data/star_b.txt")];
//! let config = AdapterConfig::builder().save_dir("results").build();
//! let outcome = analyse_set(&targets, "from_file", Some(4), config)?;
//! println!("{}", outcome.timing);
//! # Ok::<(), eclipse_batch::batch_errors::BatchError>(())
//! ```
pub mod adapters;
pub mod batch;
pub mod batch_errors;
pub mod constants;
pub mod detector;
pub mod eclipse_result;
pub mod ingest;
pub mod readers;
pub mod sink;
pub mod target;

pub use adapters::{AdapterConfig, AdapterKind, Pipeline, TargetFailure, TargetOutcome};
pub use batch::{analyse_set, BatchOutcome, BatchRunner, BatchTiming, WorkerCount};
pub use batch_errors::BatchError;
pub use eclipse_result::EclipseResult;
pub use target::{CatalogId, Target};
