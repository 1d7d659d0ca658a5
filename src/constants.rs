//! # Constants and type definitions for eclipse_batch
//!
//! This module centralizes the **fixed pipeline settings**, the **FITS column names**
//! of the supported light-curve products, and the **common type aliases** used
//! throughout the crate.
//!
//! ## Overview
//!
//! - Detector settings shared by every adapter (`max_n`)
//! - Guard thresholds of the identifier-based adapter
//! - Catalog identifier formatting
//! - FITS light-curve column names and the quality-flag convention
//!
//! These definitions are used by the adapters, the readers and the batch orchestrator.

// -------------------------------------------------------------------------------------------------
// Detector settings
// -------------------------------------------------------------------------------------------------

/// Maximum number of eclipse candidates considered by the detector.
pub const DEFAULT_MAX_N: usize = 80;

/// Minimum number of ingested samples required before the detector is attempted
/// by the identifier-based adapter.
pub const MIN_SAMPLES: usize = 10;

/// Value added to raw text signals so that a non-detection baseline sits at 1.
pub const TEXT_SIGNAL_OFFSET: f64 = 1.0;

// -------------------------------------------------------------------------------------------------
// Catalog identifiers
// -------------------------------------------------------------------------------------------------

/// Number of decimal digits of a zero-padded catalog identifier.
pub const IDENTIFIER_WIDTH: usize = 16;

/// Largest identifier representable in [`IDENTIFIER_WIDTH`] digits.
pub const MAX_IDENTIFIER: u64 = 9_999_999_999_999_999;

// -------------------------------------------------------------------------------------------------
// FITS light curves
// -------------------------------------------------------------------------------------------------

/// HDU index of the light-curve table in mission products.
pub const LIGHT_CURVE_HDU: usize = 1;

/// Time column (BTJD days).
pub const TIME_COLUMN: &str = "TIME";

/// Primary flux estimator (pre-search data conditioned).
pub const PDCSAP_FLUX: &str = "PDCSAP_FLUX";

/// Secondary flux estimator, present in quick-look products.
pub const KSPSAP_FLUX: &str = "KSPSAP_FLUX";

/// Simple aperture flux, the fallback estimator.
pub const SAP_FLUX: &str = "SAP_FLUX";

/// Quality bitmask column.
pub const QUALITY_COLUMN: &str = "QUALITY";

/// Quality flag value marking a good sample.
pub const GOOD_QUALITY: i64 = 0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Time in days (BTJD for mission products, arbitrary for text sources)
pub type Days = f64;

/// Normalised flux (baseline = 1)
pub type Flux = f64;

/// Time and flux arrays ready for the detector
pub type CleanSeries = (Vec<Days>, Vec<Flux>);
