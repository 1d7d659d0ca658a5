//! # Batch targets
//!
//! A [`Target`] is one unit of batch work: either a light-curve file on disk or a
//! catalog identifier whose data is spread over several mission files.
//!
//! Catalog identifiers are non-negative integers of at most
//! [`IDENTIFIER_WIDTH`](crate::constants::IDENTIFIER_WIDTH) decimal digits. Mission
//! file names embed them **zero-padded** to that width, which is what
//! [`CatalogId::padded`] produces and what [`identifiers_in_file_names`] looks for.
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use regex::Regex;

use crate::batch_errors::BatchError;
use crate::constants::{IDENTIFIER_WIDTH, MAX_IDENTIFIER};

/// Catalog identifier of a single star (e.g. a TIC number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogId(u64);

impl CatalogId {
    /// Build an identifier, rejecting values wider than 16 digits.
    pub fn new(value: u64) -> Result<Self, BatchError> {
        if value > MAX_IDENTIFIER {
            return Err(BatchError::InvalidIdentifier(value.to_string()));
        }
        Ok(CatalogId(value))
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Zero-padded decimal form used in mission file names.
    ///
    /// ```rust
    /// use eclipse_batch::target::CatalogId;
    ///
    /// let id = CatalogId::new(38846515).unwrap();
    /// assert_eq!(id.padded(), "0000000038846515");
    /// ```
    pub fn padded(&self) -> String {
        format!("{:0width$}", self.0, width = IDENTIFIER_WIDTH)
    }

    /// `true` if the file name of `path` contains the padded identifier.
    pub fn matches_file(&self, path: &Utf8Path) -> bool {
        path.file_name()
            .map(|name| name.contains(&self.padded()))
            .unwrap_or(false)
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CatalogId {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty()
            || trimmed.len() > IDENTIFIER_WIDTH
            || !trimmed.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(BatchError::InvalidIdentifier(s.to_string()));
        }
        let value = trimmed
            .parse::<u64>()
            .map_err(|_| BatchError::InvalidIdentifier(s.to_string()))?;
        CatalogId::new(value)
    }
}

/// One unit of batch work.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A light-curve file (delimited text or FITS).
    Path(Utf8PathBuf),
    /// A catalog identifier resolved against a pool of mission files.
    Identifier(CatalogId),
}

impl Target {
    /// Identity used in log lines and persisted results.
    ///
    /// For files this is the trailing path component, for identifiers the plain
    /// decimal value.
    pub fn identity(&self) -> String {
        match self {
            Target::Path(path) => path
                .file_name()
                .map(str::to_string)
                .unwrap_or_else(|| path.to_string()),
            Target::Identifier(id) => id.to_string(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Path(path) => write!(f, "{path}"),
            Target::Identifier(id) => write!(f, "{id}"),
        }
    }
}

impl From<Utf8PathBuf> for Target {
    fn from(path: Utf8PathBuf) -> Self {
        Target::Path(path)
    }
}

impl From<&Utf8Path> for Target {
    fn from(path: &Utf8Path) -> Self {
        Target::Path(path.to_path_buf())
    }
}

impl From<&str> for Target {
    fn from(path: &str) -> Self {
        Target::Path(Utf8PathBuf::from(path))
    }
}

impl From<CatalogId> for Target {
    fn from(id: CatalogId) -> Self {
        Target::Identifier(id)
    }
}

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").unwrap_or_else(|e| panic!("identifier regex: {e}")));

/// Collect the distinct catalog identifiers embedded in a set of file names.
///
/// Only runs of exactly 16 digits are considered, matching the zero-padded
/// convention of mission products (e.g. `tess2018206045859-s0001-0000000038846515-0120-s_lc.fits`).
///
/// Return
/// ----------
/// * The identifiers found, sorted and deduplicated.
pub fn identifiers_in_file_names<P: AsRef<Utf8Path>>(paths: &[P]) -> Vec<CatalogId> {
    paths
        .iter()
        .filter_map(|p| p.as_ref().file_name())
        .flat_map(|name| {
            DIGIT_RUN
                .find_iter(name)
                .filter(|m| m.len() == IDENTIFIER_WIDTH)
                .filter_map(|m| m.as_str().parse::<CatalogId>().ok())
                .collect::<Vec<_>>()
        })
        .sorted()
        .dedup()
        .collect()
}
