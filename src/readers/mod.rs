//! # Light-curve readers
//!
//! Data sources feeding the adapters.
//!
//! Modules
//! -----------------
//! * [`text_reader`](crate::readers::text_reader) – Delimited or whitespace-separated numeric text.
//! * [`fits_reader`](crate::readers::fits_reader) – Minimal FITS `BINTABLE` reader.
//! * [`fits_writer`](crate::readers::fits_writer) – Minimal FITS `BINTABLE` writer (fixtures, export).
//!
//! The identifier-based adapter reads its tables through the [`TableReader`] trait so
//! that the storage format can be swapped (e.g. in-memory tables in tests).
use camino::Utf8Path;

use crate::batch_errors::BatchError;

pub mod fits_reader;
pub mod fits_writer;
pub mod text_reader;

/// Column-oriented numeric table, columns kept in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<(String, Vec<f64>)>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a column.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, col)) => *col = values,
            None => self.columns.push((name, values)),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert(name, values);
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Like [`Table::column`], with a [`BatchError::MissingColumn`] on absence.
    pub fn require(&self, name: &str) -> Result<&[f64], BatchError> {
        self.column(name)
            .ok_or_else(|| BatchError::MissingColumn(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }
}

/// Source of numeric tables stored in files.
pub trait TableReader: Send + Sync {
    /// Read the table stored at extension `index` of `path`.
    fn read_table(&self, path: &Utf8Path, index: usize) -> Result<Table, BatchError>;
}

/// [`TableReader`] backed by FITS binary tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitsReader;

impl TableReader for FitsReader {
    fn read_table(&self, path: &Utf8Path, index: usize) -> Result<Table, BatchError> {
        let fits = fits_reader::FitsFile::open(path)?;
        let table = fits.bintable(index)?.to_table()?;
        Ok(table)
    }
}
