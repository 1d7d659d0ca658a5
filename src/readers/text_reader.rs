//! # Delimited text light curves
//!
//! Load numeric columns from a plain-text table, one sample per line.
//!
//! * With no delimiter, fields are separated by any run of whitespace.
//! * With a delimiter, the file is read with the [`csv`] crate (no header row,
//!   fields trimmed).
//! * Blank lines and lines starting with `#` are ignored.
//! * Every data row must have the same number of fields.
//!
//! Columns are returned **column-major** (`columns[c][row]`), so the first two
//! columns of a light-curve file are directly the time and signal arrays.
use std::fs;

use camino::Utf8Path;
use csv::{ReaderBuilder, Trim};

use crate::batch_errors::BatchError;
use crate::ingest::RawSeries;

fn parse_field(field: &str, line: usize) -> Result<f64, BatchError> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| BatchError::TextParseError {
            line,
            value: field.to_string(),
        })
}

fn push_row(
    columns: &mut Vec<Vec<f64>>,
    row: Vec<f64>,
    line: usize,
) -> Result<(), BatchError> {
    if columns.is_empty() {
        columns.resize(row.len(), Vec::new());
    } else if row.len() != columns.len() {
        return Err(BatchError::RaggedRow {
            line,
            expected: columns.len(),
            found: row.len(),
        });
    }
    for (col, value) in columns.iter_mut().zip(row) {
        col.push(value);
    }
    Ok(())
}

/// Parse text content into columns.
///
/// Arguments
/// -----------------
/// * `content`: The text table.
/// * `delimiter`: Field separator, `None` for whitespace.
///
/// Return
/// ----------
/// * The columns, column-major, or a parse error naming the 1-based line.
pub fn parse_columns(content: &str, delimiter: Option<u8>) -> Result<Vec<Vec<f64>>, BatchError> {
    let mut columns: Vec<Vec<f64>> = Vec::new();

    match delimiter {
        None => {
            for (idx, raw_line) in content.lines().enumerate() {
                let line = raw_line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let row = line
                    .split_whitespace()
                    .map(|f| parse_field(f, idx + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                push_row(&mut columns, row, idx + 1)?;
            }
        }
        Some(delim) => {
            let mut reader = ReaderBuilder::new()
                .delimiter(delim)
                .has_headers(false)
                .comment(Some(b'#'))
                .trim(Trim::All)
                .flexible(true)
                .from_reader(content.as_bytes());

            for record in reader.records() {
                let record = record?;
                let line = record.position().map_or(0, |p| p.line() as usize);
                if record.iter().all(|f| f.is_empty()) {
                    continue;
                }
                let row = record
                    .iter()
                    .map(|f| parse_field(f, line))
                    .collect::<Result<Vec<_>, _>>()?;
                push_row(&mut columns, row, line)?;
            }
        }
    }

    Ok(columns)
}

/// Load all numeric columns of a text file.
pub fn load_columns(path: &Utf8Path, delimiter: Option<u8>) -> Result<Vec<Vec<f64>>, BatchError> {
    let content = fs::read_to_string(path)?;
    parse_columns(&content, delimiter)
}

/// Load the first two columns of a text file as `(times, signal)`.
///
/// Extra columns are ignored; fewer than two columns is an error.
pub fn load_time_series(path: &Utf8Path, delimiter: Option<u8>) -> Result<RawSeries, BatchError> {
    let mut columns = load_columns(path, delimiter)?;
    if columns.len() < 2 {
        return Err(BatchError::NotEnoughColumns {
            expected: 2,
            found: columns.len(),
        });
    }
    columns.truncate(2);
    let signal = columns.pop().unwrap_or_default();
    let times = columns.pop().unwrap_or_default();
    RawSeries::new(times, signal)
}
