//! Write minimal single-table FITS files.
//!
//! Produces an empty primary HDU followed by one `BINTABLE` extension holding the
//! given scalar columns, in the layout read back by
//! [`FitsFile`](super::fits_reader::FitsFile). Used to export light curves and to
//! build synthetic fixtures.
use std::fs;

use camino::Utf8Path;

use super::fits_reader::{BLOCK_SIZE, CARD_SIZE};
use crate::batch_errors::BatchError;

#[derive(Debug, Clone)]
enum ColumnData {
    F64(Vec<f64>),
    F32(Vec<f32>),
    I32(Vec<i32>),
}

impl ColumnData {
    fn len(&self) -> usize {
        match self {
            ColumnData::F64(v) => v.len(),
            ColumnData::F32(v) => v.len(),
            ColumnData::I32(v) => v.len(),
        }
    }

    fn tform(&self) -> &'static str {
        match self {
            ColumnData::F64(_) => "D",
            ColumnData::F32(_) => "E",
            ColumnData::I32(_) => "J",
        }
    }

    fn width(&self) -> usize {
        match self {
            ColumnData::F64(_) => 8,
            ColumnData::F32(_) | ColumnData::I32(_) => 4,
        }
    }

    /// Big-endian bytes of row `row`, zero-filled past the end of the column.
    fn write_row(&self, row: usize, out: &mut Vec<u8>) {
        match self {
            ColumnData::F64(v) => out.extend(v.get(row).copied().unwrap_or(0.0).to_be_bytes()),
            ColumnData::F32(v) => out.extend(v.get(row).copied().unwrap_or(0.0).to_be_bytes()),
            ColumnData::I32(v) => out.extend(v.get(row).copied().unwrap_or(0).to_be_bytes()),
        }
    }
}

/// Builder for a one-table FITS file.
///
/// Columns shorter than the longest one are zero-filled.
#[derive(Debug, Clone, Default)]
pub struct BinTableBuilder {
    columns: Vec<(String, ColumnData)>,
}

fn value_card(keyword: &str, value: &str) -> String {
    format!("{keyword:<8}= {value:>20}")
}

fn string_card(keyword: &str, value: &str) -> String {
    let quoted = format!("'{:<8}'", value.replace('\'', "''"));
    format!("{keyword:<8}= {quoted:<20}")
}

fn push_header(cards: &[String], out: &mut Vec<u8>) {
    let start = out.len();
    for card in cards.iter().map(String::as_str).chain(std::iter::once("END")) {
        out.extend(format!("{card:<width$}", width = CARD_SIZE).bytes().take(CARD_SIZE));
    }
    pad(out, start, b' ');
}

fn pad(out: &mut Vec<u8>, start: usize, fill: u8) {
    let size = out.len() - start;
    out.resize(start + size.div_ceil(BLOCK_SIZE) * BLOCK_SIZE, fill);
}

impl BinTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn f64_column(mut self, name: &str, values: Vec<f64>) -> Self {
        self.columns.push((name.to_string(), ColumnData::F64(values)));
        self
    }

    pub fn f32_column(mut self, name: &str, values: Vec<f32>) -> Self {
        self.columns.push((name.to_string(), ColumnData::F32(values)));
        self
    }

    pub fn i32_column(mut self, name: &str, values: Vec<i32>) -> Self {
        self.columns.push((name.to_string(), ColumnData::I32(values)));
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let n_rows = self.columns.iter().map(|(_, c)| c.len()).max().unwrap_or(0);
        let row_size: usize = self.columns.iter().map(|(_, c)| c.width()).sum();

        let mut out = Vec::new();
        push_header(
            &[
                value_card("SIMPLE", "T"),
                value_card("BITPIX", "8"),
                value_card("NAXIS", "0"),
                value_card("EXTEND", "T"),
            ],
            &mut out,
        );

        let mut cards = vec![
            string_card("XTENSION", "BINTABLE"),
            value_card("BITPIX", "8"),
            value_card("NAXIS", "2"),
            value_card("NAXIS1", &row_size.to_string()),
            value_card("NAXIS2", &n_rows.to_string()),
            value_card("PCOUNT", "0"),
            value_card("GCOUNT", "1"),
            value_card("TFIELDS", &self.columns.len().to_string()),
        ];
        for (i, (name, data)) in self.columns.iter().enumerate() {
            cards.push(string_card(&format!("TTYPE{}", i + 1), name));
            cards.push(string_card(&format!("TFORM{}", i + 1), data.tform()));
        }
        push_header(&cards, &mut out);

        let start = out.len();
        for row in 0..n_rows {
            for (_, data) in &self.columns {
                data.write_row(row, &mut out);
            }
        }
        pad(&mut out, start, 0);
        out
    }

    pub fn write(&self, path: &Utf8Path) -> Result<(), BatchError> {
        fs::write(path, self.to_bytes())?;
        Ok(())
    }
}
