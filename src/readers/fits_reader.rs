//! # Minimal FITS binary-table reader
//!
//! Just enough of the FITS standard to read mission light-curve products:
//!
//! * the file is a sequence of HDUs, each made of a header and a data unit, both
//!   padded to 2880-byte blocks;
//! * a header is a list of 80-byte cards terminated by an `END` card;
//! * `BINTABLE` extensions store fixed-width rows, big-endian, described by the
//!   `TTYPEn` / `TFORMn` / `TSCALn` / `TZEROn` keywords.
//!
//! Scalar numeric columns (`L`, `B`, `I`, `J`, `K`, `E`, `D` with a repeat count of
//! 1) are decoded to `f64` with the linear scaling applied. Other columns (strings,
//! vectors, variable-length arrays) are skipped by [`BinTable::to_table`].
//!
//! Header cards and binary fields are decoded with [`nom`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use camino::Utf8Path;
//! use eclipse_batch::readers::fits_reader::FitsFile;
//!
//! let fits = FitsFile::open(Utf8Path::new("tess_lc.fits")).unwrap();
//! let table = fits.bintable(1).unwrap();
//! let time = table.column_f64("TIME").unwrap();
//! println!("{} samples", time.len());
//! ```
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take},
    character::complete::{anychar, char, digit1},
    combinator::{map, opt},
    multi::many0,
    number::complete::{be_f32, be_f64, be_i16, be_i32, be_i64, u8 as be_u8},
    sequence::{delimited, pair},
    IResult,
};
use thiserror::Error;

use super::Table;

/// Size of a FITS logical record.
pub const BLOCK_SIZE: usize = 2880;
/// Size of a header card.
pub const CARD_SIZE: usize = 80;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitsError {
    #[error("File truncated: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("Header without END card")]
    MissingEnd,

    #[error("Invalid header card: {0}")]
    InvalidCard(String),

    #[error("Missing header keyword: {0}")]
    MissingKeyword(String),

    #[error("HDU {0} not found")]
    HduNotFound(usize),

    #[error("HDU {0} is not a binary table")]
    NotABinaryTable(usize),

    #[error("Unsupported column format {format} for column {column}")]
    UnsupportedFormat { column: String, format: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),
}

/// A header card value.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Str(String),
    Int(i64),
    Float(f64),
    Logical(bool),
}

/// Ordered header of one HDU.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Header {
    cards: Vec<(String, HeaderValue)>,
}

impl Header {
    pub fn get(&self, keyword: &str) -> Option<&HeaderValue> {
        self.cards
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, v)| v)
    }

    pub fn get_int(&self, keyword: &str) -> Option<i64> {
        match self.get(keyword)? {
            HeaderValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn get_float(&self, keyword: &str) -> Option<f64> {
        match self.get(keyword)? {
            HeaderValue::Int(i) => Some(*i as f64),
            HeaderValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn get_str(&self, keyword: &str) -> Option<&str> {
        match self.get(keyword)? {
            HeaderValue::Str(s) => Some(s),
            _ => None,
        }
    }

    fn require_int(&self, keyword: &str) -> Result<i64, FitsError> {
        self.get_int(keyword)
            .ok_or_else(|| FitsError::MissingKeyword(keyword.to_string()))
    }

    /// Non-negative integer keyword as a count.
    fn require_count(&self, keyword: &str) -> Result<usize, FitsError> {
        let value = self.require_int(keyword)?;
        usize::try_from(value).map_err(|_| FitsError::InvalidCard(format!("{keyword} = {value}")))
    }

    fn count_or(&self, keyword: &str, default: usize) -> Result<usize, FitsError> {
        match self.get(keyword) {
            Some(_) => self.require_count(keyword),
            None => Ok(default),
        }
    }

    /// Size in bytes of the data unit described by this header (unpadded).
    fn data_size(&self) -> Result<usize, FitsError> {
        let naxis = self.require_count("NAXIS")?;
        if naxis == 0 {
            return Ok(0);
        }
        let overflow = || FitsError::InvalidCard("data unit size overflows".into());

        let bitpix = self.require_int("BITPIX")?;
        let bytes_per_element = usize::try_from(bitpix.unsigned_abs() / 8).map_err(|_| overflow())?;
        let mut elements: usize = 1;
        for i in 1..=naxis {
            elements = elements
                .checked_mul(self.require_count(&format!("NAXIS{i}"))?)
                .ok_or_else(overflow)?;
        }
        let pcount = self.count_or("PCOUNT", 0)?;
        let gcount = self.count_or("GCOUNT", 1)?;

        pcount
            .checked_add(elements)
            .and_then(|n| n.checked_mul(gcount))
            .and_then(|n| n.checked_mul(bytes_per_element))
            .ok_or_else(overflow)
    }
}

fn quoted_string(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('\''),
            many0(alt((map(tag("''"), |_| "'"), is_not("'")))),
            char('\''),
        ),
        |parts: Vec<&str>| parts.concat().trim_end().to_string(),
    )(input)
}

fn parse_value(raw: &str) -> Result<HeaderValue, FitsError> {
    let raw = raw.trim_start();
    if raw.starts_with('\'') {
        return quoted_string(raw)
            .map(|(_, s)| HeaderValue::Str(s))
            .map_err(|_| FitsError::InvalidCard(raw.to_string()));
    }
    let value = raw.split('/').next().unwrap_or("").trim();
    match value {
        "T" => Ok(HeaderValue::Logical(true)),
        "F" => Ok(HeaderValue::Logical(false)),
        _ => {
            if let Ok(i) = value.parse::<i64>() {
                Ok(HeaderValue::Int(i))
            } else {
                value
                    .replace(['D', 'd'], "E")
                    .parse::<f64>()
                    .map(HeaderValue::Float)
                    .map_err(|_| FitsError::InvalidCard(value.to_string()))
            }
        }
    }
}

/// Split one card into keyword, value indicator and value field.
fn card(input: &[u8]) -> IResult<&[u8], (&[u8], &[u8], &[u8])> {
    let (input, keyword) = take(8usize)(input)?;
    let (input, indicator) = take(2usize)(input)?;
    let (input, value) = take(70usize)(input)?;
    Ok((input, (keyword, indicator, value)))
}

/// Parse a header starting at `offset`.
///
/// Return
/// ----------
/// * The header and the offset of its data unit (header padded to a block boundary).
fn parse_header(bytes: &[u8], offset: usize) -> Result<(Header, usize), FitsError> {
    let mut header = Header::default();
    let mut pos = offset;
    loop {
        let slice = bytes.get(pos..pos + CARD_SIZE).ok_or(if pos == offset {
            FitsError::Truncated {
                offset: pos,
                needed: CARD_SIZE,
            }
        } else {
            FitsError::MissingEnd
        })?;
        let (_, (keyword, indicator, value)) = card(slice).map_err(|_| FitsError::Truncated {
            offset: pos,
            needed: CARD_SIZE,
        })?;
        pos += CARD_SIZE;

        let keyword = String::from_utf8_lossy(keyword).trim().to_string();
        if keyword == "END" {
            break;
        }
        if indicator != b"= " || keyword.is_empty() {
            continue; // COMMENT, HISTORY, blank cards
        }
        let value = parse_value(&String::from_utf8_lossy(value))?;
        header.cards.push((keyword, value));
    }
    Ok((header, pad_to_block(pos - offset) + offset))
}

#[inline]
fn pad_to_block(size: usize) -> usize {
    size.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

/// One header/data unit.
#[derive(Debug, Clone)]
pub struct Hdu {
    pub header: Header,
    data_range: (usize, usize),
}

/// In-memory FITS file.
#[derive(Debug, Clone)]
pub struct FitsFile {
    bytes: Vec<u8>,
    hdus: Vec<Hdu>,
}

/// Append `.fits` unless the path already ends in `.fits` or `.fit`.
pub fn resolve_fits_path(path: &Utf8Path) -> Utf8PathBuf {
    let s = path.as_str();
    if s.ends_with(".fits") || s.ends_with(".fit") {
        path.to_path_buf()
    } else {
        Utf8PathBuf::from(format!("{s}.fits"))
    }
}

impl FitsFile {
    /// Read and index a FITS file (see [`resolve_fits_path`] for the extension rule).
    pub fn open(path: &Utf8Path) -> Result<Self, crate::batch_errors::BatchError> {
        let bytes = fs::read(resolve_fits_path(path))?;
        Ok(FitsFile::from_bytes(bytes)?)
    }

    /// Index every HDU of an in-memory FITS file.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, FitsError> {
        let mut hdus = Vec::new();
        let mut offset = 0;
        while offset < bytes.len() {
            let (header, data_start) = parse_header(&bytes, offset)?;
            let data_size = header.data_size()?;
            let data_end = data_start
                .checked_add(data_size)
                .filter(|&end| end <= bytes.len())
                .ok_or(FitsError::Truncated {
                    offset: data_start,
                    needed: data_size,
                })?;
            hdus.push(Hdu {
                header,
                data_range: (data_start, data_end),
            });
            offset = data_start + pad_to_block(data_size);
        }
        Ok(FitsFile { bytes, hdus })
    }

    pub fn n_hdus(&self) -> usize {
        self.hdus.len()
    }

    pub fn hdu(&self, index: usize) -> Result<&Hdu, FitsError> {
        self.hdus.get(index).ok_or(FitsError::HduNotFound(index))
    }

    /// View HDU `index` as a binary table.
    pub fn bintable(&self, index: usize) -> Result<BinTable<'_>, FitsError> {
        let hdu = self.hdu(index)?;
        if hdu.header.get_str("XTENSION") != Some("BINTABLE") {
            return Err(FitsError::NotABinaryTable(index));
        }
        let row_size = hdu.header.require_count("NAXIS1")?;
        let n_rows = hdu.header.require_count("NAXIS2")?;
        let n_fields = hdu.header.require_count("TFIELDS")?;

        let (start, end) = hdu.data_range;
        let table_size = row_size.checked_mul(n_rows).unwrap_or(usize::MAX);
        if table_size > end - start {
            return Err(FitsError::Truncated {
                offset: start,
                needed: table_size,
            });
        }

        let mut columns = Vec::with_capacity(n_fields);
        let mut offset = 0;
        for i in 1..=n_fields {
            let name = hdu
                .header
                .get_str(&format!("TTYPE{i}"))
                .map(str::to_string)
                .unwrap_or_else(|| format!("COL{i}"));
            let tform = hdu
                .header
                .get_str(&format!("TFORM{i}"))
                .ok_or_else(|| FitsError::MissingKeyword(format!("TFORM{i}")))?;
            let format = ColumnFormat::parse(tform).ok_or_else(|| FitsError::UnsupportedFormat {
                column: name.clone(),
                format: tform.to_string(),
            })?;
            let width = format.width();
            columns.push(ColumnDesc {
                name,
                format,
                offset,
                scale: hdu.header.get_float(&format!("TSCAL{i}")).unwrap_or(1.0),
                zero: hdu.header.get_float(&format!("TZERO{i}")).unwrap_or(0.0),
            });
            offset = offset
                .checked_add(width)
                .filter(|&o| o <= row_size)
                .ok_or_else(|| FitsError::InvalidCard(format!("TFORM{i} exceeds NAXIS1")))?;
        }

        Ok(BinTable {
            data: &self.bytes[start..end],
            row_size,
            n_rows,
            columns,
        })
    }
}

/// Decoded `TFORMn` value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnFormat {
    pub repeat: usize,
    pub code: char,
}

impl ColumnFormat {
    /// Parse `rT[a]`, e.g. `D`, `1E`, `16A`.
    pub fn parse(tform: &str) -> Option<Self> {
        let parsed: IResult<&str, (Option<&str>, char)> = pair(opt(digit1), anychar)(tform.trim());
        let (_, (repeat, code)) = parsed.ok()?;
        let repeat = repeat.map_or(Some(1), |r| r.parse().ok())?;
        Some(ColumnFormat { repeat, code })
    }

    /// Width in bytes of one field of this format.
    pub fn width(&self) -> usize {
        match self.code {
            'L' | 'B' | 'A' => self.repeat,
            'X' => self.repeat.div_ceil(8),
            'I' => self.repeat.saturating_mul(2),
            'J' | 'E' => self.repeat.saturating_mul(4),
            'K' | 'D' | 'C' | 'P' => self.repeat.saturating_mul(8),
            'M' | 'Q' => self.repeat.saturating_mul(16),
            _ => 0,
        }
    }

    fn is_numeric_scalar(&self) -> bool {
        self.repeat == 1 && matches!(self.code, 'L' | 'B' | 'I' | 'J' | 'K' | 'E' | 'D')
    }
}

#[derive(Debug, Clone)]
struct ColumnDesc {
    name: String,
    format: ColumnFormat,
    offset: usize,
    scale: f64,
    zero: f64,
}

fn decode(format: ColumnFormat, input: &[u8]) -> IResult<&[u8], f64> {
    match format.code {
        'L' => map(be_u8, |b| match b {
            b'T' => 1.0,
            b'F' => 0.0,
            _ => f64::NAN,
        })(input),
        'B' => map(be_u8, f64::from)(input),
        'I' => map(be_i16, f64::from)(input),
        'J' => map(be_i32, f64::from)(input),
        'K' => map(be_i64, |v| v as f64)(input),
        'E' => map(be_f32, f64::from)(input),
        _ => be_f64(input),
    }
}

/// Borrowed view on a `BINTABLE` HDU.
#[derive(Debug, Clone)]
pub struct BinTable<'a> {
    data: &'a [u8],
    row_size: usize,
    n_rows: usize,
    columns: Vec<ColumnDesc>,
}

impl BinTable<'_> {
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Decode a scalar numeric column, with `TSCAL`/`TZERO` applied.
    pub fn column_f64(&self, name: &str) -> Result<Vec<f64>, FitsError> {
        let desc = self
            .columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| FitsError::ColumnNotFound(name.to_string()))?;
        self.decode_column(desc)
    }

    fn decode_column(&self, desc: &ColumnDesc) -> Result<Vec<f64>, FitsError> {
        if !desc.format.is_numeric_scalar() {
            return Err(FitsError::UnsupportedFormat {
                column: desc.name.clone(),
                format: format!("{}{}", desc.format.repeat, desc.format.code),
            });
        }
        (0..self.n_rows)
            .map(|row| {
                let start = row * self.row_size + desc.offset;
                let field = self.data.get(start..start + desc.format.width()).ok_or(
                    FitsError::Truncated {
                        offset: start,
                        needed: desc.format.width(),
                    },
                )?;
                let (_, raw) = decode(desc.format, field).map_err(|_| FitsError::Truncated {
                    offset: start,
                    needed: desc.format.width(),
                })?;
                Ok(raw * desc.scale + desc.zero)
            })
            .collect()
    }

    /// Decode every scalar numeric column into a [`Table`].
    pub fn to_table(&self) -> Result<Table, FitsError> {
        let mut table = Table::default();
        for desc in self.columns.iter().filter(|c| c.format.is_numeric_scalar()) {
            table.insert(desc.name.clone(), self.decode_column(desc)?);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod fits_reader_test {
    use super::*;
    use crate::readers::fits_writer::BinTableBuilder;

    #[test]
    fn test_parse_value() {
        assert_eq!(
            parse_value("'BINTABLE'           / binary table"),
            Ok(HeaderValue::Str("BINTABLE".into()))
        );
        assert_eq!(
            parse_value("'O''HARA  '"),
            Ok(HeaderValue::Str("O'HARA".into()))
        );
        assert_eq!(parse_value("                   T"), Ok(HeaderValue::Logical(true)));
        assert_eq!(parse_value("                  42 / answer"), Ok(HeaderValue::Int(42)));
        assert_eq!(parse_value("              1.5D2"), Ok(HeaderValue::Float(150.0)));
        assert!(parse_value("   what").is_err());
    }

    #[test]
    fn test_column_format() {
        assert_eq!(
            ColumnFormat::parse("D"),
            Some(ColumnFormat {
                repeat: 1,
                code: 'D'
            })
        );
        let f = ColumnFormat::parse("16A").unwrap();
        assert_eq!(f.width(), 16);
        assert_eq!(ColumnFormat::parse("11X").unwrap().width(), 2);
        assert_eq!(ColumnFormat::parse("").map(|f| f.code), None);
    }

    #[test]
    fn test_resolve_fits_path() {
        assert_eq!(resolve_fits_path(Utf8Path::new("a/b.fits")), "a/b.fits");
        assert_eq!(resolve_fits_path(Utf8Path::new("a/b.fit")), "a/b.fit");
        assert_eq!(resolve_fits_path(Utf8Path::new("a/b")), "a/b.fits");
    }

    #[test]
    fn test_read_written_table() {
        let bytes = BinTableBuilder::new()
            .f64_column("TIME", vec![1.0, 2.0, 3.0])
            .f32_column("SAP_FLUX", vec![10.0, f32::NAN, 30.0])
            .i32_column("QUALITY", vec![0, 128, 0])
            .to_bytes();
        assert_eq!(bytes.len() % BLOCK_SIZE, 0);

        let fits = FitsFile::from_bytes(bytes).unwrap();
        assert_eq!(fits.n_hdus(), 2);
        assert_eq!(fits.bintable(0).unwrap_err(), FitsError::NotABinaryTable(0));
        assert_eq!(fits.bintable(2).unwrap_err(), FitsError::HduNotFound(2));

        let table = fits.bintable(1).unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.column_names(), vec!["TIME", "SAP_FLUX", "QUALITY"]);
        assert_eq!(table.column_f64("TIME").unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(table.column_f64("QUALITY").unwrap(), vec![0.0, 128.0, 0.0]);
        let flux = table.column_f64("SAP_FLUX").unwrap();
        assert!(flux[1].is_nan());
        assert_eq!(flux[2], 30.0);
        assert_eq!(
            table.column_f64("PDCSAP_FLUX").unwrap_err(),
            FitsError::ColumnNotFound("PDCSAP_FLUX".into())
        );
    }

    #[test]
    fn test_truncated_file() {
        let mut bytes = BinTableBuilder::new()
            .f64_column("TIME", vec![1.0; 1000])
            .to_bytes();
        bytes.truncate(bytes.len() - BLOCK_SIZE);
        assert!(matches!(
            FitsFile::from_bytes(bytes),
            Err(FitsError::Truncated { .. })
        ));
    }

    /// Header blocks from `(keyword, value)` cards, each HDU terminated by `END`.
    fn raw_hdus(hdus: &[&[(&str, &str)]]) -> Vec<u8> {
        let mut out = Vec::new();
        for cards in hdus {
            let start = out.len();
            for (keyword, value) in cards.iter() {
                out.extend(format!("{keyword:<8}= {value:>20}{:50}", "").bytes());
            }
            out.extend(format!("{:<80}", "END").bytes());
            out.resize(start + pad_to_block(out.len() - start), b' ');
        }
        out
    }

    const PRIMARY: &[(&str, &str)] = &[("SIMPLE", "T"), ("BITPIX", "8"), ("NAXIS", "0")];

    #[test]
    fn test_oversized_axes_are_rejected() {
        let bytes = raw_hdus(&[
            PRIMARY,
            &[
                ("XTENSION", "'BINTABLE'"),
                ("BITPIX", "8"),
                ("NAXIS", "2"),
                ("NAXIS1", "4294967296"),
                ("NAXIS2", "4294967296"),
                ("TFIELDS", "1"),
            ],
        ]);
        assert!(matches!(
            FitsFile::from_bytes(bytes),
            Err(FitsError::InvalidCard(_) | FitsError::Truncated { .. })
        ));
    }

    #[test]
    fn test_negative_counts_are_rejected() {
        let bytes = raw_hdus(&[
            PRIMARY,
            &[
                ("XTENSION", "'BINTABLE'"),
                ("BITPIX", "8"),
                ("NAXIS", "2"),
                ("NAXIS1", "-8"),
                ("NAXIS2", "3"),
                ("TFIELDS", "1"),
            ],
        ]);
        assert_eq!(
            FitsFile::from_bytes(bytes).unwrap_err(),
            FitsError::InvalidCard("NAXIS1 = -8".into())
        );
    }

    #[test]
    fn test_columns_wider_than_row() {
        // 8-byte data unit, but rows declared 0 bytes wide
        let mut bytes = raw_hdus(&[
            PRIMARY,
            &[
                ("XTENSION", "'BINTABLE'"),
                ("BITPIX", "8"),
                ("NAXIS", "2"),
                ("NAXIS1", "0"),
                ("NAXIS2", "1"),
                ("PCOUNT", "8"),
                ("TFIELDS", "1"),
                ("TFORM1", "'D'"),
            ],
        ]);
        bytes.resize(bytes.len() + BLOCK_SIZE, 0);

        let fits = FitsFile::from_bytes(bytes).unwrap();
        assert_eq!(
            fits.bintable(1).unwrap_err(),
            FitsError::InvalidCard("TFORM1 exceeds NAXIS1".into())
        );
    }
}
