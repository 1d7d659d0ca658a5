use thiserror::Error;

use crate::detector::DetectionError;
use crate::readers::fits_reader::FitsError;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Error while reading delimited text: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid numeric value at line {line}: {value}")]
    TextParseError { line: usize, value: String },

    #[error("Inconsistent column count at line {line}: expected {expected}, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Not enough columns: expected at least {expected}, found {found}")]
    NotEnoughColumns { expected: usize, found: usize },

    #[error("FITS error: {0}")]
    Fits(#[from] FitsError),

    #[error("Column not found in table: {0}")]
    MissingColumn(String),

    #[error("Length mismatch: {times} times, {signal} signal values, {quality} quality values")]
    LengthMismatch {
        times: usize,
        signal: usize,
        quality: usize,
    },

    #[error("Eclipse detection failed: {0}")]
    Detection(#[from] DetectionError),

    #[error("Unknown adapter name: {0}")]
    UnknownAdapter(String),

    #[error("Invalid worker count: {0}")]
    InvalidWorkerCount(usize),

    #[error("Unable to build the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid catalog identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Target kind not supported by adapter {adapter}: {target}")]
    UnsupportedTarget { adapter: String, target: String },
}

impl PartialEq for BatchError {
    fn eq(&self, other: &Self) -> bool {
        use BatchError::*;
        match (self, other) {
            // Foreign errors are not comparable: equal if same variant
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (ThreadPool(_), ThreadPool(_)) => true,
            (Json(_), Json(_)) => true,

            (
                TextParseError {
                    line: l1,
                    value: v1,
                },
                TextParseError {
                    line: l2,
                    value: v2,
                },
            ) => l1 == l2 && v1 == v2,
            (
                RaggedRow {
                    line: l1,
                    expected: e1,
                    found: f1,
                },
                RaggedRow {
                    line: l2,
                    expected: e2,
                    found: f2,
                },
            ) => l1 == l2 && e1 == e2 && f1 == f2,
            (
                NotEnoughColumns {
                    expected: e1,
                    found: f1,
                },
                NotEnoughColumns {
                    expected: e2,
                    found: f2,
                },
            ) => e1 == e2 && f1 == f2,
            (Fits(a), Fits(b)) => a == b,
            (MissingColumn(a), MissingColumn(b)) => a == b,
            (
                LengthMismatch {
                    times: t1,
                    signal: s1,
                    quality: q1,
                },
                LengthMismatch {
                    times: t2,
                    signal: s2,
                    quality: q2,
                },
            ) => t1 == t2 && s1 == s2 && q1 == q2,
            (Detection(a), Detection(b)) => a == b,
            (UnknownAdapter(a), UnknownAdapter(b)) => a == b,
            (InvalidWorkerCount(a), InvalidWorkerCount(b)) => a == b,
            (InvalidIdentifier(a), InvalidIdentifier(b)) => a == b,
            (
                UnsupportedTarget {
                    adapter: a1,
                    target: t1,
                },
                UnsupportedTarget {
                    adapter: a2,
                    target: t2,
                },
            ) => a1 == a2 && t1 == t2,

            _ => false,
        }
    }
}
