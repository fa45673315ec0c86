use std::path::PathBuf;

use thiserror::Error;

/// Why a single input line was rejected. These are absorbed by the pass that
/// encountered them: logged (up to the configured cap), counted, and the scan
/// moves on to the next line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineError {
    #[error("expected at least {expected} fields, found {found}")]
    MalformedLine { expected: usize, found: usize },
    #[error("field {index} is not a number: {value:?}")]
    NonNumericField { index: usize, value: String },
    #[error("coordinate out of range (lat: {lat}, lon: {lon})")]
    OutOfRange { lat: f64, lon: f64 },
}

/// Whole-run failures. Per-line problems never surface here; only conditions
/// that invalidate the entire dataset do.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("no valid coordinate data found in {path:?}")]
    NoValidData { path: PathBuf },
    #[error("input file is not valid UTF-8")]
    NotUtf8(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
