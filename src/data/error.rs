//! Error types for the data layer.
//!
//! Library code returns these; the binaries wrap them with `anyhow` context.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort loading a dataset.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("expected a JSON array of record objects")]
    NotRecords,

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: column '{column}' is empty")]
    MissingValue { row: usize, column: String },

    #[error("row {row}: column '{column}' has unsupported type {data_type}")]
    UnsupportedType {
        row: usize,
        column: String,
        data_type: String,
    },

    #[error("row {row}: '{value}' is not a valid date")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: column '{column}' value '{value}' is not a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: customer rating {value} is outside 0-5")]
    RatingOutOfRange { row: usize, value: f64 },

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
}

/// Errors that can occur while writing the filtered rows.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write file: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV writer error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet writer error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("JSON writer error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported export extension: .{0}")]
    UnsupportedExtension(String),
}

/// Misuse of the process-wide dataset cache.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("dataset cache already installed for {0}")]
    AlreadyInstalled(PathBuf),

    #[error("dataset cache has not been installed")]
    NotInstalled,

    #[error(transparent)]
    Load(#[from] LoadError),
}
