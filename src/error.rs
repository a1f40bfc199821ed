//! Typed errors for dataset import and workspace configuration.
//!
//! Transforms never fail on data, so only the file-facing collaborators have
//! error types. The binary wraps these with `anyhow` context.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("File is empty")]
    Empty,
    #[error("No data found in JSON file")]
    NoData,
    #[error("Invalid JSON format")]
    InvalidJson,
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unsupported file format. Please upload a CSV or JSON file.")]
    UnsupportedFormat,
    #[error("Dataset exceeds {limit} row limit ({rows} rows)")]
    TooManyRows { rows: usize, limit: usize },
    #[error("Failed to decode {path:?} as {encoding}")]
    Decode { path: PathBuf, encoding: &'static str },
    #[error("Failed to read file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Page size must be greater than zero")]
    ZeroPageSize,
    #[error("Page size {0} is not one of the configured options {1:?}")]
    PageSizeNotOffered(usize, Vec<usize>),
    #[error("Chart group limit must be greater than zero")]
    ZeroChartLimit,
    #[error("Unknown encoding '{0}'")]
    UnknownEncoding(String),
}
