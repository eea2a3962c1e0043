use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to assemble dataset frame")]
    Frame(#[source] PolarsError),

    #[error("Failed to create output file '{0}'")]
    FileCreate(PathBuf, #[source] std::io::Error),

    #[error("Failed to write dataset to '{0}'")]
    Write(PathBuf, #[source] PolarsError),

    #[error("Unsupported dataset format for '{0}', expected .parquet or .csv")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to write feature names to '{0}'")]
    FeatureNames(PathBuf, #[source] serde_json::Error),
}
