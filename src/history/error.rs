use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GroundTruthError {
    #[error("Failed to read ground-truth CSV '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Required column '{column}' not found in ground-truth CSV '{path}'")]
    ColumnNotFound {
        path: PathBuf,
        column: String,
        #[source]
        source: PolarsError,
    },

    #[error("Column '{column}' in ground-truth CSV '{path}' has an unusable type")]
    ColumnType {
        path: PathBuf,
        column: String,
        #[source]
        source: PolarsError,
    },
}
