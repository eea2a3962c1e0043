use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse snapshot JSON in '{0}'")]
    JsonParse(PathBuf, #[source] serde_json::Error),

    #[error("Snapshot file name '{0}' has no acquisition timestamp token")]
    MissingTimestamp(String),

    #[error("Invalid acquisition timestamp '{token}' in snapshot file name '{file_name}'")]
    InvalidTimestamp {
        file_name: String,
        token: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Failed to list snapshot directory '{0}'")]
    DirectoryRead(PathBuf, #[source] std::io::Error),
}
