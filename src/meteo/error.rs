use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeteoIndexError {
    #[error("Failed to list meteorological data directory '{0}'")]
    DirectoryRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to read meteorological station file '{0}'")]
    FileRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse meteorological station JSON in '{0}'")]
    JsonParse(PathBuf, #[source] serde_json::Error),

    #[error("Station '{0}' has no coordinates")]
    MissingCoordinates(String),

    #[error("Station '{0}' has no hourly timestamps")]
    NoHourlyData(String),

    #[error("Station '{station}' has an unparseable timestamp '{value}'")]
    InvalidTimestamp {
        station: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("No meteorological stations could be loaded from '{0}'")]
    NoStations(PathBuf),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read cache file '{0}'")]
    CacheRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write cache file '{0}'")]
    CacheWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode cache data from '{0}'")]
    CacheDecode(PathBuf, #[source] Box<bincode::error::DecodeError>),

    #[error("Failed to encode cache data")]
    CacheEncode(#[source] Box<bincode::error::EncodeError>),
}
