use crate::grid::error::SnapshotError;
use crate::history::error::GroundTruthError;
use crate::meteo::error::MeteoIndexError;
use crate::pipeline::error::DatasetError;
use crate::service::ServiceError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum No2Error {
    #[error(transparent)]
    MeteoIndex(#[from] MeteoIndexError),

    #[error(transparent)]
    GroundTruth(#[from] GroundTruthError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("No snapshot files found")]
    NoSnapshots,

    #[error("The meteorological index holds no stations")]
    NoStations,

    #[error("No ground-truth observations available")]
    NoGroundTruth,

    #[error("Failed to determine cache directory")]
    CacheDirResolution,

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),
}
