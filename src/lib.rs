mod error;
mod features;
mod geodesy;
mod grid;
mod history;
mod meteo;
mod physics;
mod pipeline;
mod service;
mod types;
mod utils;

pub use error::No2Error;

pub use geodesy::{flat_distance_km, haversine_km, project, EARTH_RADIUS_KM, KM_PER_DEGREE};
pub use physics::PhysicsModel;
pub use utils::{ensure_cache_dir_exists, get_cache_dir};

pub use types::feature_vector::{FeatureVector, FEATURE_NAMES};
pub use types::grid_cell::GridCell;
pub use types::location::Location;
pub use types::meteo_conditions::{MeteoConditions, MeteoVariable};
pub use types::station_id::StationId;

pub use grid::cell_store::GridCellStore;
pub use grid::error::SnapshotError;
pub use grid::snapshot::{list_snapshots, snapshot_timestamp, JsonSnapshotParser, SnapshotParser};
pub use grid::stats::CellStats;

pub use meteo::error::MeteoIndexError;
pub use meteo::index::{MeteoIndex, DEFAULT_NEIGHBORS};
pub use meteo::station::{parse_time, HourlySeries, MeteoStation, OpenMeteoDocument};

pub use history::aggregator::{HistoricalFeatures, HistoricalIndex, TIMESTAMP_KEY_FORMAT};
pub use history::error::GroundTruthError;
pub use history::ground_truth::{
    ground_truth_from_dataframe, load_ground_truth_csv, GroundTruth, GroundTruthObservation,
};

pub use features::extractor::FeatureExtractor;
pub use features::geographic::{urban_proximity, ReferenceCity, UrbanProximity, REFERENCE_CITIES};

pub use pipeline::builder::DatasetBuilder;
pub use pipeline::config::PipelineConfig;
pub use pipeline::dataset::{write_feature_names, Dataset, SkipCounts, TrainingSample};
pub use pipeline::error::DatasetError;

pub use service::{PredictionService, Regressor, ServiceError};
