//! Accumulated training samples and their on-disk forms.

use crate::pipeline::error::DatasetError;
use crate::types::feature_vector::{FeatureVector, FEATURE_NAMES};
use crate::types::station_id::StationId;
use chrono::NaiveDateTime;
use log::info;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::ops::AddAssign;
use std::path::Path;

pub const TARGET_COLUMN: &str = "target";
pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const STATION_COLUMN: &str = "station_id";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One feature vector paired with the surface measurement it should predict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub station_id: StationId,
    /// Acquisition time of the snapshot the features come from; used for
    /// temporal train/test splits.
    pub timestamp: NaiveDateTime,
    pub features: FeatureVector,
    /// Ground-truth concentration in ppb.
    pub target: f64,
}

/// Why candidate records were dropped during a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkipCounts {
    /// Snapshot could not be parsed or its file name carries no timestamp.
    pub unreadable_snapshots: usize,
    pub empty_snapshots: usize,
    /// No observation fell inside the time window.
    pub snapshots_without_observations: usize,
    /// Observations beyond the per-snapshot cap.
    pub capped_observations: usize,
    /// Center column density non-finite or non-positive.
    pub invalid_center: usize,
    /// Ground-truth value non-finite or negative.
    pub invalid_target: usize,
    pub non_finite_features: usize,
}

impl SkipCounts {
    pub fn total_records(&self) -> usize {
        self.capped_observations
            + self.invalid_center
            + self.invalid_target
            + self.non_finite_features
    }
}

impl AddAssign for SkipCounts {
    fn add_assign(&mut self, other: Self) {
        self.unreadable_snapshots += other.unreadable_snapshots;
        self.empty_snapshots += other.empty_snapshots;
        self.snapshots_without_observations += other.snapshots_without_observations;
        self.capped_observations += other.capped_observations;
        self.invalid_center += other.invalid_center;
        self.invalid_target += other.invalid_target;
        self.non_finite_features += other.non_finite_features;
    }
}

/// The result of a dataset build.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub samples: Vec<TrainingSample>,
    pub skips: SkipCounts,
    pub snapshots_processed: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// One column per feature in [`FEATURE_NAMES`] order, followed by
    /// `target`, `timestamp` and `station_id`.
    pub fn to_dataframe(&self) -> Result<DataFrame, DatasetError> {
        let rows: Vec<Vec<f64>> = self.samples.iter().map(|s| s.features.to_values()).collect();

        let mut columns: Vec<Column> = FEATURE_NAMES
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values: Vec<f64> = rows.iter().map(|row| row[idx]).collect();
                Column::new((*name).into(), values)
            })
            .collect();

        let targets: Vec<f64> = self.samples.iter().map(|s| s.target).collect();
        let timestamps: Vec<String> = self
            .samples
            .iter()
            .map(|s| s.timestamp.format(TIMESTAMP_FORMAT).to_string())
            .collect();
        let stations: Vec<&str> = self.samples.iter().map(|s| s.station_id.as_str()).collect();

        columns.push(Column::new(TARGET_COLUMN.into(), targets));
        columns.push(Column::new(TIMESTAMP_COLUMN.into(), timestamps));
        columns.push(Column::new(STATION_COLUMN.into(), stations));

        DataFrame::new(columns).map_err(DatasetError::Frame)
    }

    /// Writes the dataset as Parquet (Snappy) or CSV, chosen by the
    /// extension of `path`.
    pub fn write(&self, path: &Path) -> Result<(), DatasetError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        let mut df = self.to_dataframe()?;

        match extension.as_deref() {
            Some("parquet") => {
                let file = File::create(path)
                    .map_err(|e| DatasetError::FileCreate(path.to_path_buf(), e))?;
                ParquetWriter::new(file)
                    .with_compression(ParquetCompression::Snappy)
                    .finish(&mut df)
                    .map_err(|e| DatasetError::Write(path.to_path_buf(), e))?;
            }
            Some("csv") => {
                let mut file = File::create(path)
                    .map_err(|e| DatasetError::FileCreate(path.to_path_buf(), e))?;
                CsvWriter::new(&mut file)
                    .include_header(true)
                    .finish(&mut df)
                    .map_err(|e| DatasetError::Write(path.to_path_buf(), e))?;
            }
            _ => return Err(DatasetError::UnsupportedFormat(path.to_path_buf())),
        }

        info!("Wrote {} samples to {}", self.samples.len(), path.display());
        Ok(())
    }
}

/// Persists the positional feature order as a JSON list, the contract a
/// trained model is matched against.
pub fn write_feature_names(path: &Path) -> Result<(), DatasetError> {
    let file = File::create(path).map_err(|e| DatasetError::FileCreate(path.to_path_buf(), e))?;
    serde_json::to_writer_pretty(file, FEATURE_NAMES)
        .map_err(|e| DatasetError::FeatureNames(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample(target: f64) -> TrainingSample {
        let features = FeatureVector {
            no2_column_center: 5e15,
            gradient_ns: 1.5,
            ..Default::default()
        };
        TrainingSample {
            station_id: StationId::from("6_037_1103"),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 10)
                .unwrap()
                .and_hms_opt(14, 16, 10)
                .unwrap(),
            features,
            target,
        }
    }

    fn dataset() -> Dataset {
        Dataset {
            samples: vec![sample(21.0), sample(8.5)],
            ..Default::default()
        }
    }

    #[test]
    fn test_dataframe_layout() {
        let df = dataset().to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), FEATURE_NAMES.len() + 3);

        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(&names[..FEATURE_NAMES.len()], FEATURE_NAMES);
        assert_eq!(names[FEATURE_NAMES.len()], TARGET_COLUMN);

        let gradient = df.column("gradient_NS").unwrap().f64().unwrap().get(0);
        assert_eq!(gradient, Some(1.5));
        let target = df.column(TARGET_COLUMN).unwrap().f64().unwrap().get(1);
        assert_eq!(target, Some(8.5));
        let timestamp = df.column(TIMESTAMP_COLUMN).unwrap().str().unwrap().get(0);
        assert_eq!(timestamp, Some("2024-01-10 14:16:10"));
    }

    #[test]
    fn test_write_parquet_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let data = dataset();

        let parquet = dir.path().join("samples.parquet");
        data.write(&parquet).unwrap();
        let file = File::open(&parquet).unwrap();
        let read_back = ParquetReader::new(file).finish().unwrap();
        assert_eq!(read_back.height(), 2);
        assert_eq!(read_back.width(), FEATURE_NAMES.len() + 3);

        let csv = dir.path().join("samples.csv");
        data.write(&csv).unwrap();
        let content = std::fs::read_to_string(&csv).unwrap();
        assert!(content.starts_with("no2_column_center,urban_proximity_index,"));
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = dataset().write(&dir.path().join("samples.xlsx")).unwrap_err();
        assert!(matches!(err, DatasetError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_feature_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feature_names.json");
        write_feature_names(&path).unwrap();
        let names: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(names, FEATURE_NAMES);
    }

    #[test]
    fn test_skip_counts_accumulate() {
        let mut total = SkipCounts {
            invalid_center: 1,
            ..Default::default()
        };
        total += SkipCounts {
            invalid_center: 2,
            invalid_target: 1,
            ..Default::default()
        };
        assert_eq!(total.invalid_center, 3);
        assert_eq!(total.total_records(), 4);
    }
}
