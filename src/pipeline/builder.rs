//! Drives feature extraction over a set of snapshots.
//!
//! For every snapshot the grid is parsed and indexed once, the ground-truth
//! observations close to the acquisition time are selected, and each of them
//! yields at most one [`TrainingSample`]. The meteorological and historical
//! indexes are only read, so snapshots are processed in parallel when
//! [`PipelineConfig::parallel`] is set; the output keeps snapshot order.

use crate::error::No2Error;
use crate::features::extractor::FeatureExtractor;
use crate::grid::cell_store::GridCellStore;
use crate::grid::error::SnapshotError;
use crate::grid::snapshot::{snapshot_timestamp, SnapshotParser};
use crate::history::aggregator::HistoricalIndex;
use crate::history::ground_truth::GroundTruthObservation;
use crate::meteo::index::MeteoIndex;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::dataset::{Dataset, SkipCounts, TrainingSample};
use bon::bon;
use chrono::{Datelike, DurationRound, NaiveDateTime, TimeDelta, Timelike};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Builds a [`Dataset`] from snapshot files.
///
/// Everything it borrows is read-only for the duration of the build.
///
/// # Examples
///
/// ```no_run
/// use no2cast::{
///     list_snapshots, load_ground_truth_csv, DatasetBuilder, HistoricalIndex,
///     JsonSnapshotParser, MeteoIndex, No2Error,
/// };
/// use std::path::Path;
///
/// # fn run() -> Result<(), No2Error> {
/// let meteo = MeteoIndex::from_dir(Path::new("data/openmeteo"))?;
/// let ground_truth = load_ground_truth_csv(Path::new("data/epa/no2_hourly.csv"))?;
/// let history = HistoricalIndex::build(&ground_truth.observations);
/// let snapshots = list_snapshots(Path::new("data/tempo"), &["json"])?;
///
/// let dataset = DatasetBuilder::builder()
///     .parser(JsonSnapshotParser)
///     .meteo(&meteo)
///     .history(&history)
///     .observations(&ground_truth.observations)
///     .build()
///     .run(&snapshots)?;
/// dataset.write(Path::new("training.parquet"))?;
/// # Ok(())
/// # }
/// ```
pub struct DatasetBuilder<'a, P> {
    parser: P,
    meteo: &'a MeteoIndex,
    history: &'a HistoricalIndex,
    /// Sorted by timestamp.
    observations: Vec<&'a GroundTruthObservation>,
    extractor: FeatureExtractor,
    config: PipelineConfig,
}

struct SnapshotOutcome {
    samples: Vec<TrainingSample>,
    skips: SkipCounts,
}

#[bon]
impl<'a, P: SnapshotParser> DatasetBuilder<'a, P> {
    #[builder]
    pub fn new(
        parser: P,
        meteo: &'a MeteoIndex,
        history: &'a HistoricalIndex,
        observations: &'a [GroundTruthObservation],
        extractor: Option<FeatureExtractor>,
        config: Option<PipelineConfig>,
    ) -> Self {
        let mut sorted: Vec<&GroundTruthObservation> = observations.iter().collect();
        sorted.sort_by_key(|obs| obs.timestamp);
        DatasetBuilder {
            parser,
            meteo,
            history,
            observations: sorted,
            extractor: extractor.unwrap_or_default(),
            config: config.unwrap_or_default(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Processes `snapshot_paths` in the given order.
    ///
    /// # Errors
    ///
    /// [`No2Error::NoSnapshots`], [`No2Error::NoGroundTruth`] or
    /// [`No2Error::NoStations`] when there is nothing to pair. Problems with
    /// single snapshots or records never fail the build; they are counted in
    /// [`Dataset::skips`].
    pub fn run(&self, snapshot_paths: &[PathBuf]) -> Result<Dataset, No2Error> {
        if snapshot_paths.is_empty() {
            return Err(No2Error::NoSnapshots);
        }
        if self.observations.is_empty() {
            return Err(No2Error::NoGroundTruth);
        }
        if self.meteo.is_empty() {
            return Err(No2Error::NoStations);
        }

        let paths = match self.config.max_files {
            Some(limit) => &snapshot_paths[..limit.min(snapshot_paths.len())],
            None => snapshot_paths,
        };
        info!(
            "Building dataset from {} snapshots and {} observations",
            paths.len(),
            self.observations.len()
        );

        let outcomes: Vec<SnapshotOutcome> = if self.config.parallel {
            paths.par_iter().map(|path| self.process_snapshot(path)).collect()
        } else {
            paths.iter().map(|path| self.process_snapshot(path)).collect()
        };

        let mut dataset = Dataset {
            snapshots_processed: paths.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            dataset.samples.extend(outcome.samples);
            dataset.skips += outcome.skips;
        }

        info!(
            "Extracted {} samples from {} snapshots ({} records skipped, {} snapshots unreadable)",
            dataset.samples.len(),
            dataset.snapshots_processed,
            dataset.skips.total_records(),
            dataset.skips.unreadable_snapshots
        );
        Ok(dataset)
    }

    fn process_snapshot(&self, path: &Path) -> SnapshotOutcome {
        let mut outcome = SnapshotOutcome {
            samples: Vec::new(),
            skips: SkipCounts::default(),
        };

        let loaded = snapshot_timestamp(path).and_then(|timestamp| {
            let cells = self.parser.parse_snapshot(path)?;
            Ok::<_, SnapshotError>((timestamp, cells))
        });
        let (timestamp, cells) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("Skipping snapshot {}: {}", path.display(), e);
                outcome.skips.unreadable_snapshots += 1;
                return outcome;
            }
        };

        if cells.is_empty() {
            debug!("Snapshot {} has no cells", path.display());
            outcome.skips.empty_snapshots += 1;
            return outcome;
        }
        let store = GridCellStore::new(cells);

        let candidates = self.observations_near(timestamp);
        if candidates.is_empty() {
            debug!("No observations within the window of {}", timestamp);
            outcome.skips.snapshots_without_observations += 1;
            return outcome;
        }
        let selected = evenly_strided(&candidates, self.config.max_observations);
        outcome.skips.capped_observations += candidates.len() - selected.len();

        // Meteorology and history are hourly.
        let hour_start = timestamp
            .duration_trunc(TimeDelta::hours(1))
            .unwrap_or(timestamp);

        for obs in selected {
            let meteo = self
                .meteo
                .interpolate()
                .location(obs.location)
                .timestamp(hour_start)
                .k(self.config.meteo_neighbors)
                .call();

            let features = self
                .extractor
                .extract()
                .cells(&store)
                .target(obs.location)
                .wind_speed(meteo.wind_speed)
                .wind_direction(meteo.wind_direction)
                .pbl_height(meteo.pbl_height)
                .temperature(meteo.temperature)
                .precipitation(meteo.precipitation)
                .hour(timestamp.hour())
                .day_of_week(timestamp.weekday().num_days_from_monday())
                .month(timestamp.month())
                .station_id(&obs.station_id)
                .timestamp(hour_start)
                .history(self.history)
                .call();
            let Some(features) = features else {
                continue;
            };

            if !features.no2_column_center.is_finite() || features.no2_column_center <= 0.0 {
                outcome.skips.invalid_center += 1;
                continue;
            }
            if !obs.value.is_finite() || obs.value < 0.0 {
                outcome.skips.invalid_target += 1;
                continue;
            }
            if !features.is_finite() {
                outcome.skips.non_finite_features += 1;
                continue;
            }

            outcome.samples.push(TrainingSample {
                station_id: obs.station_id.clone(),
                timestamp,
                features,
                target: obs.value,
            });
        }

        debug!(
            "Snapshot {} produced {} samples",
            path.display(),
            outcome.samples.len()
        );
        outcome
    }

    /// Observations stamped within `±window` of `timestamp`, in time order.
    fn observations_near(&self, timestamp: NaiveDateTime) -> &[&'a GroundTruthObservation] {
        let window = self.config.window;
        let start = timestamp
            .checked_sub_signed(window)
            .unwrap_or(NaiveDateTime::MIN);
        let end = timestamp
            .checked_add_signed(window)
            .unwrap_or(NaiveDateTime::MAX);
        let first = self.observations.partition_point(|obs| obs.timestamp < start);
        let last = self.observations.partition_point(|obs| obs.timestamp <= end);
        &self.observations[first..last.max(first)]
    }
}

/// At most `cap` items spread evenly over `items`, keeping order. The
/// selection is a pure function of the input so repeated builds agree.
fn evenly_strided<T: Copy>(items: &[T], cap: usize) -> Vec<T> {
    if items.len() <= cap {
        return items.to_vec();
    }
    (0..cap).map(|i| items[i * items.len() / cap]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meteo::station::{HourlySeries, MeteoStation};
    use crate::types::grid_cell::GridCell;
    use crate::types::location::Location;
    use crate::types::station_id::StationId;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    const SITE: Location = Location {
        latitude: 34.0669,
        longitude: -118.2275,
    };

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn lattice_parser(path: &Path) -> Result<Vec<GridCell>, SnapshotError> {
        if path.to_string_lossy().contains("BROKEN") {
            return Err(SnapshotError::MissingTimestamp("BROKEN".into()));
        }
        let mut cells = vec![];
        for i in -2..=2 {
            for j in -2..=2 {
                cells.push(GridCell::new(
                    SITE.latitude + i as f64 * 0.05,
                    SITE.longitude + j as f64 * 0.05,
                    5e15 + j as f64 * 1e14,
                ));
            }
        }
        if path.to_string_lossy().contains("NEGATIVE") {
            for cell in &mut cells {
                cell.value = -1.0;
            }
        }
        Ok(cells)
    }

    fn meteo() -> MeteoIndex {
        let times: Vec<NaiveDateTime> = (0..48)
            .map(|h| at(10, 0, 0) + TimeDelta::hours(h))
            .collect();
        let n = times.len();
        MeteoIndex::from_stations(vec![MeteoStation::new(
            "Los_Angeles".into(),
            SITE,
            HourlySeries {
                times,
                wind_speed: vec![Some(3.0); n],
                wind_direction: vec![Some(270.0); n],
                pbl_height: vec![Some(600.0); n],
                ..Default::default()
            },
        )])
    }

    fn observation(site: &str, time: NaiveDateTime, value: f64) -> GroundTruthObservation {
        GroundTruthObservation {
            station_id: StationId::from(site),
            location: SITE,
            timestamp: time,
            value,
        }
    }

    fn snapshot(stamp: &str) -> PathBuf {
        PathBuf::from(format!("/tempo/TEMPO_NO2_L3_V03_{stamp}_S012.json"))
    }

    #[test]
    fn test_end_to_end_build() {
        let meteo = meteo();
        let observations = vec![
            observation("6_037_1103", at(10, 13, 0), 20.0),
            observation("6_037_1103", at(10, 14, 0), 22.0),
            observation("6_037_1103", at(10, 17, 0), 30.0),
            observation("6_037_1104", at(10, 14, 0), -3.0),
        ];
        let history = HistoricalIndex::build(&observations);

        let paths = vec![
            snapshot("20240110T141610Z"),
            snapshot("BROKEN"),
            snapshot("20240110T201610Z"),
        ];
        let config = PipelineConfig::builder().parallel(false).build();
        let dataset = DatasetBuilder::builder()
            .parser(lattice_parser)
            .meteo(&meteo)
            .history(&history)
            .observations(&observations)
            .config(config)
            .build()
            .run(&paths)
            .unwrap();

        // 13:00 and 14:00 are valid, 17:00 is outside ±2 h, the negative one is dropped.
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.skips.invalid_target, 1);
        assert_eq!(dataset.skips.unreadable_snapshots, 1);
        assert_eq!(dataset.skips.snapshots_without_observations, 1);
        assert_eq!(dataset.snapshots_processed, 3);

        let first = &dataset.samples[0];
        let acquisition = NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(14, 16, 10)
            .unwrap();
        assert_eq!(first.timestamp, acquisition);
        assert_eq!(first.target, 20.0);
        assert_eq!(first.features.no2_column_center, 5e15);
        // Meteorology at 14:00 comes from the single station.
        assert_relative_eq!(first.features.wind_speed, 3.0);
        assert_relative_eq!(first.features.pbl_height, 600.0);
        // 14 UTC is 06 local.
        assert_eq!(first.features.hour, 6.0);
        // History is looked up at the snapshot hour.
        assert_relative_eq!(first.features.no2_avg_24h, 21.0);
        assert_relative_eq!(first.features.no2_trend_24h, 0.0);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let meteo = meteo();
        let observations: Vec<GroundTruthObservation> = (0..30)
            .map(|i| {
                observation(
                    "6_037_1103",
                    at(10, 12, 0) + TimeDelta::minutes(i * 8),
                    10.0 + i as f64,
                )
            })
            .collect();
        let history = HistoricalIndex::build(&observations);
        let paths: Vec<PathBuf> = ["20240110T130000Z", "20240110T140000Z", "20240110T150000Z"]
            .iter()
            .map(|s| snapshot(s))
            .collect();

        let build = |parallel: bool| {
            DatasetBuilder::builder()
                .parser(lattice_parser)
                .meteo(&meteo)
                .history(&history)
                .observations(&observations)
                .config(PipelineConfig::builder().parallel(parallel).max_observations(7).build())
                .build()
                .run(&paths)
                .unwrap()
        };
        let sequential = build(false);
        let parallel = build(true);
        assert_eq!(sequential.samples, parallel.samples);
        assert_eq!(sequential.skips, parallel.skips);
        assert!(sequential.skips.capped_observations > 0);
        assert_eq!(sequential.len(), 21);
    }

    #[test]
    fn test_invalid_center_is_counted() {
        let meteo = meteo();
        let observations = vec![observation("6_037_1103", at(10, 14, 0), 20.0)];
        let history = HistoricalIndex::build(&observations);
        let dataset = DatasetBuilder::builder()
            .parser(lattice_parser)
            .meteo(&meteo)
            .history(&history)
            .observations(&observations)
            .build()
            .run(&[snapshot("20240110T140000Z_NEGATIVE")])
            .unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.skips.invalid_center, 1);
    }

    #[test]
    fn test_structural_failures() {
        let meteo = meteo();
        let empty_meteo = MeteoIndex::from_stations(vec![]);
        let observations = vec![observation("6_037_1103", at(10, 14, 0), 20.0)];
        let history = HistoricalIndex::build(&observations);

        let no_paths = DatasetBuilder::builder()
            .parser(lattice_parser)
            .meteo(&meteo)
            .history(&history)
            .observations(&observations)
            .build()
            .run(&[]);
        assert!(matches!(no_paths, Err(No2Error::NoSnapshots)));

        let no_observations = DatasetBuilder::builder()
            .parser(lattice_parser)
            .meteo(&meteo)
            .history(&history)
            .observations(&[])
            .build()
            .run(&[snapshot("20240110T140000Z")]);
        assert!(matches!(no_observations, Err(No2Error::NoGroundTruth)));

        let no_stations = DatasetBuilder::builder()
            .parser(lattice_parser)
            .meteo(&empty_meteo)
            .history(&history)
            .observations(&observations)
            .build()
            .run(&[snapshot("20240110T140000Z")]);
        assert!(matches!(no_stations, Err(No2Error::NoStations)));
    }

    #[test]
    fn test_evenly_strided() {
        let items: Vec<usize> = (0..10).collect();
        assert_eq!(evenly_strided(&items, 20), items);
        assert_eq!(evenly_strided(&items, 5), vec![0, 2, 4, 6, 8]);
        assert_eq!(evenly_strided(&items, 3), vec![0, 3, 6]);
        assert!(evenly_strided(&items, 0).is_empty());
    }
}
