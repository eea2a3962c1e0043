//! Spatial index over meteorological stations with inverse-distance
//! interpolation.

use crate::geodesy::haversine_km;
use crate::meteo::error::MeteoIndexError;
use crate::meteo::station::{MeteoStation, OpenMeteoDocument};
use crate::types::location::Location;
use crate::types::meteo_conditions::{MeteoConditions, MeteoVariable};
use bincode::config::{Configuration, Fixint, LittleEndian};
use bon::bon;
use chrono::NaiveDateTime;
use log::{info, warn};
use ordered_float::OrderedFloat;
use std::path::{Path, PathBuf};

/// Neighbour count used when `k` is not given.
pub const DEFAULT_NEIGHBORS: usize = 3;

const DISTANCE_OFFSET_KM: f64 = 0.1;
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// Read-only collection of meteorological stations.
///
/// Built once at startup and shared by reference afterwards; every query takes
/// `&self`, so the index can be used from several threads at once.
#[derive(Debug, Clone, Default)]
pub struct MeteoIndex {
    stations: Vec<MeteoStation>,
}

#[bon]
impl MeteoIndex {
    /// Wraps an already loaded station set. An empty set is allowed; every
    /// interpolation then returns [`MeteoConditions::default`].
    pub fn from_stations(stations: Vec<MeteoStation>) -> Self {
        // Rebuilds each station's time lookup (it is not serialized).
        let stations = stations
            .into_iter()
            .map(|s| MeteoStation::new(s.name, s.location, s.series))
            .collect();
        MeteoIndex { stations }
    }

    /// Loads every `*.json` Open-Meteo export in `dir`, in file-name order.
    ///
    /// Files that cannot form a station are skipped with a warning.
    ///
    /// # Errors
    ///
    /// [`MeteoIndexError::DirectoryRead`] if `dir` cannot be listed and
    /// [`MeteoIndexError::NoStations`] if no file produced a station.
    pub fn from_dir(dir: &Path) -> Result<Self, MeteoIndexError> {
        let stations = Self::load_stations(dir)?;
        Ok(Self::from_stations(stations))
    }

    /// Like [`MeteoIndex::from_dir`], keeping a bincode copy of the parsed
    /// stations in `cache_dir` and reading it on later runs.
    pub fn from_dir_cached(dir: &Path, cache_dir: &Path) -> Result<Self, MeteoIndexError> {
        let cache_file = cache_dir.join(cache_file_name(dir));

        let stations = if cache_file.exists() {
            info!("Reading meteorological stations from cache {}", cache_file.display());
            Self::get_cached_stations(&cache_file)?
        } else {
            let stations = Self::load_stations(dir)?;
            std::fs::create_dir_all(cache_dir)
                .map_err(|e| MeteoIndexError::CacheDirCreation(cache_dir.to_path_buf(), e))?;
            Self::cache_stations(&stations, &cache_file)?;
            stations
        };
        Ok(Self::from_stations(stations))
    }

    fn load_stations(dir: &Path) -> Result<Vec<MeteoStation>, MeteoIndexError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| MeteoIndexError::DirectoryRead(dir.to_path_buf(), e))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut stations = Vec::with_capacity(files.len());
        let mut total_points = 0;
        for file in &files {
            match Self::load_station(file) {
                Ok(station) => {
                    info!(
                        "Loaded {:<20} {:>6} hourly records at ({:.2}, {:.2})",
                        station.name,
                        station.series.times.len(),
                        station.location.latitude,
                        station.location.longitude
                    );
                    total_points += station.series.times.len();
                    stations.push(station);
                }
                Err(e) => warn!("Skipping meteorological station {}: {}", file.display(), e),
            }
        }

        if stations.is_empty() {
            return Err(MeteoIndexError::NoStations(dir.to_path_buf()));
        }
        info!(
            "Loaded {} meteorological stations with {} hourly records",
            stations.len(),
            total_points
        );
        Ok(stations)
    }

    fn load_station(path: &Path) -> Result<MeteoStation, MeteoIndexError> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let json = std::fs::read_to_string(path)
            .map_err(|e| MeteoIndexError::FileRead(path.to_path_buf(), e))?;
        let document: OpenMeteoDocument = serde_json::from_str(&json)
            .map_err(|e| MeteoIndexError::JsonParse(path.to_path_buf(), e))?;
        MeteoStation::from_open_meteo(&name, document)
    }

    fn get_cached_stations(cache_path: &Path) -> Result<Vec<MeteoStation>, MeteoIndexError> {
        let bytes = std::fs::read(cache_path)
            .map_err(|e| MeteoIndexError::CacheRead(cache_path.to_path_buf(), e))?;
        let (decoded, _) =
            bincode::serde::decode_from_slice::<Vec<MeteoStation>, _>(&bytes, BINCODE_CONFIG)
                .map_err(|e| MeteoIndexError::CacheDecode(cache_path.to_path_buf(), Box::new(e)))?;
        Ok(decoded)
    }

    fn cache_stations(stations: &[MeteoStation], cache_path: &Path) -> Result<(), MeteoIndexError> {
        let bytes = bincode::serde::encode_to_vec(stations, BINCODE_CONFIG)
            .map_err(|e| MeteoIndexError::CacheEncode(Box::new(e)))?;
        std::fs::write(cache_path, &bytes)
            .map_err(|e| MeteoIndexError::CacheWrite(cache_path.to_path_buf(), e))?;
        info!(
            "Wrote meteorological cache ({} bytes) to {}",
            bytes.len(),
            cache_path.display()
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn stations(&self) -> &[MeteoStation] {
        &self.stations
    }

    /// Up to `k` stations ordered by haversine distance from `location`,
    /// closest first. Equal distances keep load order.
    pub fn nearest_stations(&self, location: Location, k: usize) -> Vec<(&MeteoStation, f64)> {
        let mut with_distance: Vec<(&MeteoStation, f64)> = self
            .stations
            .iter()
            .map(|station| (station, haversine_km(location, station.location)))
            .collect();
        with_distance.sort_by_key(|(_, dist)| OrderedFloat(*dist));
        with_distance.truncate(k);
        with_distance
    }

    /// Inverse-distance-squared interpolation of all eight variables at
    /// `location` for the exact hour `timestamp`.
    ///
    /// Of the `k` nearest stations (default 3), those without a record at
    /// exactly `timestamp` are skipped. Each remaining station weighs
    /// `1 / (distance_km + 0.1)²`. The denominator of every variable is the
    /// summed weight of all matching stations, even those with a null for that
    /// variable, so sparse variables are pulled towards zero. A variable no
    /// matching station provides, or any variable when no station matches,
    /// takes its default from [`MeteoConditions::default`]. Never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use no2cast::{Location, MeteoConditions, MeteoIndex};
    /// use chrono::NaiveDate;
    ///
    /// let index = MeteoIndex::from_stations(vec![]);
    /// let timestamp = NaiveDate::from_ymd_opt(2024, 2, 15)
    ///     .unwrap()
    ///     .and_hms_opt(14, 0, 0)
    ///     .unwrap();
    /// let conditions = index
    ///     .interpolate()
    ///     .location(Location::new(34.05, -118.24))
    ///     .timestamp(timestamp)
    ///     .call();
    /// assert_eq!(conditions, MeteoConditions::default());
    /// ```
    #[builder]
    pub fn interpolate(
        &self,
        location: Location,
        timestamp: NaiveDateTime,
        k: Option<usize>,
    ) -> MeteoConditions {
        let k = k.unwrap_or(DEFAULT_NEIGHBORS);

        let mut total_weight = 0.0;
        let mut matched = 0;
        let mut weighted_sums = [0.0_f64; MeteoVariable::ALL.len()];
        let mut contributed = [false; MeteoVariable::ALL.len()];

        for (station, distance_km) in self.nearest_stations(location, k) {
            let Some(idx) = station.index_of(&timestamp) else {
                continue;
            };
            let offset_km = distance_km + DISTANCE_OFFSET_KM;
            let weight = 1.0 / (offset_km * offset_km);
            total_weight += weight;
            matched += 1;

            for (slot, variable) in MeteoVariable::ALL.iter().enumerate() {
                if let Some(value) = station.value_at(*variable, idx) {
                    weighted_sums[slot] += value * weight;
                    contributed[slot] = true;
                }
            }
        }

        let mut conditions = MeteoConditions::default();
        if matched == 0 {
            return conditions;
        }
        for (slot, variable) in MeteoVariable::ALL.iter().enumerate() {
            if contributed[slot] {
                conditions.set(*variable, weighted_sums[slot] / total_weight);
            }
        }
        conditions
    }
}

fn cache_file_name(dir: &Path) -> String {
    let stem: String = dir
        .to_string_lossy()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("meteo_{}.bin", stem.trim_matches('_'))
}
