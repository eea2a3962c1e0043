//! Per-station hourly meteorological series, as exported by Open-Meteo.

use crate::meteo::error::MeteoIndexError;
use crate::types::location::Location;
use crate::types::meteo_conditions::MeteoVariable;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const TIME_FORMAT_SECONDS: &str = "%Y-%m-%d %H:%M:%S";

/// Hourly records of one station as parallel arrays. Any value may be `None`
/// for a given hour; arrays shorter than `times` are treated as `None` past
/// their end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlySeries {
    pub times: Vec<NaiveDateTime>,
    pub wind_speed: Vec<Option<f64>>,
    pub wind_direction: Vec<Option<f64>>,
    pub temperature: Vec<Option<f64>>,
    pub precipitation: Vec<Option<f64>>,
    pub pbl_height: Vec<Option<f64>>,
    pub surface_pressure: Vec<Option<f64>>,
    pub relative_humidity: Vec<Option<f64>>,
    pub cloud_cover: Vec<Option<f64>>,
}

impl HourlySeries {
    fn column(&self, variable: MeteoVariable) -> &[Option<f64>] {
        match variable {
            MeteoVariable::WindSpeed => &self.wind_speed,
            MeteoVariable::WindDirection => &self.wind_direction,
            MeteoVariable::Temperature => &self.temperature,
            MeteoVariable::Precipitation => &self.precipitation,
            MeteoVariable::PblHeight => &self.pbl_height,
            MeteoVariable::SurfacePressure => &self.surface_pressure,
            MeteoVariable::RelativeHumidity => &self.relative_humidity,
            MeteoVariable::CloudCover => &self.cloud_cover,
        }
    }

    pub fn value(&self, variable: MeteoVariable, idx: usize) -> Option<f64> {
        self.column(variable).get(idx).copied().flatten()
    }
}

/// A meteorological station: a named location with its hourly series.
///
/// Read-only once constructed; the exact-time lookup table is built in
/// [`MeteoStation::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeteoStation {
    pub name: String,
    pub location: Location,
    pub series: HourlySeries,
    #[serde(skip)]
    time_index: HashMap<NaiveDateTime, usize>,
}

impl MeteoStation {
    pub fn new(name: String, location: Location, series: HourlySeries) -> Self {
        let mut time_index = HashMap::with_capacity(series.times.len());
        for (idx, time) in series.times.iter().enumerate() {
            // First occurrence wins for duplicated hours.
            time_index.entry(*time).or_insert(idx);
        }
        MeteoStation {
            name,
            location,
            series,
            time_index,
        }
    }

    /// Position of `timestamp` in the series, exact match only.
    pub fn index_of(&self, timestamp: &NaiveDateTime) -> Option<usize> {
        self.time_index.get(timestamp).copied()
    }

    pub fn value_at(&self, variable: MeteoVariable, idx: usize) -> Option<f64> {
        self.series.value(variable, idx)
    }

    /// Parses one Open-Meteo hourly export.
    ///
    /// # Errors
    ///
    /// [`MeteoIndexError::MissingCoordinates`], [`MeteoIndexError::NoHourlyData`]
    /// or [`MeteoIndexError::InvalidTimestamp`] when the document cannot form a
    /// usable station.
    pub fn from_open_meteo(
        name: &str,
        document: OpenMeteoDocument,
    ) -> Result<Self, MeteoIndexError> {
        let (Some(latitude), Some(longitude)) = (document.latitude, document.longitude) else {
            return Err(MeteoIndexError::MissingCoordinates(name.to_string()));
        };
        let hourly = document.hourly;
        if hourly.time.is_empty() {
            return Err(MeteoIndexError::NoHourlyData(name.to_string()));
        }

        let times = hourly
            .time
            .iter()
            .map(|raw| {
                parse_time(raw).map_err(|source| MeteoIndexError::InvalidTimestamp {
                    station: name.to_string(),
                    value: raw.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let series = HourlySeries {
            times,
            wind_speed: hourly.wind_speed,
            wind_direction: hourly.wind_direction,
            temperature: hourly.temperature,
            precipitation: hourly.precipitation,
            pbl_height: hourly.pbl_height,
            surface_pressure: hourly.surface_pressure,
            relative_humidity: hourly.relative_humidity,
            cloud_cover: hourly.cloud_cover,
        };
        Ok(Self::new(name.to_string(), Location::new(latitude, longitude), series))
    }
}

/// Parses `YYYY-MM-DD HH:MM`, also accepting the ISO `T` separator, a trailing
/// `Z` and a seconds field.
pub fn parse_time(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let normalized = raw.trim().replace('T', " ").replace('Z', "");
    NaiveDateTime::parse_from_str(&normalized, TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(&normalized, TIME_FORMAT_SECONDS))
}

/// Top-level Open-Meteo JSON document.
#[derive(Debug, Deserialize)]
pub struct OpenMeteoDocument {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub hourly: OpenMeteoHourly,
}

#[derive(Debug, Default, Deserialize)]
pub struct OpenMeteoHourly {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default, rename = "windspeed_10m", alias = "wind_speed_10m")]
    pub wind_speed: Vec<Option<f64>>,
    #[serde(default, rename = "winddirection_10m", alias = "wind_direction_10m")]
    pub wind_direction: Vec<Option<f64>>,
    #[serde(default, rename = "temperature_2m")]
    pub temperature: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation: Vec<Option<f64>>,
    #[serde(default, rename = "boundary_layer_height")]
    pub pbl_height: Vec<Option<f64>>,
    #[serde(default)]
    pub surface_pressure: Vec<Option<f64>>,
    #[serde(default, rename = "relative_humidity_2m")]
    pub relative_humidity: Vec<Option<f64>>,
    #[serde(default)]
    pub cloud_cover: Vec<Option<f64>>,
}
