//! Ground-truth surface NO2 observations from EPA hourly CSV exports.

use crate::history::error::GroundTruthError;
use crate::types::location::Location;
use crate::types::station_id::StationId;
use chrono::NaiveDateTime;
use log::{info, warn};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const NO2_PARAMETER_NAME: &str = "Nitrogen dioxide (NO2)";

const COL_STATE: &str = "State Code";
const COL_COUNTY: &str = "County Code";
const COL_SITE: &str = "Site Num";
const COL_LATITUDE: &str = "Latitude";
const COL_LONGITUDE: &str = "Longitude";
const COL_DATE: &str = "Date Local";
const COL_TIME: &str = "Time Local";
const COL_VALUE: &str = "Sample Measurement";
const COL_PARAMETER: &str = "Parameter Name";

/// One hourly surface measurement at a monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthObservation {
    pub station_id: StationId,
    pub location: Location,
    pub timestamp: NaiveDateTime,
    /// Concentration in ppb.
    pub value: f64,
}

/// Observations read from one CSV together with the number of rows dropped.
#[derive(Debug, Clone, Default)]
pub struct GroundTruth {
    pub observations: Vec<GroundTruthObservation>,
    pub skipped_rows: usize,
}

/// Reads an EPA hourly CSV.
///
/// All columns are read as text and converted here, so codes such as `06`
/// and `6` produce the same [`StationId`]. When a `Parameter Name` column is
/// present only NO2 rows are kept. Rows with a missing field or an
/// unparseable date/time are skipped and counted.
///
/// # Errors
///
/// Fails when the file cannot be read as CSV or a required column is absent.
pub fn load_ground_truth_csv(path: &Path) -> Result<GroundTruth, GroundTruthError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| GroundTruthError::CsvRead(path.to_path_buf(), e))?
        .finish()
        .map_err(|e| GroundTruthError::CsvRead(path.to_path_buf(), e))?;

    let ground_truth = ground_truth_from_dataframe(&df, path)?;
    info!(
        "Loaded {} ground-truth observations from {} ({} rows skipped)",
        ground_truth.observations.len(),
        path.display(),
        ground_truth.skipped_rows
    );
    Ok(ground_truth)
}

/// Converts an already loaded EPA-shaped frame. `origin` only labels errors.
pub fn ground_truth_from_dataframe(
    df: &DataFrame,
    origin: &Path,
) -> Result<GroundTruth, GroundTruthError> {
    let state = string_column(df, COL_STATE, origin)?;
    let county = string_column(df, COL_COUNTY, origin)?;
    let site = string_column(df, COL_SITE, origin)?;
    let date = string_column(df, COL_DATE, origin)?;
    let time = string_column(df, COL_TIME, origin)?;
    let latitude = float_column(df, COL_LATITUDE, origin)?;
    let longitude = float_column(df, COL_LONGITUDE, origin)?;
    let value = float_column(df, COL_VALUE, origin)?;
    let parameter = if df.column(COL_PARAMETER).is_ok() {
        Some(string_column(df, COL_PARAMETER, origin)?)
    } else {
        None
    };

    let mut ground_truth = GroundTruth::default();
    let mut filtered_out = 0;
    for idx in 0..df.height() {
        if let Some(parameter) = &parameter {
            if parameter.get(idx) != Some(NO2_PARAMETER_NAME) {
                filtered_out += 1;
                continue;
            }
        }

        let row = (
            state.get(idx),
            county.get(idx),
            site.get(idx),
            date.get(idx),
            time.get(idx),
            latitude.get(idx),
            longitude.get(idx),
            value.get(idx),
        );
        let (Some(s), Some(c), Some(n), Some(d), Some(t), Some(lat), Some(lon), Some(v)) = row
        else {
            ground_truth.skipped_rows += 1;
            continue;
        };

        let Some(timestamp) = parse_local_time(d, t) else {
            warn!("Skipping ground-truth row {}: unparseable time '{} {}'", idx, d, t);
            ground_truth.skipped_rows += 1;
            continue;
        };

        ground_truth.observations.push(GroundTruthObservation {
            station_id: StationId::new(&normalize_code(s), &normalize_code(c), &normalize_code(n)),
            location: Location::new(lat, lon),
            timestamp,
            value: v,
        });
    }

    if filtered_out > 0 {
        info!("Ignored {} rows for parameters other than NO2", filtered_out);
    }
    Ok(ground_truth)
}

fn string_column(
    df: &DataFrame,
    name: &str,
    origin: &Path,
) -> Result<StringChunked, GroundTruthError> {
    let column = df
        .column(name)
        .map_err(|source| GroundTruthError::ColumnNotFound {
            path: origin.to_path_buf(),
            column: name.to_string(),
            source,
        })?;
    let type_error = |source| GroundTruthError::ColumnType {
        path: origin.to_path_buf(),
        column: name.to_string(),
        source,
    };
    let cast = column.cast(&DataType::String).map_err(type_error)?;
    Ok(cast.str().map_err(type_error)?.clone())
}

fn float_column(
    df: &DataFrame,
    name: &str,
    origin: &Path,
) -> Result<Float64Chunked, GroundTruthError> {
    let column = df
        .column(name)
        .map_err(|source| GroundTruthError::ColumnNotFound {
            path: origin.to_path_buf(),
            column: name.to_string(),
            source,
        })?;
    let type_error = |source| GroundTruthError::ColumnType {
        path: origin.to_path_buf(),
        column: name.to_string(),
        source,
    };
    let cast = column.cast(&DataType::Float64).map_err(type_error)?;
    Ok(cast.f64().map_err(type_error)?.clone())
}

/// Numeric codes without leading zeros; `StationId` re-pads them.
fn normalize_code(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn parse_local_time(date: &str, time: &str) -> Option<NaiveDateTime> {
    let joined = format!("{} {}", date.trim(), time.trim());
    NaiveDateTime::parse_from_str(&joined, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(&joined, "%Y-%m-%d %H:%M:%S"))
        .ok()
}
