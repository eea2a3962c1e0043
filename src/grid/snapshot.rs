//! Grid snapshot parsing boundary.
//!
//! Decoding the satellite product itself happens outside this crate; the
//! pipeline only sees a [`SnapshotParser`]. [`JsonSnapshotParser`] reads the
//! JSON emitted by the grid extraction step.

use crate::grid::error::SnapshotError;
use crate::types::grid_cell::GridCell;
use chrono::NaiveDateTime;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const TIMESTAMP_TOKEN_INDEX: usize = 4;
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Turns a snapshot file into its grid cells.
pub trait SnapshotParser: Send + Sync {
    fn parse_snapshot(&self, path: &Path) -> Result<Vec<GridCell>, SnapshotError>;
}

impl<F> SnapshotParser for F
where
    F: Fn(&Path) -> Result<Vec<GridCell>, SnapshotError> + Send + Sync,
{
    fn parse_snapshot(&self, path: &Path) -> Result<Vec<GridCell>, SnapshotError> {
        self(path)
    }
}

#[derive(Debug, Deserialize)]
struct RawCell {
    latitude: f64,
    longitude: f64,
    #[serde(alias = "no2_column")]
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawGrid {
    cells: Vec<RawCell>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSnapshot {
    Extracted { grid: RawGrid },
    Cells(Vec<RawCell>),
}

/// Reads `{"grid": {"cells": [...]}}` documents (cells carrying
/// `no2_column`) or bare `[{latitude, longitude, value}]` lists.
///
/// Null values become NaN, which every aggregate ignores.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSnapshotParser;

impl JsonSnapshotParser {
    pub fn parse_str(&self, json: &str, origin: &Path) -> Result<Vec<GridCell>, SnapshotError> {
        let raw: RawSnapshot = serde_json::from_str(json)
            .map_err(|e| SnapshotError::JsonParse(origin.to_path_buf(), e))?;
        let cells = match raw {
            RawSnapshot::Extracted { grid } => grid.cells,
            RawSnapshot::Cells(cells) => cells,
        };
        Ok(cells
            .into_iter()
            .map(|c| GridCell::new(c.latitude, c.longitude, c.value.unwrap_or(f64::NAN)))
            .collect())
    }
}

impl SnapshotParser for JsonSnapshotParser {
    fn parse_snapshot(&self, path: &Path) -> Result<Vec<GridCell>, SnapshotError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| SnapshotError::Read(path.to_path_buf(), e))?;
        let cells = self.parse_str(&json, path)?;
        debug!("Parsed {} cells from {}", cells.len(), path.display());
        Ok(cells)
    }
}

/// UTC acquisition time encoded in a snapshot file name, e.g.
/// `TEMPO_NO2_L3_V03_20240110T141610Z_S012.nc`: the fifth `_`-separated
/// token, formatted `YYYYMMDDTHHMMSSZ`.
pub fn snapshot_timestamp(path: &Path) -> Result<NaiveDateTime, SnapshotError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let token = file_name
        .split('_')
        .nth(TIMESTAMP_TOKEN_INDEX)
        .ok_or_else(|| SnapshotError::MissingTimestamp(file_name.clone()))?;
    NaiveDateTime::parse_from_str(token, TIMESTAMP_FORMAT).map_err(|source| {
        SnapshotError::InvalidTimestamp {
            file_name: file_name.clone(),
            token: token.to_string(),
            source,
        }
    })
}

/// Snapshot files in `dir` with one of `extensions`, sorted by file name.
pub fn list_snapshots(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, SnapshotError> {
    let entries =
        std::fs::read_dir(dir).map_err(|e| SnapshotError::DirectoryRead(dir.to_path_buf(), e))?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.contains(&ext))
        })
        .collect();
    paths.sort();
    Ok(paths)
}
