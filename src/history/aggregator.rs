//! Rolling per-station statistics over the ground-truth series.

use crate::history::ground_truth::GroundTruthObservation;
use crate::types::station_id::StationId;
use chrono::{NaiveDateTime, TimeDelta};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Format of the string form of a lookup timestamp.
pub const TIMESTAMP_KEY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TREND_EPSILON: f64 = 0.1;

/// History-derived features for one station at one time. All zero when
/// nothing is known.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoricalFeatures {
    pub no2_avg_24h: f64,
    pub no2_avg_7d: f64,
    pub no2_trend_24h: f64,
}

/// Lookup of [`HistoricalFeatures`] by station and exact observation time.
///
/// Windows are measured in elapsed time: `no2_avg_24h` at `t` averages every
/// value stamped in `[t - 24h, t]`, however many rows that is.
#[derive(Debug, Clone, Default)]
pub struct HistoricalIndex {
    features: HashMap<(StationId, NaiveDateTime), HistoricalFeatures>,
}

impl HistoricalIndex {
    pub fn build<'a>(observations: impl IntoIterator<Item = &'a GroundTruthObservation>) -> Self {
        let mut by_station: HashMap<&StationId, Vec<(NaiveDateTime, f64)>> = HashMap::new();
        for obs in observations {
            if obs.value.is_finite() {
                by_station
                    .entry(&obs.station_id)
                    .or_default()
                    .push((obs.timestamp, obs.value));
            }
        }

        let mut features = HashMap::new();
        for (station_id, mut series) in by_station {
            series.sort_by_key(|(time, _)| *time);
            for (time, record) in station_features(&series) {
                features.insert((station_id.clone(), time), record);
            }
        }

        info!("Built historical features for {} station hours", features.len());
        HistoricalIndex { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(
        &self,
        station_id: &StationId,
        timestamp: NaiveDateTime,
    ) -> Option<HistoricalFeatures> {
        self.features.get(&(station_id.clone(), timestamp)).copied()
    }

    /// Lookup by station string and `YYYY-MM-DD HH:MM:SS` timestamp.
    pub fn get_str(&self, station_id: &str, timestamp: &str) -> Option<HistoricalFeatures> {
        let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_KEY_FORMAT).ok()?;
        self.get(&StationId::from(station_id), timestamp)
    }
}

/// Features at every distinct time of a time-sorted series.
fn station_features(series: &[(NaiveDateTime, f64)]) -> Vec<(NaiveDateTime, HistoricalFeatures)> {
    let mut prefix = Vec::with_capacity(series.len() + 1);
    prefix.push(0.0);
    for (_, value) in series {
        prefix.push(prefix[prefix.len() - 1] + value);
    }

    let window_mean = |start: NaiveDateTime, end_exclusive: usize| {
        let first = series.partition_point(|(time, _)| *time < start);
        let count = end_exclusive - first;
        if count == 0 {
            0.0
        } else {
            (prefix[end_exclusive] - prefix[first]) / count as f64
        }
    };

    // Last value recorded exactly at `time`.
    let value_at = |time: NaiveDateTime| {
        let end = series.partition_point(|(t, _)| *t <= time);
        (end > 0 && series[end - 1].0 == time).then(|| series[end - 1].1)
    };

    let mut out = Vec::new();
    let mut idx = 0;
    while idx < series.len() {
        let time = series[idx].0;
        let end = idx + series[idx..].partition_point(|(t, _)| *t == time);
        let current = series[end - 1].1;

        let no2_trend_24h = match value_at(time - TimeDelta::hours(24)) {
            Some(previous) => (current - previous) / (previous.abs() + TREND_EPSILON),
            None => 0.0,
        };

        out.push((
            time,
            HistoricalFeatures {
                no2_avg_24h: window_mean(time - TimeDelta::hours(24), end),
                no2_avg_7d: window_mean(time - TimeDelta::days(7), end),
                no2_trend_24h,
            },
        ));
        idx = end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::location::Location;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn at(hours: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + TimeDelta::hours(hours)
    }

    fn obs(station: &str, hours: i64, value: f64) -> GroundTruthObservation {
        GroundTruthObservation {
            station_id: StationId::from(station),
            location: Location::new(34.0, -118.0),
            timestamp: at(hours),
            value,
        }
    }

    #[test]
    fn test_24h_window_is_time_based() {
        let series = vec![
            obs("6_037_1103", 0, 10.0),
            obs("6_037_1103", 23, 20.0),
            obs("6_037_1103", 25, 5.0),
        ];
        let index = HistoricalIndex::build(&series);
        let id = StationId::from("6_037_1103");

        let at_25 = index.get(&id, at(25)).unwrap();
        assert_relative_eq!(at_25.no2_avg_24h, 12.5);
        assert_relative_eq!(at_25.no2_avg_7d, 35.0 / 3.0);

        let at_23 = index.get(&id, at(23)).unwrap();
        assert_relative_eq!(at_23.no2_avg_24h, 15.0);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let series = vec![obs("a", 0, 10.0), obs("a", 24, 30.0)];
        let index = HistoricalIndex::build(&series);
        let at_24 = index.get(&StationId::from("a"), at(24)).unwrap();
        assert_relative_eq!(at_24.no2_avg_24h, 20.0);
    }

    #[test]
    fn test_gap_does_not_widen_window() {
        let series = vec![obs("a", 0, 10.0), obs("a", 48, 30.0)];
        let index = HistoricalIndex::build(&series);
        let at_48 = index.get(&StationId::from("a"), at(48)).unwrap();
        assert_relative_eq!(at_48.no2_avg_24h, 30.0);
        assert_relative_eq!(at_48.no2_avg_7d, 20.0);
    }

    #[test]
    fn test_trend_uses_exact_24h_lookback() {
        let series = vec![obs("a", 0, 10.0), obs("a", 24, 15.0), obs("a", 30, 8.0)];
        let index = HistoricalIndex::build(&series);
        let id = StationId::from("a");
        assert_relative_eq!(index.get(&id, at(24)).unwrap().no2_trend_24h, 5.0 / 10.1);
        // Nothing at exactly t-24h.
        assert_eq!(index.get(&id, at(30)).unwrap().no2_trend_24h, 0.0);
        assert_eq!(index.get(&id, at(0)).unwrap().no2_trend_24h, 0.0);
    }

    #[test]
    fn test_stations_are_independent_and_unordered_input_is_sorted() {
        let series = vec![obs("b", 5, 100.0), obs("a", 5, 4.0), obs("a", 1, 2.0)];
        let index = HistoricalIndex::build(&series);
        let a = index.get(&StationId::from("a"), at(5)).unwrap();
        assert_relative_eq!(a.no2_avg_24h, 3.0);
        let b = index.get(&StationId::from("b"), at(5)).unwrap();
        assert_relative_eq!(b.no2_avg_24h, 100.0);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_duplicate_times_use_all_values_and_last_for_trend() {
        let series = vec![obs("a", 0, 10.0), obs("a", 24, 12.0), obs("a", 24, 20.0)];
        let index = HistoricalIndex::build(&series);
        let at_24 = index.get(&StationId::from("a"), at(24)).unwrap();
        assert_relative_eq!(at_24.no2_avg_24h, 14.0);
        assert_relative_eq!(at_24.no2_trend_24h, 10.0 / 10.1);
    }

    #[test]
    fn test_string_lookup_and_missing_key() {
        let series = vec![obs("6_037_1103", 2, 9.0)];
        let index = HistoricalIndex::build(&series);
        let found = index.get_str("6_037_1103", "2024-01-01 02:00:00").unwrap();
        assert_relative_eq!(found.no2_avg_24h, 9.0);
        assert!(index.get_str("6_037_1103", "2024-01-01 03:00:00").is_none());
        assert!(index.get_str("6_037_1103", "garbage").is_none());
        assert!(index.get_str("other", "2024-01-01 02:00:00").is_none());
    }

    #[test]
    fn test_non_finite_values_are_ignored() {
        let series = vec![obs("a", 0, f64::NAN), obs("a", 1, 4.0)];
        let index = HistoricalIndex::build(&series);
        assert!(index.get(&StationId::from("a"), at(0)).is_none());
        assert_relative_eq!(index.get(&StationId::from("a"), at(1)).unwrap().no2_avg_24h, 4.0);
    }
}
