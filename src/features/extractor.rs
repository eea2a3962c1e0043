//! Builds one [`FeatureVector`] from a snapshot, a target location and the
//! conditions at that hour.

use crate::features::geographic::urban_proximity;
use crate::grid::cell_store::GridCellStore;
use crate::grid::stats::CellStats;
use crate::history::aggregator::{HistoricalFeatures, HistoricalIndex};
use crate::physics::PhysicsModel;
use crate::types::feature_vector::FeatureVector;
use crate::types::location::Location;
use crate::types::station_id::StationId;
use bon::bon;
use chrono::{Datelike, NaiveDateTime};
use std::f64::consts::PI;

const NEIGHBORHOOD_RADII_KM: [f64; 3] = [5.0, 10.0, 20.0];
const UPWIND_DISTANCES_KM: [f64; 3] = [10.0, 20.0, 30.0];
const DIRECTIONAL_DISTANCE_KM: f64 = 10.0;
const COLLECT_RADIUS_KM: f64 = 5.0;

const GRADIENT_SCALE: f64 = 20000.0;
const CENTER_GRADIENT_SCALE: f64 = 10000.0;

/// Feature extraction with a fixed physical baseline.
///
/// Stateless apart from the model constants; the same inputs always produce
/// the same vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor {
    physics: PhysicsModel,
}

#[bon]
impl FeatureExtractor {
    pub fn new(physics: PhysicsModel) -> Self {
        FeatureExtractor { physics }
    }

    pub fn physics(&self) -> &PhysicsModel {
        &self.physics
    }

    /// Extracts the feature vector for `target`.
    ///
    /// `hour` is the UTC hour; the vector carries the local hour. `day_of_week`
    /// counts from Monday = 0. Historical features are looked up only when
    /// `station_id`, `timestamp` and `history` are all given, otherwise they
    /// are zero. Without a `timestamp`, `day_of_year`, `month_sin` and
    /// `month_cos` are zero.
    ///
    /// Returns `None` for an empty snapshot. The center value is passed
    /// through unchecked; callers drop vectors whose center is not a finite
    /// positive column density.
    #[builder]
    pub fn extract(
        &self,
        cells: &GridCellStore,
        target: Location,
        wind_speed: f64,
        wind_direction: f64,
        pbl_height: f64,
        temperature: f64,
        precipitation: f64,
        hour: u32,
        day_of_week: u32,
        month: u32,
        station_id: Option<&StationId>,
        timestamp: Option<NaiveDateTime>,
        history: Option<&HistoricalIndex>,
    ) -> Option<FeatureVector> {
        let center = cells.nearest(target)?.value;

        let [near_5, near_10, near_20] = NEIGHBORHOOD_RADII_KM
            .map(|radius| CellStats::from_cells(cells.within_radius(target, radius)));

        let [upwind_10, upwind_20, upwind_30] = UPWIND_DISTANCES_KM.map(|distance| {
            CellStats::from_cells(cells.around_projected(
                target,
                wind_direction,
                distance,
                COLLECT_RADIUS_KM,
            ))
        });
        let downwind_bearing = (wind_direction + 180.0) % 360.0;
        let downwind_10 = CellStats::from_cells(cells.around_projected(
            target,
            downwind_bearing,
            DIRECTIONAL_DISTANCE_KM,
            COLLECT_RADIUS_KM,
        ));

        let [north, east, south, west] = [0.0, 90.0, 180.0, 270.0].map(|bearing| {
            CellStats::from_cells(cells.around_projected(
                target,
                bearing,
                DIRECTIONAL_DISTANCE_KM,
                COLLECT_RADIUS_KM,
            ))
        });

        let local_hour = self.physics.local_hour(hour);
        let physics_prediction = self.physics.surface_estimate(center, pbl_height, hour);
        let geo = urban_proximity(target);

        let historical = match (station_id, timestamp, history) {
            (Some(id), Some(ts), Some(index)) => index.get(id, ts).unwrap_or_default(),
            _ => HistoricalFeatures::default(),
        };

        let (day_of_year, month_sin, month_cos) = match timestamp {
            Some(ts) => (
                ts.ordinal() as f64,
                (2.0 * PI * month as f64 / 12.0).sin(),
                (2.0 * PI * month as f64 / 12.0).cos(),
            ),
            None => (0.0, 0.0, 0.0),
        };

        let wind_radians = wind_direction.to_radians();

        Some(FeatureVector {
            no2_column_center: center,
            urban_proximity_index: geo.urban_proximity_index,
            distance_to_nearest_city_km: geo.distance_to_nearest_city_km,

            no2_avg_5km: near_5.avg,
            no2_max_5km: near_5.max,
            no2_min_5km: near_5.min,
            no2_std_5km: near_5.std,
            no2_avg_10km: near_10.avg,
            no2_max_10km: near_10.max,
            no2_min_10km: near_10.min,
            no2_std_10km: near_10.std,
            no2_avg_20km: near_20.avg,
            no2_max_20km: near_20.max,
            no2_min_20km: near_20.min,
            no2_std_20km: near_20.std,

            no2_upwind_10km_avg: upwind_10.avg,
            no2_upwind_10km_max: upwind_10.max,
            no2_upwind_10km_std: upwind_10.std,
            no2_upwind_20km_avg: upwind_20.avg,
            no2_upwind_20km_max: upwind_20.max,
            no2_upwind_20km_std: upwind_20.std,
            no2_upwind_30km_avg: upwind_30.avg,
            no2_upwind_30km_max: upwind_30.max,
            no2_upwind_30km_std: upwind_30.std,

            no2_downwind_10km_avg: downwind_10.avg,
            no2_downwind_10km_max: downwind_10.max,
            no2_downwind_10km_std: downwind_10.std,

            no2_north_10km: north.avg,
            no2_north_std_10km: north.std,
            no2_east_10km: east.avg,
            no2_east_std_10km: east.std,
            no2_south_10km: south.avg,
            no2_south_std_10km: south.std,
            no2_west_10km: west.avg,
            no2_west_std_10km: west.std,

            gradient_ns: (north.avg - south.avg) / GRADIENT_SCALE,
            gradient_ew: (east.avg - west.avg) / GRADIENT_SCALE,
            gradient_upwind_downwind: (upwind_10.avg - downwind_10.avg) / GRADIENT_SCALE,
            gradient_center_avg: (center - near_10.avg) / CENTER_GRADIENT_SCALE,

            wind_speed,
            wind_direction,
            wind_u: wind_speed * wind_radians.cos(),
            wind_v: wind_speed * wind_radians.sin(),
            pbl_height,
            temperature,
            precipitation,
            pbl_normalized: pbl_height / self.physics.pbl_reference,

            hour: local_hour as f64,
            day_of_week: day_of_week as f64,
            month: month as f64,
            hour_sin: (2.0 * PI * local_hour as f64 / 24.0).sin(),
            hour_cos: (2.0 * PI * local_hour as f64 / 24.0).cos(),
            day_sin: (2.0 * PI * day_of_week as f64 / 7.0).sin(),
            day_cos: (2.0 * PI * day_of_week as f64 / 7.0).cos(),

            physics_prediction,

            no2_avg_24h: historical.no2_avg_24h,
            no2_avg_7d: historical.no2_avg_7d,
            no2_trend_24h: historical.no2_trend_24h,

            wind_speed_x_upwind_no2: wind_speed * upwind_30.avg,
            hour_x_urban: local_hour as f64 * geo.urban_proximity_index,
            pbl_x_center_no2: pbl_height * center,

            day_of_year,
            month_sin,
            month_cos,
        })
    }
}
