//! The fixed-schema feature record handed to the correction regressor.
//!
//! Field order is part of the contract: a trained model consumes features
//! positionally, matched against a persisted list of names. [`FEATURE_NAMES`]
//! and [`FeatureVector::to_values`] are generated from the same list as the
//! struct so they cannot drift apart.

use serde::{Deserialize, Serialize};

macro_rules! feature_vector {
    ($($field:ident => $name:literal),+ $(,)?) => {
        /// One feature record derived from a grid snapshot, a target location and
        /// a timestamp.
        ///
        /// Every field is finite for every emitted record; statistics without
        /// underlying data are `0`.
        #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
        pub struct FeatureVector {
            $(
                #[serde(rename = $name)]
                pub $field: f64,
            )+
        }

        /// Feature names in positional order.
        pub const FEATURE_NAMES: &[&str] = &[$($name),+];

        impl FeatureVector {
            /// Feature values in the order of [`FEATURE_NAMES`].
            pub fn to_values(&self) -> Vec<f64> {
                vec![$(self.$field),+]
            }

            /// Looks up a feature by its persisted name.
            pub fn get(&self, name: &str) -> Option<f64> {
                match name {
                    $($name => Some(self.$field),)+
                    _ => None,
                }
            }
        }
    };
}

feature_vector! {
    no2_column_center => "no2_column_center",
    urban_proximity_index => "urban_proximity_index",
    distance_to_nearest_city_km => "distance_to_nearest_city_km",

    no2_avg_5km => "no2_avg_5km",
    no2_max_5km => "no2_max_5km",
    no2_min_5km => "no2_min_5km",
    no2_std_5km => "no2_std_5km",
    no2_avg_10km => "no2_avg_10km",
    no2_max_10km => "no2_max_10km",
    no2_min_10km => "no2_min_10km",
    no2_std_10km => "no2_std_10km",
    no2_avg_20km => "no2_avg_20km",
    no2_max_20km => "no2_max_20km",
    no2_min_20km => "no2_min_20km",
    no2_std_20km => "no2_std_20km",

    no2_upwind_10km_avg => "no2_upwind_10km_avg",
    no2_upwind_10km_max => "no2_upwind_10km_max",
    no2_upwind_10km_std => "no2_upwind_10km_std",
    no2_upwind_20km_avg => "no2_upwind_20km_avg",
    no2_upwind_20km_max => "no2_upwind_20km_max",
    no2_upwind_20km_std => "no2_upwind_20km_std",
    no2_upwind_30km_avg => "no2_upwind_30km_avg",
    no2_upwind_30km_max => "no2_upwind_30km_max",
    no2_upwind_30km_std => "no2_upwind_30km_std",

    no2_downwind_10km_avg => "no2_downwind_10km_avg",
    no2_downwind_10km_max => "no2_downwind_10km_max",
    no2_downwind_10km_std => "no2_downwind_10km_std",

    no2_north_10km => "no2_north_10km",
    no2_north_std_10km => "no2_north_std_10km",
    no2_east_10km => "no2_east_10km",
    no2_east_std_10km => "no2_east_std_10km",
    no2_south_10km => "no2_south_10km",
    no2_south_std_10km => "no2_south_std_10km",
    no2_west_10km => "no2_west_10km",
    no2_west_std_10km => "no2_west_std_10km",

    gradient_ns => "gradient_NS",
    gradient_ew => "gradient_EW",
    gradient_upwind_downwind => "gradient_upwind_downwind",
    gradient_center_avg => "gradient_center_avg",

    wind_speed => "wind_speed",
    wind_direction => "wind_direction",
    wind_u => "wind_u",
    wind_v => "wind_v",
    pbl_height => "pbl_height",
    temperature => "temperature",
    precipitation => "precipitation",
    pbl_normalized => "pbl_normalized",

    hour => "hour",
    day_of_week => "day_of_week",
    month => "month",
    hour_sin => "hour_sin",
    hour_cos => "hour_cos",
    day_sin => "day_sin",
    day_cos => "day_cos",

    physics_prediction => "physics_prediction",

    no2_avg_24h => "no2_avg_24h",
    no2_avg_7d => "no2_avg_7d",
    no2_trend_24h => "no2_trend_24h",

    wind_speed_x_upwind_no2 => "wind_speed_x_upwind_no2",
    hour_x_urban => "hour_x_urban",
    pbl_x_center_no2 => "pbl_x_center_no2",

    day_of_year => "day_of_year",
    month_sin => "month_sin",
    month_cos => "month_cos",
}

impl FeatureVector {
    /// Whether every feature value is finite.
    pub fn is_finite(&self) -> bool {
        self.to_values().iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique_and_complete() {
        assert_eq!(FEATURE_NAMES.len(), 64);
        let unique: HashSet<_> = FEATURE_NAMES.iter().collect();
        assert_eq!(unique.len(), FEATURE_NAMES.len());
        assert_eq!(FeatureVector::default().to_values().len(), FEATURE_NAMES.len());
    }

    #[test]
    fn test_order_starts_and_ends_as_persisted() {
        assert_eq!(FEATURE_NAMES[0], "no2_column_center");
        assert_eq!(FEATURE_NAMES[3], "no2_avg_5km");
        assert_eq!(FEATURE_NAMES[35], "gradient_NS");
        assert_eq!(FEATURE_NAMES[FEATURE_NAMES.len() - 1], "month_cos");
    }

    #[test]
    fn test_full_order_is_fixed() {
        let expected = [
            "no2_column_center",
            "urban_proximity_index",
            "distance_to_nearest_city_km",
            "no2_avg_5km",
            "no2_max_5km",
            "no2_min_5km",
            "no2_std_5km",
            "no2_avg_10km",
            "no2_max_10km",
            "no2_min_10km",
            "no2_std_10km",
            "no2_avg_20km",
            "no2_max_20km",
            "no2_min_20km",
            "no2_std_20km",
            "no2_upwind_10km_avg",
            "no2_upwind_10km_max",
            "no2_upwind_10km_std",
            "no2_upwind_20km_avg",
            "no2_upwind_20km_max",
            "no2_upwind_20km_std",
            "no2_upwind_30km_avg",
            "no2_upwind_30km_max",
            "no2_upwind_30km_std",
            "no2_downwind_10km_avg",
            "no2_downwind_10km_max",
            "no2_downwind_10km_std",
            "no2_north_10km",
            "no2_north_std_10km",
            "no2_east_10km",
            "no2_east_std_10km",
            "no2_south_10km",
            "no2_south_std_10km",
            "no2_west_10km",
            "no2_west_std_10km",
            "gradient_NS",
            "gradient_EW",
            "gradient_upwind_downwind",
            "gradient_center_avg",
            "wind_speed",
            "wind_direction",
            "wind_u",
            "wind_v",
            "pbl_height",
            "temperature",
            "precipitation",
            "pbl_normalized",
            "hour",
            "day_of_week",
            "month",
            "hour_sin",
            "hour_cos",
            "day_sin",
            "day_cos",
            "physics_prediction",
            "no2_avg_24h",
            "no2_avg_7d",
            "no2_trend_24h",
            "wind_speed_x_upwind_no2",
            "hour_x_urban",
            "pbl_x_center_no2",
            "day_of_year",
            "month_sin",
            "month_cos",
        ];
        assert_eq!(FEATURE_NAMES, &expected[..]);
    }

    #[test]
    fn test_get_by_name_matches_positions() {
        let mut features = FeatureVector::default();
        features.gradient_ns = 1.5;
        features.month_cos = -0.5;
        let values = features.to_values();
        for (i, name) in FEATURE_NAMES.iter().enumerate() {
            assert_eq!(features.get(name), Some(values[i]));
        }
        assert_eq!(features.get("gradient_NS"), Some(1.5));
        assert_eq!(features.get("not_a_feature"), None);
    }

    #[test]
    fn test_serializes_with_persisted_names() {
        let features = FeatureVector {
            gradient_ew: 2.0,
            ..Default::default()
        };
        let json = serde_json::to_value(features).unwrap();
        assert_eq!(json["gradient_EW"], 2.0);
        assert!(json.get("gradient_ew").is_none());
    }
}
