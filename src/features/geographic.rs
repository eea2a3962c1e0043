//! Urban-proximity proxies derived from a fixed set of large Californian
//! cities.

use crate::geodesy::haversine_km;
use crate::types::location::Location;

/// A reference city and its 2020 population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceCity {
    pub name: &'static str,
    pub location: Location,
    pub population: f64,
}

const fn city(name: &'static str, latitude: f64, longitude: f64, population: f64) -> ReferenceCity {
    ReferenceCity {
        name,
        location: Location {
            latitude,
            longitude,
        },
        population,
    }
}

pub const REFERENCE_CITIES: [ReferenceCity; 10] = [
    city("Los_Angeles", 34.06, -118.24, 3_900_000.0),
    city("San_Diego", 32.72, -117.14, 1_400_000.0),
    city("San_Jose", 37.36, -121.91, 1_000_000.0),
    city("San_Francisco", 37.79, -122.41, 875_000.0),
    city("Fresno", 36.73, -119.76, 542_000.0),
    city("Sacramento", 38.56, -121.55, 525_000.0),
    city("Long_Beach", 33.78, -118.21, 466_000.0),
    city("Oakland", 37.79, -122.41, 440_000.0),
    city("Bakersfield", 35.40, -119.04, 403_000.0),
    city("Anaheim", 33.85, -117.91, 346_000.0),
];

const URBAN_INDEX_SCALE: f64 = 1_000_000.0;
const MIN_CITY_DISTANCE_KM: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UrbanProximity {
    /// `Σ population / max(distance_km, 1)` over the reference cities, in
    /// millions.
    pub urban_proximity_index: f64,
    pub distance_to_nearest_city_km: f64,
}

pub fn urban_proximity(location: Location) -> UrbanProximity {
    let mut weight_sum = 0.0;
    let mut nearest = f64::INFINITY;
    for city in &REFERENCE_CITIES {
        let distance = haversine_km(location, city.location);
        weight_sum += city.population / distance.max(MIN_CITY_DISTANCE_KM);
        nearest = nearest.min(distance);
    }
    UrbanProximity {
        urban_proximity_index: weight_sum / URBAN_INDEX_SCALE,
        distance_to_nearest_city_km: nearest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_downtown_los_angeles_is_most_urban() {
        let downtown = urban_proximity(Location::new(34.06, -118.24));
        assert_eq!(downtown.distance_to_nearest_city_km, 0.0);
        // Los Angeles alone contributes 3.9 at a clamped 1 km.
        assert!(downtown.urban_proximity_index > 3.9);

        let desert = urban_proximity(Location::new(35.0, -115.5));
        assert!(desert.urban_proximity_index < downtown.urban_proximity_index);
        assert!(desert.distance_to_nearest_city_km > 100.0);
    }

    #[test]
    fn test_index_matches_weighted_sum() {
        let target = Location::new(36.0, -119.0);
        let expected: f64 = REFERENCE_CITIES
            .iter()
            .map(|c| c.population / haversine_km(target, c.location).max(1.0))
            .sum::<f64>()
            / 1e6;
        assert_relative_eq!(
            urban_proximity(target).urban_proximity_index,
            expected,
            epsilon = 1e-12
        );
    }
}
