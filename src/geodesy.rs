//! Spherical-earth distance and projection helpers.
//!
//! Two distance measures live here on purpose: [`haversine_km`] is the exact
//! great-circle distance used for station ranking and the geographic proxies,
//! while [`flat_distance_km`] is the cheap degrees-times-111 approximation used
//! by every grid-cell neighbourhood query. Feature values depend on which one
//! is used where, so the two must not be swapped.

use crate::types::location::Location;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree in the flat-earth approximation.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Great-circle distance between two points in kilometers (haversine formula).
///
/// The result is symmetric bit-for-bit: swapping `a` and `b` only flips the sign
/// of the deltas, which are squared, and the cosine product commutes.
///
/// # Examples
///
/// ```
/// use no2cast::{haversine_km, Location};
///
/// let a = Location::new(34.05, -118.24);
/// assert_eq!(haversine_km(a, a), 0.0);
/// ```
pub fn haversine_km(a: Location, b: Location) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let sin_lat = (d_lat / 2.0).sin();
    let sin_lon = (d_lon / 2.0).sin();
    let h = sin_lat * sin_lat + (lat1.cos() * lat2.cos()) * (sin_lon * sin_lon);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Flat-earth approximate distance: `sqrt(dlat² + dlon²) * 111`.
///
/// Ignores the longitude shrinkage with latitude. All cell neighbourhood
/// searches use this measure.
pub fn flat_distance_km(a: Location, b: Location) -> f64 {
    let d_lat = a.latitude - b.latitude;
    let d_lon = a.longitude - b.longitude;
    (d_lat * d_lat + d_lon * d_lon).sqrt() * KM_PER_DEGREE
}

/// Solves the direct geodesic problem on a sphere: the point reached by
/// travelling `distance_km` from `origin` along `bearing_degrees`
/// (0 = north, 90 = east, clockwise).
pub fn project(origin: Location, bearing_degrees: f64, distance_km: f64) -> Location {
    let bearing = bearing_degrees.to_radians();
    let lat1 = origin.latitude.to_radians();
    let lon1 = origin.longitude.to_radians();
    let angular = distance_km / EARTH_RADIUS_KM;

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    Location::new(lat2.to_degrees(), lon2.to_degrees())
}
