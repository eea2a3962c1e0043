//! Geographic coordinate type shared by grid cells, meteorological stations and
//! ground-truth observations.

use serde::{Deserialize, Serialize};

/// A point on the Earth's surface in decimal degrees.
///
/// No datum correction is performed; coordinates are treated as WGS84-like
/// spherical latitude/longitude.
///
/// # Examples
///
/// ```
/// use no2cast::Location;
///
/// let los_angeles = Location::new(34.0522, -118.2437);
/// assert_eq!(los_angeles.latitude, 34.0522);
/// assert_eq!(los_angeles.longitude, -118.2437);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees (positive for North, negative for South).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East, negative for West).
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// The `[latitude, longitude]` pair used as an R-tree query point.
    pub(crate) fn as_point(&self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }
}

impl From<(f64, f64)> for Location {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}
