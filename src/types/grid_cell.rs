use crate::types::location::Location;
use serde::{Deserialize, Serialize};

/// One pixel of a satellite column-density snapshot.
///
/// `value` is the NO2 column density (molecules/cm²). Non-finite or
/// non-positive values are kept in the snapshot but excluded from every
/// aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
}

impl GridCell {
    pub fn new(latitude: f64, longitude: f64, value: f64) -> Self {
        Self {
            latitude,
            longitude,
            value,
        }
    }

    pub fn location(&self) -> Location {
        Location::new(self.latitude, self.longitude)
    }

    /// Whether this cell carries a usable measurement (finite and positive).
    pub fn is_valid(&self) -> bool {
        self.value.is_finite() && self.value > 0.0
    }
}
