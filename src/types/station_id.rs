use serde::{Deserialize, Serialize};
use std::fmt;

/// Ground-truth monitor identifier: `{state}_{county}_{site}`.
///
/// County and site codes are zero-padded to 3 and 4 digits so that, for
/// example, county `1` / site `23` and county `12` / site `3` never collide.
///
/// # Examples
///
/// ```
/// use no2cast::StationId;
///
/// let id = StationId::new("6", "37", "1103");
/// assert_eq!(id.as_str(), "6_037_1103");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StationId(String);

impl StationId {
    pub fn new(state_code: &str, county_code: &str, site_number: &str) -> Self {
        StationId(format!(
            "{}_{:0>3}_{:0>4}",
            state_code.trim(),
            county_code.trim(),
            site_number.trim()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StationId {
    /// Wraps an already composed identifier.
    fn from(id: &str) -> Self {
        StationId(id.to_string())
    }
}
