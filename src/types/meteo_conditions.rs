use serde::{Deserialize, Serialize};

/// The eight meteorological variables interpolated for a location and hour.
///
/// Every field is always populated: when no station data is available for a
/// variable it carries the documented physical default (see
/// [`MeteoConditions::default`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeteoConditions {
    /// Wind speed at 10 m.
    pub wind_speed: f64,
    /// Direction the wind is coming from, degrees clockwise from north.
    pub wind_direction: f64,
    /// Air temperature at 2 m in °C.
    pub temperature: f64,
    /// Precipitation in mm.
    pub precipitation: f64,
    /// Planetary boundary layer height in meters.
    pub pbl_height: f64,
    /// Surface pressure in hPa.
    pub surface_pressure: f64,
    /// Relative humidity at 2 m in percent.
    pub relative_humidity: f64,
    /// Total cloud cover in percent.
    pub cloud_cover: f64,
}

impl Default for MeteoConditions {
    fn default() -> Self {
        Self {
            wind_speed: 5.0,
            wind_direction: 270.0,
            temperature: 20.0,
            precipitation: 0.0,
            pbl_height: 800.0,
            surface_pressure: 1013.0,
            relative_humidity: 60.0,
            cloud_cover: 50.0,
        }
    }
}

/// Identifies one of the eight variables of [`MeteoConditions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeteoVariable {
    WindSpeed,
    WindDirection,
    Temperature,
    Precipitation,
    PblHeight,
    SurfacePressure,
    RelativeHumidity,
    CloudCover,
}

impl MeteoVariable {
    pub const ALL: [MeteoVariable; 8] = [
        MeteoVariable::WindSpeed,
        MeteoVariable::WindDirection,
        MeteoVariable::Temperature,
        MeteoVariable::Precipitation,
        MeteoVariable::PblHeight,
        MeteoVariable::SurfacePressure,
        MeteoVariable::RelativeHumidity,
        MeteoVariable::CloudCover,
    ];
}

impl MeteoConditions {
    pub fn get(&self, variable: MeteoVariable) -> f64 {
        match variable {
            MeteoVariable::WindSpeed => self.wind_speed,
            MeteoVariable::WindDirection => self.wind_direction,
            MeteoVariable::Temperature => self.temperature,
            MeteoVariable::Precipitation => self.precipitation,
            MeteoVariable::PblHeight => self.pbl_height,
            MeteoVariable::SurfacePressure => self.surface_pressure,
            MeteoVariable::RelativeHumidity => self.relative_humidity,
            MeteoVariable::CloudCover => self.cloud_cover,
        }
    }

    pub fn set(&mut self, variable: MeteoVariable, value: f64) {
        match variable {
            MeteoVariable::WindSpeed => self.wind_speed = value,
            MeteoVariable::WindDirection => self.wind_direction = value,
            MeteoVariable::Temperature => self.temperature = value,
            MeteoVariable::Precipitation => self.precipitation = value,
            MeteoVariable::PblHeight => self.pbl_height = value,
            MeteoVariable::SurfacePressure => self.surface_pressure = value,
            MeteoVariable::RelativeHumidity => self.relative_humidity = value,
            MeteoVariable::CloudCover => self.cloud_cover = value,
        }
    }
}
