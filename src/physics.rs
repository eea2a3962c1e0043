//! Closed-form column-to-surface conversion used as the physical prior.

use serde::{Deserialize, Serialize};

/// Calibrated constants of the physical baseline.
///
/// The regression model learns the residual of this baseline, so the
/// defaults must not change between dataset builds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsModel {
    pub base_factor: f64,
    pub no2_factor: f64,
    /// Reference boundary-layer height in meters.
    pub pbl_reference: f64,
    /// Lowest boundary-layer height used in the dilution term.
    pub pbl_floor: f64,
    /// Offset from UTC to local time in hours.
    pub utc_offset_hours: i32,
}

impl Default for PhysicsModel {
    fn default() -> Self {
        PhysicsModel {
            base_factor: 2e-16,
            no2_factor: 1.8749,
            pbl_reference: 800.0,
            pbl_floor: 300.0,
            utc_offset_hours: -8,
        }
    }
}

impl PhysicsModel {
    /// Local hour for a UTC hour, in `0..24`.
    pub fn local_hour(&self, utc_hour: u32) -> u32 {
        (utc_hour as i32 + self.utc_offset_hours).rem_euclid(24) as u32
    }

    /// Traffic-driven multiplier for a local hour: morning rush 1.15, midday
    /// mixing 0.85, evening rush 1.10, otherwise 1.0.
    pub fn diurnal_factor(&self, local_hour: u32) -> f64 {
        match local_hour {
            6..=9 => 1.15,
            10..=15 => 0.85,
            16..=19 => 1.10,
            _ => 1.0,
        }
    }

    /// Surface concentration in ppb before the diurnal adjustment. Zero for
    /// non-positive or non-finite column densities.
    pub fn column_to_surface(&self, column_density: f64, pbl_height: f64) -> f64 {
        if !column_density.is_finite() || column_density <= 0.0 {
            return 0.0;
        }
        let base = column_density * self.base_factor * self.no2_factor;
        base * (self.pbl_reference / pbl_height.max(self.pbl_floor)).sqrt()
    }

    /// Full baseline estimate in ppb.
    ///
    /// # Examples
    ///
    /// ```
    /// use no2cast::PhysicsModel;
    ///
    /// let model = PhysicsModel::default();
    /// // 16 UTC is 08 local, inside the morning rush.
    /// let ppb = model.surface_estimate(1e16, 800.0, 16);
    /// assert_eq!(ppb, 1e16 * 2e-16 * 1.8749 * 1.0 * 1.15);
    /// ```
    pub fn surface_estimate(&self, column_density: f64, pbl_height: f64, utc_hour: u32) -> f64 {
        let local_hour = self.local_hour(utc_hour);
        self.column_to_surface(column_density, pbl_height) * self.diurnal_factor(local_hour)
    }
}
