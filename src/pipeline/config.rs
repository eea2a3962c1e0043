use bon::bon;
use chrono::TimeDelta;

pub const DEFAULT_WINDOW_HOURS: i64 = 2;
pub const DEFAULT_MAX_OBSERVATIONS: usize = 200;
pub const DEFAULT_METEO_NEIGHBORS: usize = 3;

/// Knobs of a dataset build.
///
/// # Examples
///
/// ```
/// use no2cast::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .window_hours(1)
///     .max_observations(50)
///     .parallel(false)
///     .build();
/// assert_eq!(config.max_observations, 50);
/// assert_eq!(config.meteo_neighbors, 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Observations within `±window` of the snapshot time are paired with it.
    pub window: TimeDelta,
    /// Cap on observations paired with a single snapshot.
    pub max_observations: usize,
    /// Stations used by each meteorological interpolation.
    pub meteo_neighbors: usize,
    /// Process snapshots on the rayon thread pool.
    pub parallel: bool,
    /// Only the first `max_files` snapshots (in sorted order) are used.
    pub max_files: Option<usize>,
}

#[bon]
impl PipelineConfig {
    /// Builds a configuration; every omitted knob takes its default
    /// (±2 h window, 200 observations, 3 stations, parallel, no file limit).
    #[builder]
    pub fn new(
        window_hours: Option<i64>,
        max_observations: Option<usize>,
        meteo_neighbors: Option<usize>,
        parallel: Option<bool>,
        max_files: Option<usize>,
    ) -> Self {
        PipelineConfig {
            window: TimeDelta::hours(window_hours.unwrap_or(DEFAULT_WINDOW_HOURS)),
            max_observations: max_observations.unwrap_or(DEFAULT_MAX_OBSERVATIONS),
            meteo_neighbors: meteo_neighbors.unwrap_or(DEFAULT_METEO_NEIGHBORS),
            parallel: parallel.unwrap_or(true),
            max_files,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig::builder().build()
    }
}
