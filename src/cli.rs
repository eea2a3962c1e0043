use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(about = "Surface NO2 feature extraction from satellite column density.")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pair snapshots with ground truth and write a training dataset.
    BuildDataset(BuildDatasetArgs),
    /// Print the interpolated meteorology at a point and hour as JSON.
    Interpolate(InterpolateArgs),
}

#[derive(Debug, Parser)]
pub struct BuildDatasetArgs {
    /// Directory of grid snapshot JSON files
    #[arg(long, env = "NO2CAST_SNAPSHOT_DIR")]
    pub snapshots: PathBuf,
    /// Directory of Open-Meteo station exports
    #[arg(long, env = "NO2CAST_METEO_DIR")]
    pub meteo: PathBuf,
    /// EPA hourly NO2 CSV
    #[arg(long, env = "NO2CAST_GROUND_TRUTH")]
    pub ground_truth: PathBuf,
    /// Output file, .parquet or .csv
    #[arg(long)]
    pub output: PathBuf,
    /// Where to write the feature-name list
    #[arg(long)]
    pub feature_names: Option<PathBuf>,
    /// Only use the first N snapshots
    #[arg(long)]
    pub max_files: Option<usize>,
    /// Half-width of the observation time window in hours
    #[arg(long, default_value_t = 2)]
    pub window_hours: u32,
    /// Cap on observations paired with one snapshot
    #[arg(long, default_value_t = 200)]
    pub max_observations: usize,
    /// Cache directory for parsed meteorological stations
    #[arg(long, env = "NO2CAST_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,
    /// Process snapshots one at a time
    #[arg(long)]
    pub sequential: bool,
}

#[derive(Debug, Parser)]
pub struct InterpolateArgs {
    /// Directory of Open-Meteo station exports
    #[arg(long, env = "NO2CAST_METEO_DIR")]
    pub meteo: PathBuf,
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
    /// Hour to interpolate, "YYYY-MM-DD HH:MM"
    #[arg(long, value_parser = parse_hour)]
    pub time: NaiveDateTime,
    /// Number of stations to weigh
    #[arg(long, default_value_t = 3)]
    pub k: usize,
}

fn parse_hour(raw: &str) -> Result<NaiveDateTime, String> {
    no2cast::parse_time(raw).map_err(|e| format!("expected YYYY-MM-DD HH:MM: {e}"))
}
