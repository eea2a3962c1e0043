use anyhow::Context;
use clap::Parser;
use cli::{BuildDatasetArgs, Cli, Command, InterpolateArgs};
use log::info;
use no2cast::{
    ensure_cache_dir_exists, get_cache_dir, list_snapshots, load_ground_truth_csv,
    write_feature_names, DatasetBuilder, HistoricalIndex, JsonSnapshotParser, Location,
    MeteoIndex, PipelineConfig,
};

mod cli;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Cli::parse();
    match args.cmd {
        Command::BuildDataset(build_args) => build_dataset(build_args),
        Command::Interpolate(interpolate_args) => interpolate(interpolate_args),
    }
}

fn build_dataset(args: BuildDatasetArgs) -> anyhow::Result<()> {
    let cache_dir = match args.cache_dir {
        Some(dir) => dir,
        None => get_cache_dir()?,
    };
    ensure_cache_dir_exists(&cache_dir)?;

    let meteo = MeteoIndex::from_dir_cached(&args.meteo, &cache_dir)
        .with_context(|| format!("loading meteorology from {}", args.meteo.display()))?;
    let ground_truth = load_ground_truth_csv(&args.ground_truth)?;
    let history = HistoricalIndex::build(&ground_truth.observations);
    let snapshots = list_snapshots(&args.snapshots, &["json"])?;
    info!("Found {} snapshots in {}", snapshots.len(), args.snapshots.display());

    let config = PipelineConfig::builder()
        .window_hours(i64::from(args.window_hours))
        .max_observations(args.max_observations)
        .parallel(!args.sequential)
        .maybe_max_files(args.max_files)
        .build();

    let dataset = DatasetBuilder::builder()
        .parser(JsonSnapshotParser)
        .meteo(&meteo)
        .history(&history)
        .observations(&ground_truth.observations)
        .config(config)
        .build()
        .run(&snapshots)?;

    dataset.write(&args.output)?;
    if let Some(path) = &args.feature_names {
        write_feature_names(path)?;
    }
    println!(
        "{} samples written to {} ({} snapshots, {} records skipped)",
        dataset.len(),
        args.output.display(),
        dataset.snapshots_processed,
        dataset.skips.total_records()
    );
    Ok(())
}

fn interpolate(args: InterpolateArgs) -> anyhow::Result<()> {
    let meteo = MeteoIndex::from_dir(&args.meteo)?;
    let conditions = meteo
        .interpolate()
        .location(Location::new(args.lat, args.lon))
        .timestamp(args.time)
        .k(args.k)
        .call();
    println!("{}", serde_json::to_string_pretty(&conditions)?);
    Ok(())
}
