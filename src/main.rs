//! REB Parser CLI - select seismic events from directories of REB bulletins.

use anyhow::{Context, Result, bail};
use clap::Parser;
use reb_parser::{
    config::Config,
    export::{OutputFormat, write_events, write_events_to_file},
    processor::DirectoryProcessor,
    region::Region,
    station::{StationCatalog, load_stations},
};
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// REB Parser - Select seismic events by region and corroborating stations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of bulletins to scan
    #[arg(env = "REB_ROOT")]
    root: Option<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, env = "REB_CONFIG")]
    config: Option<PathBuf>,

    /// JSON station catalog
    #[arg(long, env = "REB_STATIONS_FILE")]
    stations_file: Option<PathBuf>,

    /// Station that may corroborate an event (repeatable; default: all)
    #[arg(short = 's', long = "station")]
    stations: Vec<String>,

    /// Box region: upper latitude, lower latitude, left longitude, right longitude
    #[arg(
        long = "box",
        num_args = 4,
        value_names = ["LAT_MAX", "LAT_MIN", "LONG_MIN", "LONG_MAX"],
        allow_negative_numbers = true,
        conflicts_with = "ellipse"
    )]
    bounds: Option<Vec<f64>>,

    /// Ellipse region: semi-axes, rotation in degrees, centre latitude and longitude
    #[arg(
        long,
        num_args = 5,
        value_names = ["A", "B", "PHI", "LAT", "LONG"],
        allow_negative_numbers = true
    )]
    ellipse: Option<Vec<f64>>,

    /// Result file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Result format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Print run statistics to stderr
    #[arg(long)]
    summary: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = resolve_config(&args)?;
    config.validate()?;

    let root = config
        .root
        .clone()
        .context("No bulletin directory given (pass ROOT or set `root` in the config)")?;

    if !config.stations_file.exists() {
        bail!(
            "Station catalog not found: {}",
            config.stations_file.display()
        );
    }
    let stations = load_stations(&config.stations_file)?;
    let catalog = StationCatalog::select(&stations, &config.stations)?;
    info!(
        "Loaded {} stations, corroborating with: {}",
        stations.len(),
        catalog.names().join(", ")
    );

    let mut processor = DirectoryProcessor::new(config.region, catalog);
    processor.process_directories(&root)?;

    let events = processor.get_events();
    match config.output {
        Some(ref path) => {
            write_events_to_file(path, events, config.format)
                .with_context(|| format!("Failed to write results to {}", path.display()))?;
            info!("Wrote {} events to {}", events.len(), path.display());
        }
        None => write_events(io::stdout().lock(), events, config.format)?,
    }

    if args.summary {
        eprintln!("{}", processor.stats().summary());
    }

    Ok(())
}

/// Merge the config file with command-line overrides.
fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(ref root) = args.root {
        config.root = Some(root.clone());
    }
    if let Some(ref path) = args.stations_file {
        config.stations_file = path.clone();
    }
    if !args.stations.is_empty() {
        config.stations = args.stations.clone();
    }
    if let Some(region) = region_from_args(args) {
        config.region = region;
    }
    if let Some(ref path) = args.output {
        config.output = Some(path.clone());
    }
    if let Some(format) = args.format {
        config.format = format;
    }

    Ok(config)
}

fn region_from_args(args: &Args) -> Option<Region> {
    if let Some(ref b) = args.bounds
        && let [lat_max, lat_min, long_min, long_max] = b[..]
    {
        return Some(Region::Box {
            lat_max,
            lat_min,
            long_min,
            long_max,
        });
    }
    if let Some(ref e) = args.ellipse
        && let [a, b, phi, lat, long] = e[..]
    {
        return Some(Region::Ellipse {
            a,
            b,
            phi,
            lat,
            long,
        });
    }
    None
}
