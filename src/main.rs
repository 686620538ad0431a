use std::path::PathBuf;

use anyhow::{Context, Result};
use argh::FromArgs;
use holiday_planner::{AppState, PlannerConfig, TripWeatherLookup, logging, web};

/// Holiday planner: weather for your travel destinations and dates.
#[derive(FromArgs)]
struct Args {
    /// path to a TOML config file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// port to listen on, overrides the config file
    #[argh(option, short = 'p')]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let mut config = PlannerConfig::load_from_path(args.config)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let _telemetry = logging::init(&config.logging)?;
    tracing::info!(
        "Starting holiday planner {} (geocoder: {:?}, store: {:?} at {})",
        holiday_planner::VERSION,
        config.geocoding.provider,
        config.store.backend,
        config.store.location
    );

    let lookup = TripWeatherLookup::from_config(&config).context("Failed to set up services")?;
    web::run(&config.server, AppState::new(lookup)).await
}
