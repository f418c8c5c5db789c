//! HomeSync CLI
//!
//! Command-line interface for the home-automation state sync service.

use std::path::PathBuf;

use clap::Parser;
use homesync::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "homesync")]
#[command(about = "Realtime state sync for a home-automation dashboard")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Store base URL (switches to the REST store)
    #[arg(long)]
    store_url: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, dashboard_port={:?}, store_url={:?}, log_level={:?}",
        args.config,
        args.dashboard_port,
        args.store_url,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }

    if let Some(base_url) = args.store_url {
        config.store = homesync::config::StoreConfig::Rest {
            base_url,
            reconnect_delay: std::time::Duration::from_secs(5),
        };
    }

    tracing::info!("Starting homesync service");
    tracing::debug!(
        "Store: {}, devices path: {}, signals path: {}",
        config.store.type_name(),
        config.paths.devices,
        config.paths.signals
    );

    homesync::run(config).await?;

    Ok(())
}
