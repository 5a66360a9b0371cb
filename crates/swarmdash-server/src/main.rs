//! Relay binary for the Swarmdash dashboard.
//!
//! This is the main entry point that wires together the metrics
//! collector, the snapshot hub, the Observer API server, and the
//! refresh loop. It loads configuration, initializes all subsystems,
//! and then runs forever: the refresh loop polls the metrics store on
//! a fixed interval while the Observer serves viewers concurrently.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `swarmdash-config.yaml`
//! 3. Build the dashboard collector (`InfluxDB` client)
//! 4. Create the shared snapshot hub
//! 5. Start the Observer API server on a background task
//! 6. Run the refresh loop, forever

mod config;
mod error;

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use swarmdash_core::{SnapshotHub, run_refresh_loop};
use swarmdash_influx::DashboardCollector;
use swarmdash_observer::{AppState, spawn_observer};

use crate::config::RelayConfig;
use crate::error::RelayError;

/// Application entry point for the relay.
///
/// Initializes all subsystems and runs the refresh loop. Returns an
/// error only when startup fails; once running, the process ends with
/// process shutdown.
///
/// # Errors
///
/// Returns an error if configuration loading, collector construction,
/// or the Observer server startup fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("swarmdash-server starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        influx_url = config.influx.url,
        bucket = config.influx.bucket,
        interval_secs = config.refresh.interval_secs,
        port = config.server.port,
        "Configuration loaded"
    );

    // 3. Build the dashboard collector.
    let collector = DashboardCollector::new(config.influx.clone(), config.collector.clone())
        .map_err(|e| RelayError::Collector {
            message: format!("{e}"),
        })?;
    info!(
        miner_sample_size = config.collector.miner_sample_size,
        "Dashboard collector ready"
    );

    // 4. Create the shared snapshot hub.
    let hub = Arc::new(SnapshotHub::new());

    // 5. Start the Observer API server.
    let app_state = Arc::new(AppState::new(Arc::clone(&hub)));
    let _observer_handle = spawn_observer(config.server.clone(), app_state)
        .await
        .map_err(|e| RelayError::Observer {
            message: format!("{e}"),
        })?;
    info!(port = config.server.port, "Observer API server started");

    // 6. Run the refresh loop. The first cycle fetches immediately, so
    //    early viewers get data as soon as the store answers.
    run_refresh_loop(hub, collector, config.refresh).await;

    Ok(())
}

/// Load the relay configuration from `swarmdash-config.yaml`.
///
/// Looks for the config file relative to the current working
/// directory; defaults are used when it does not exist.
fn load_config() -> Result<RelayConfig, RelayError> {
    let config_path = Path::new("swarmdash-config.yaml");
    if config_path.exists() {
        let config = RelayConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        let mut config = RelayConfig::default();
        config.influx.apply_env_overrides();
        Ok(config)
    }
}
