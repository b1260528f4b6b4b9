mod cli;
#[cfg_attr(not(windows), allow(dead_code))]
mod domain;
#[cfg_attr(not(windows), allow(dead_code))]
mod infrastructure;

use crate::domain::error::SessionError;
use crate::domain::session::SessionConfig;
use crate::domain::settings::{Settings, SettingsService};
use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
#[cfg(not(windows))]
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let mut settings_service =
        SettingsService::load(cli.config.as_deref()).context("Failed to load settings")?;
    cli.apply(settings_service.get_mut());
    let settings = settings_service.get().clone();

    let _logging_guard = infrastructure::logging::init_logger(&settings.log_settings)
        .context("Failed to initialize logging")?;

    info!("Starting Nuimo mouse");
    if let Some(path) = settings_service.path() {
        info!("Loaded settings from {}", path.display());
    }

    // Configuration problems are fatal before any connection attempt
    let config = cli::session_config(&settings).map_err(SessionError::from)?;

    let stop = CancellationToken::new();
    let ctrl_c = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Stop requested");
            ctrl_c.cancel();
        }
    });

    run(&settings, config, stop).await
}

#[cfg(windows)]
async fn run(settings: &Settings, config: SessionConfig, stop: CancellationToken) -> anyhow::Result<()> {
    use crate::infrastructure::action_sink::{PointerActionSink, PointerTuning};
    use crate::domain::session::Session;
    use crate::infrastructure::bluetooth::connection::ConnectionConfig;
    use crate::infrastructure::bluetooth::{protocol, BluetoothService};
    use crate::infrastructure::input_simulator::InputSimulator;
    use std::sync::Arc;
    use std::time::Duration;

    let services = settings
        .services
        .iter()
        .map(|s| protocol::parse_uuid(s))
        .collect::<anyhow::Result<Vec<_>>>()
        .context("Invalid --services value")?;

    let transport = BluetoothService::new(
        Duration::from_secs(settings.scan_timeout_secs),
        ConnectionConfig { services },
    );
    let tuning = PointerTuning {
        swipe_distance: settings.swipe_distance,
        scroll_multiplier: settings.scroll_multiplier,
    };
    let sink = Arc::new(PointerActionSink::new(InputSimulator::new(), tuning));

    let report = Session::new(transport, sink, config).run(stop).await?;
    info!("Subscribed sources: {:?}", report.subscribed);
    Ok(())
}

#[cfg(not(windows))]
async fn run(_settings: &Settings, config: SessionConfig, _stop: CancellationToken) -> anyhow::Result<()> {
    error!(
        "No Bluetooth transport is available on this platform, cannot reach device with {}",
        config.target
    );
    anyhow::bail!("unsupported platform: the BLE transport requires Windows")
}
