use gs_server::{Daemon, DaemonError, logger};

use std::error::Error;

use gs_lifecycle::ShutdownCoordinator;
use log::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load and validate configuration
    let config = gs_config::Config::load()?;
    config.validate()?;

    // Initialize logger (before any other logging)
    logger::initialize(
        config.logging.level,
        config.log_file_path()?,
        config.logging.colored,
    )?;

    info!("Starting gs-server v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let daemon = Daemon::new(config)?;

    // Spawn signal handler for graceful shutdown
    let shutdown_for_signal = daemon.shutdown_coordinator();
    tokio::spawn(async move {
        if let Err(e) = wait_for_signal(&shutdown_for_signal).await {
            error!("{e}");
            shutdown_for_signal.shutdown();
        }
    });

    let status = daemon.run().await?;
    info!("gs-server stopped (server {})", status.state);

    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal(shutdown: &ShutdownCoordinator) -> Result<(), DaemonError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate()).map_err(DaemonError::signal)?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.map_err(DaemonError::signal)?;
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        }
        _ = terminate.recv() => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }

    shutdown.shutdown();
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal(shutdown: &ShutdownCoordinator) -> Result<(), DaemonError> {
    tokio::signal::ctrl_c().await.map_err(DaemonError::signal)?;
    info!("Received Ctrl+C, initiating graceful shutdown");
    shutdown.shutdown();
    Ok(())
}
