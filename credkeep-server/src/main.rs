mod config;
mod error;
mod routes;
mod state;

use crate::config::AppConfig;
use crate::state::AppState;
use clap::Parser;
use credkeep_core::daemon::ShutdownCoordinator;
use credkeep_core::utils::logger;
use credkeep_core::{BackupService, Scheduler};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "credkeep", version, about = "Keeps a restorable history of a credential file")]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "credkeep.toml")]
    config: PathBuf,

    /// HTTP port (overrides PORT and the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log filter, e.g. `info` or `credkeep_core=debug`
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(&args.config, args.port, args.log_level)?;

    logger::init(&config.log_level)?;
    if config.defaulted {
        tracing::info!("No config at {}, using defaults", args.config.display());
    } else {
        tracing::info!("Loaded config from {}", args.config.display());
    }

    let service = Arc::new(BackupService::open(config.vault.clone())?);

    let shutdown = Arc::new(ShutdownCoordinator::new());
    let token = shutdown.token();
    let scheduler = Scheduler::start(service.clone(), config.vault.scan_interval, &token);

    let app = routes::create_router(Arc::new(AppState::new(service)));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    let signals = shutdown.clone();
    tokio::spawn(async move { signals.wait_for_signal().await });

    axum::serve(listener, app)
        .with_graceful_shutdown(token.clone().cancelled_owned())
        .await?;

    tracing::info!("Shutting down...");
    token.cancel();
    scheduler.stop().await;
    tracing::info!("Server stopped");

    Ok(())
}
