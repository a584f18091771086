//! Rollcall server entry point.
//!
//! Connects to SurrealDB, applies migrations, and runs the periodic
//! expiry sweep until interrupted. Request handling lives in the web
//! layer that embeds `rollcall-attendance`.

mod config;
mod error;

use std::process::ExitCode;
use std::time::Duration;

use rollcall_attendance::SessionRegistry;
use rollcall_core::clock::SystemClock;
use rollcall_db::repository::SurrealSessionRepository;
use rollcall_db::{DbError, DbManager, run_migrations};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::error::ServerError;

const DEFAULT_LOG_FILTER: &str = "rollcall_server=info,rollcall_attendance=info,rollcall_db=info";

#[tokio::main]
async fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();

    info!("Starting Rollcall server...");

    match run().await {
        Ok(()) => {
            info!("Rollcall server stopped.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Rollcall server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load()?;

    let manager = DbManager::connect(&config.db)
        .await
        .map_err(DbError::from)?;
    run_migrations(manager.client()).await?;

    let registry = SessionRegistry::new(
        SurrealSessionRepository::new(manager.client().clone()),
        SystemClock,
        config.attendance.clone(),
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(config.sweep_interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        sweep_interval_secs = config.sweep_interval_secs,
        "Expiry sweep running"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = registry.sweep_expired().await {
                    warn!(error = %e, "Expiry sweep failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}
