// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trail-Sync command line client
//!
//! Pairs this device with the cloud service and runs one full sync.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trail_sync::{build_synchronizer, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        base_url = %config.base_url,
        database = %config.database_path.display(),
        "Starting Trail-Sync"
    );

    let mut synchronizer = build_synchronizer(&config)?;

    let token = synchronizer.pre_auth().await.inspect_err(|e| {
        tracing::error!(error = %e, "Pre-authorization failed");
    })?;
    println!("Pairing token: {}", token);
    println!("Confirm it on the cloud service, then press Enter.");

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;

    synchronizer.auth().await.inspect_err(|e| {
        tracing::error!(error = %e, "Authorization failed");
    })?;

    synchronizer.sync().await.inspect_err(|e| {
        tracing::error!(error = %e, auth = e.is_auth_error(), "Sync failed");
    })?;

    println!("Sync complete.");
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trail_sync=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
