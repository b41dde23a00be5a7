//! # Event Catalog Main Entry Point
//!
//! Serves the public catalog API and, when an ingest interval is configured,
//! refreshes the catalog from the provider feed in the background.

use std::sync::Arc;

use anyhow::Context;
use event_catalog::{
    config::ConfigLoader,
    db,
    ingest::IngestJob,
    migration::{Migrator, MigratorTrait},
    scheduler::IngestScheduler,
    server::run_server,
    telemetry,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load().context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing tracing")?;

    if let Ok(redacted_json) = config.redacted_json() {
        tracing::info!(profile = %config.profile, config = %redacted_json, "Loaded configuration");
    }

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;
    Migrator::up(&db, None)
        .await
        .context("applying database migrations")?;

    let config = Arc::new(config);
    let db = Arc::new(db);
    let shutdown = CancellationToken::new();

    let scheduler = match config.ingest.interval() {
        Some(interval) => {
            let job = IngestJob::from_config(&config, Arc::clone(&db))
                .context("building ingestion job")?;
            let token = shutdown.clone();
            Some(tokio::spawn(
                IngestScheduler::new(job, interval).run(token),
            ))
        }
        None => {
            tracing::info!("Ingestion interval not configured; scheduler disabled");
            None
        }
    };

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
        signal_token.cancel();
    });

    let served = run_server(config, db, shutdown.clone()).await;
    shutdown.cancel();

    if let Some(handle) = scheduler
        && let Err(err) = handle.await
    {
        tracing::error!(error = %err, "Scheduler task panicked");
    }

    served
}
