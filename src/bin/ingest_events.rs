//! One-shot ingestion of the provider feed.
//!
//! Fetches the feed (or reads a local file), reconciles it into the catalog and
//! prints the run summary. Exits non-zero when the run aborts.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use event_catalog::{
    config::ConfigLoader,
    db,
    ingest::{DatabaseAuditSink, FeedSource, HttpFeedClient, IngestJob, StaticFeed},
    migration::{Migrator, MigratorTrait},
    telemetry,
};

#[derive(Debug, Parser)]
#[command(name = "ingest_events", about = "Ingest the provider event feed into the catalog")]
struct Args {
    /// Feed URL; overrides CATALOG_FEED_URL
    #[arg(long)]
    feed_url: Option<String>,

    /// Request timeout in seconds; overrides CATALOG_FEED_TIMEOUT_SECONDS
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Read the feed document from a local file instead of fetching it
    #[arg(long, conflicts_with = "feed_url")]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ConfigLoader::new().load().context("loading configuration")?;
    if let Some(url) = args.feed_url {
        config.feed.url = url;
    }
    if let Some(timeout) = args.timeout_secs {
        config.feed.timeout_seconds = timeout;
    }
    config.feed.validate().context("validating feed settings")?;

    telemetry::init_tracing(&config).context("initializing tracing")?;

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;
    Migrator::up(&db, None)
        .await
        .context("applying database migrations")?;
    let db = Arc::new(db);

    let feed: Arc<dyn FeedSource> = match args.file {
        Some(path) => {
            let body = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading feed file {}", path.display()))?;
            Arc::new(StaticFeed::new(body))
        }
        None => Arc::new(
            HttpFeedClient::new(
                &config.feed.url,
                Duration::from_secs(config.feed.timeout_seconds),
            )
            .context("building feed client")?,
        ),
    };

    let sink = Arc::new(DatabaseAuditSink::new(Arc::clone(&db)));
    let job = IngestJob::new(feed, db, sink, config.ingest.audit_application.clone());

    match job.run().await {
        Ok(summary) => {
            println!("{}", summary.headline());
            for failure in &summary.failures {
                println!("  failed {failure}");
            }
            Ok(())
        }
        Err(err) => bail!("ingestion aborted: {err}"),
    }
}
