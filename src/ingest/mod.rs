//! # Feed Ingestion
//!
//! Fetch, parse, normalize and reconcile the external XML feed, then report the
//! outcome. A run is strictly sequential and only aborts on [`FetchError`] or
//! [`ParseError`]; every other failure is isolated to the record subtree it
//! occurred in and shows up in the returned [`RunSummary`].

pub mod audit;
pub mod error;
pub mod feed;
pub mod normalize;
pub mod parser;
pub mod reconcile;
pub mod report;

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::{error, info, instrument};

pub use audit::{AuditSink, DatabaseAuditSink, LogLevel, LogRecord};
pub use error::{FetchError, FieldError, IngestError, ParseError, PersistenceError};
pub use feed::{FeedSource, HttpFeedClient, StaticFeed};
pub use parser::{BaseEventNode, EventNode, ZoneNode, parse_feed};
pub use reconcile::Reconciler;
pub use report::{EntityCounts, EntityKind, FailureRecord, RunReporter, RunSummary};

use crate::config::AppConfig;
use crate::repositories::{
    BaseEventAttributes, BaseEventRepository, EventAttributes, EventRepository,
    EventZoneAttributes, EventZoneKey, EventZoneRepository, SeaOrmCatalogRepositories,
    UpsertRepository, ZoneAttributes, ZoneRepository,
};
use crate::telemetry::{TraceContext, with_trace_context};

/// Runs one ingestion: fetch, parse, then reconcile every base-event subtree.
///
/// The reporter is consumed and its summary returned; fatal errors return
/// before anything is written.
#[instrument(skip_all, fields(run_id = %reporter.run_id(), source = %feed.describe()))]
pub async fn run_ingestion<B, E, Z, EZ>(
    feed: &dyn FeedSource,
    reconciler: &Reconciler<B, E, Z, EZ>,
    mut reporter: RunReporter,
) -> Result<RunSummary, IngestError>
where
    B: UpsertRepository<Key = i64, Attributes = BaseEventAttributes>,
    E: UpsertRepository<Key = i64, Attributes = EventAttributes>,
    Z: UpsertRepository<Key = i64, Attributes = ZoneAttributes>,
    EZ: UpsertRepository<Key = EventZoneKey, Attributes = EventZoneAttributes>,
{
    info!(run_id = %reporter.run_id(), source = %feed.describe(), "Starting ingestion run");
    let raw = feed.fetch().await?;
    let nodes = parse_feed(&raw)?;
    info!(base_events = nodes.len(), "Parsed feed document");

    reconciler.reconcile(&nodes, &mut reporter).await;

    let summary = reporter.finish();
    info!(
        created = summary.created,
        updated = summary.updated,
        failed = summary.failed,
        "Ingestion run finished"
    );
    Ok(summary)
}

type SeaOrmReconciler =
    Reconciler<BaseEventRepository, EventRepository, ZoneRepository, EventZoneRepository>;

/// A fully wired ingestion job against the SeaORM repositories.
#[derive(Clone)]
pub struct IngestJob {
    feed: Arc<dyn FeedSource>,
    reconciler: Arc<SeaOrmReconciler>,
    sink: Arc<dyn AuditSink>,
    application: String,
}

impl IngestJob {
    pub fn new(
        feed: Arc<dyn FeedSource>,
        db: Arc<DatabaseConnection>,
        sink: Arc<dyn AuditSink>,
        application: impl Into<String>,
    ) -> Self {
        Self {
            feed,
            reconciler: Arc::new(Reconciler::new(SeaOrmCatalogRepositories::from_connection(db))),
            sink,
            application: application.into(),
        }
    }

    /// HTTP feed plus database audit sink, as configured.
    pub fn from_config(
        config: &AppConfig,
        db: Arc<DatabaseConnection>,
    ) -> Result<Self, FetchError> {
        let feed = Arc::new(HttpFeedClient::from_config(&config.feed)?);
        let sink = Arc::new(DatabaseAuditSink::new(Arc::clone(&db)));
        Ok(Self::new(feed, db, sink, config.ingest.audit_application.clone()))
    }

    /// Runs once and flushes the outcome to the audit sink.
    pub async fn run(&self) -> Result<RunSummary, IngestError> {
        let reporter = RunReporter::new();
        let context = TraceContext {
            trace_id: reporter.run_id().simple().to_string(),
        };

        with_trace_context(context, async {
            match run_ingestion(self.feed.as_ref(), &self.reconciler, reporter).await {
                Ok(summary) => {
                    audit::flush_summary(self.sink.as_ref(), &self.application, &summary).await;
                    Ok(summary)
                }
                Err(err) => {
                    error!(error = %err, "Ingestion run aborted");
                    audit::flush_fatal(self.sink.as_ref(), &self.application, &err).await;
                    Err(err)
                }
            }
        })
        .await
    }
}
