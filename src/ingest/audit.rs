//! Audit sink for run outcomes.
//!
//! The sink is passed in explicitly; nothing in ingestion writes to a global
//! logger. Sink failures are reported through `tracing` and otherwise ignored.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::error;

use super::error::IngestError;
use super::report::RunSummary;
use crate::error::RepositoryError;
use crate::repositories::LogEntryRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub application: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    pub fn new(level: LogLevel, application: &str, text: impl Into<String>) -> Self {
        Self {
            level,
            application: application.to_string(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, record: LogRecord) -> Result<(), RepositoryError>;
}

/// Writes audit records into the `log_entries` table.
#[derive(Debug, Clone)]
pub struct DatabaseAuditSink {
    repository: LogEntryRepository,
}

impl DatabaseAuditSink {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            repository: LogEntryRepository::new(db),
        }
    }
}

#[async_trait]
impl AuditSink for DatabaseAuditSink {
    async fn append(&self, record: LogRecord) -> Result<(), RepositoryError> {
        self.repository
            .append(
                record.level.as_str(),
                &record.application,
                &record.text,
                record.timestamp,
            )
            .await?;
        Ok(())
    }
}

/// Writes one ERROR entry per failure and one INFO entry for the run summary.
pub async fn flush_summary(sink: &dyn AuditSink, application: &str, summary: &RunSummary) {
    for failure in &summary.failures {
        let record = LogRecord::new(
            LogLevel::Error,
            application,
            format!("ingestion run {}: {}", summary.run_id, failure),
        );
        append_or_log(sink, record).await;
    }

    append_or_log(
        sink,
        LogRecord::new(LogLevel::Info, application, summary.headline()),
    )
    .await;
}

/// Records a run that ended before reconciliation started.
pub async fn flush_fatal(sink: &dyn AuditSink, application: &str, err: &IngestError) {
    append_or_log(
        sink,
        LogRecord::new(
            LogLevel::Error,
            application,
            format!("ingestion run aborted: {err}"),
        ),
    )
    .await;
}

async fn append_or_log(sink: &dyn AuditSink, record: LogRecord) {
    let level = record.level;
    if let Err(err) = sink.append(record).await {
        error!(error = %err, level = %level, "Failed to write audit record");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::ingest::error::ParseError;
    use crate::ingest::report::{EntityKind, RunReporter};

    #[derive(Default)]
    struct VecSink {
        records: Mutex<Vec<LogRecord>>,
    }

    #[async_trait]
    impl AuditSink for VecSink {
        async fn append(&self, record: LogRecord) -> Result<(), RepositoryError> {
            self.records.lock().unwrap().push(record);
            Ok(())
        }
    }

    struct BrokenSink;

    #[async_trait]
    impl AuditSink for BrokenSink {
        async fn append(&self, _record: LogRecord) -> Result<(), RepositoryError> {
            Err(RepositoryError::Validation("sink offline".to_string()))
        }
    }

    #[tokio::test]
    async fn summary_produces_error_per_failure_then_info() {
        let mut reporter = RunReporter::new();
        reporter.record_created(EntityKind::BaseEvent);
        reporter.record_failure(EntityKind::Zone, Some("101".to_string()), "bad price");
        reporter.record_failure(EntityKind::Event, None, "missing id");
        let summary = reporter.finish();

        let sink = VecSink::default();
        flush_summary(&sink, "get_events", &summary).await;

        let records = sink.records.lock().unwrap();
        let levels: Vec<_> = records.iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![LogLevel::Error, LogLevel::Error, LogLevel::Info]);
        assert!(records[0].text.contains("zone 101: bad price"));
        assert!(records[1].text.contains("event <unknown>"));
        assert!(records[2].text.contains("failed=2"));
        assert!(records.iter().all(|r| r.application == "get_events"));
    }

    #[tokio::test]
    async fn sink_failures_do_not_propagate() {
        let summary = RunReporter::new().finish();
        flush_summary(&BrokenSink, "get_events", &summary).await;
        flush_fatal(
            &BrokenSink,
            "get_events",
            &IngestError::Parse(ParseError::EmptyDocument),
        )
        .await;
    }

    #[tokio::test]
    async fn fatal_errors_are_recorded() {
        let sink = VecSink::default();
        flush_fatal(&sink, "get_events", &IngestError::Parse(ParseError::EmptyDocument)).await;

        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, LogLevel::Error);
        assert_eq!(records[0].text, "ingestion run aborted: feed document is empty");
    }
}
