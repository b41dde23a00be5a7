//! Run bookkeeping.
//!
//! [`RunReporter`] only accumulates; it never fails and never writes anywhere
//! except the `metrics` recorder and `tracing`. The caller decides where the
//! final [`RunSummary`] goes.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::error::{FieldError, PersistenceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    BaseEvent,
    Event,
    Zone,
    EventZone,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::BaseEvent => "base_event",
            EntityKind::Event => "event",
            EntityKind::Zone => "zone",
            EntityKind::EventZone => "event_zone",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub created: u64,
    pub updated: u64,
    pub failed: u64,
}

/// One record (and its subtree) that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub entity: EntityKind,
    /// Raw external id as it appeared in the feed, if it could be read at all.
    pub external_id: Option<String>,
    pub cause: String,
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.entity,
            self.external_id.as_deref().unwrap_or("<unknown>"),
            self.cause
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub created: u64,
    pub updated: u64,
    pub failed: u64,
    pub per_entity: BTreeMap<EntityKind, EntityCounts>,
    pub failures: Vec<FailureRecord>,
}

impl RunSummary {
    pub fn counts_for(&self, entity: EntityKind) -> EntityCounts {
        self.per_entity.get(&entity).copied().unwrap_or_default()
    }

    /// One-line description used for the audit trail.
    pub fn headline(&self) -> String {
        let per_entity = self
            .per_entity
            .iter()
            .map(|(entity, c)| {
                format!(
                    "{entity}: {}/{}/{}",
                    c.created, c.updated, c.failed
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "ingestion run {} finished in {}ms: created={} updated={} failed={} (created/updated/failed per entity: {})",
            self.run_id,
            (self.finished_at - self.started_at).num_milliseconds(),
            self.created,
            self.updated,
            self.failed,
            if per_entity.is_empty() { "none".to_string() } else { per_entity }
        )
    }
}

#[derive(Debug)]
pub struct RunReporter {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    per_entity: BTreeMap<EntityKind, EntityCounts>,
    failures: Vec<FailureRecord>,
}

impl Default for RunReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReporter {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            per_entity: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn record_created(&mut self, entity: EntityKind) {
        self.per_entity.entry(entity).or_default().created += 1;
        counter!("ingest_records_total", "entity" => entity.as_str(), "outcome" => "created")
            .increment(1);
    }

    pub fn record_updated(&mut self, entity: EntityKind) {
        self.per_entity.entry(entity).or_default().updated += 1;
        counter!("ingest_records_total", "entity" => entity.as_str(), "outcome" => "updated")
            .increment(1);
    }

    pub fn record_failure(
        &mut self,
        entity: EntityKind,
        external_id: Option<String>,
        cause: impl Into<String>,
    ) {
        let failure = FailureRecord {
            entity,
            external_id,
            cause: cause.into(),
        };
        warn!(
            run_id = %self.run_id,
            entity = %failure.entity,
            external_id = failure.external_id.as_deref().unwrap_or("<unknown>"),
            cause = %failure.cause,
            "Skipping record subtree"
        );

        self.per_entity.entry(entity).or_default().failed += 1;
        counter!("ingest_records_total", "entity" => entity.as_str(), "outcome" => "failed")
            .increment(1);
        self.failures.push(failure);
    }

    pub fn record_field_error(
        &mut self,
        entity: EntityKind,
        external_id: Option<&str>,
        error: &FieldError,
    ) {
        self.record_failure(entity, external_id.map(str::to_string), error.to_string());
    }

    pub fn record_persistence_error(&mut self, error: &PersistenceError) {
        self.record_failure(
            error.entity,
            Some(error.external_id.clone()),
            error.source.to_string(),
        );
    }

    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    pub fn finish(self) -> RunSummary {
        let (created, updated, failed) = self
            .per_entity
            .values()
            .fold((0, 0, 0), |(c, u, f), counts| {
                (c + counts.created, u + counts.updated, f + counts.failed)
            });

        RunSummary {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            created,
            updated,
            failed,
            per_entity: self.per_entity,
            failures: self.failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepositoryError;

    #[test]
    fn totals_add_up_across_entities() {
        let mut reporter = RunReporter::new();
        reporter.record_created(EntityKind::BaseEvent);
        reporter.record_created(EntityKind::Zone);
        reporter.record_updated(EntityKind::Zone);
        reporter.record_field_error(
            EntityKind::EventZone,
            Some("40"),
            &FieldError::invalid("price", "abc", "not a decimal number"),
        );

        let summary = reporter.finish();
        assert_eq!(summary.created, 2);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(
            summary.counts_for(EntityKind::Zone),
            EntityCounts {
                created: 1,
                updated: 1,
                failed: 0
            }
        );
        assert_eq!(summary.counts_for(EntityKind::Event), EntityCounts::default());
        assert!(summary.finished_at >= summary.started_at);
    }

    #[test]
    fn failures_keep_entity_id_and_cause() {
        let mut reporter = RunReporter::new();
        reporter.record_persistence_error(&PersistenceError {
            entity: EntityKind::Event,
            external_id: "1642".to_string(),
            source: RepositoryError::Validation("constraint".to_string()),
        });
        reporter.record_field_error(EntityKind::BaseEvent, None, &FieldError::missing("base_event_id"));

        let failures = reporter.failures().to_vec();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].entity, EntityKind::Event);
        assert_eq!(failures[0].external_id.as_deref(), Some("1642"));
        assert!(failures[0].cause.contains("constraint"));
        assert_eq!(failures[1].to_string(), "base_event <unknown>: field `base_event_id` is missing: attribute not present");
    }

    #[test]
    fn headline_mentions_counts() {
        let mut reporter = RunReporter::new();
        reporter.record_created(EntityKind::BaseEvent);
        let summary = reporter.finish();

        let headline = summary.headline();
        assert!(headline.contains("created=1 updated=0 failed=0"));
        assert!(headline.contains("base_event: 1/0/0"));
    }
}
