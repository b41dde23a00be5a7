//! # Repository Layer
//!
//! Repository implementations that encapsulate SeaORM operations for the catalog
//! tables. Ingestion only talks to the [`UpsertRepository`] seam so the reconciler
//! never touches ORM state directly.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::error::RepositoryError;

pub mod base_event;
pub mod catalog;
pub mod event;
pub mod event_zone;
pub mod log_entry;
pub mod zone;

pub use base_event::{BaseEventAttributes, BaseEventRepository};
pub use catalog::{CatalogEntry, CatalogQueryRepository};
pub use event::{EventAttributes, EventRepository};
pub use event_zone::{EventZoneAttributes, EventZoneKey, EventZoneRepository};
pub use log_entry::LogEntryRepository;
pub use zone::{ZoneAttributes, ZoneRepository};

/// Outcome of an upsert: whether the row was inserted or overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upserted<M> {
    Created(M),
    Updated(M),
}

impl<M> Upserted<M> {
    pub fn is_created(&self) -> bool {
        matches!(self, Upserted::Created(_))
    }
}

/// Lookup and upsert keyed by a feed-provided external identifier.
///
/// `upsert` overwrites every non-key attribute of an existing row (full replace)
/// and guarantees at most one row per key.
#[async_trait]
pub trait UpsertRepository: Send + Sync {
    type Key: Copy + fmt::Display + Send + Sync + 'static;
    type Attributes: Send + Sync;
    type Model: Send;

    async fn find_by_external_id(
        &self,
        key: Self::Key,
    ) -> Result<Option<Self::Model>, RepositoryError>;

    async fn upsert(
        &self,
        key: Self::Key,
        attributes: Self::Attributes,
    ) -> Result<Upserted<Self::Model>, RepositoryError>;
}

/// The four repositories the reconciler writes through.
#[derive(Clone)]
pub struct CatalogRepositories<B, E, Z, EZ> {
    pub base_events: B,
    pub events: E,
    pub zones: Z,
    pub event_zones: EZ,
}

/// SeaORM-backed repository set.
pub type SeaOrmCatalogRepositories =
    CatalogRepositories<BaseEventRepository, EventRepository, ZoneRepository, EventZoneRepository>;

impl SeaOrmCatalogRepositories {
    pub fn from_connection(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base_events: BaseEventRepository::new(Arc::clone(&db)),
            events: EventRepository::new(Arc::clone(&db)),
            zones: ZoneRepository::new(Arc::clone(&db)),
            event_zones: EventZoneRepository::new(db),
        }
    }
}

/// Retry an upsert once when its insert lost a race against the unique index.
///
/// The first attempt's transaction is dropped (rolled back) before the retry
/// runs, so the second read sees the winning row and takes the update path.
pub(crate) async fn retry_on_unique_violation<T, F, Fut>(
    entity: &'static str,
    key: impl fmt::Display,
    mut attempt: F,
) -> Result<T, RepositoryError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, RepositoryError>>,
{
    match attempt().await {
        Err(RepositoryError::Database(err)) if crate::error::is_unique_violation(&err) => {
            tracing::debug!(
                entity,
                external_id = %key,
                "Insert lost race on unique key; retrying as update"
            );
            attempt().await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upserted_reports_creation() {
        assert!(Upserted::Created(7).is_created());
        assert!(!Upserted::Updated(8).is_created());
    }

    #[tokio::test]
    async fn retry_runs_once_for_non_unique_errors() {
        let mut calls = 0;
        let result: Result<(), RepositoryError> = retry_on_unique_violation("zone", 1, || {
            calls += 1;
            async { Err(RepositoryError::Validation("zone 1".into())) }
        })
        .await;

        assert!(matches!(result, Err(RepositoryError::Validation(_))));
        assert_eq!(calls, 1);
    }
}
