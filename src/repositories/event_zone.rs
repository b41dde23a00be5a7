//! EventZone repository
//!
//! The join row is identified by the `(event_id, zone_id)` pair of external ids.
//! Re-ingesting the same pair overwrites price, capacity and numbering in place.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use uuid::Uuid;

use super::{UpsertRepository, Upserted, retry_on_unique_violation};
use crate::error::RepositoryError;
use crate::models::event_zone::{self, Entity as EventZone};

/// Composite external key of an event zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventZoneKey {
    pub event_id: i64,
    pub zone_id: i64,
}

impl fmt::Display for EventZoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.event_id, self.zone_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventZoneAttributes {
    pub price: Decimal,
    pub capacity: i64,
    pub numbered: bool,
}

#[derive(Debug, Clone)]
pub struct EventZoneRepository {
    pub db: Arc<DatabaseConnection>,
}

impl EventZoneRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_with<C>(
        conn: &C,
        key: EventZoneKey,
    ) -> Result<Option<event_zone::Model>, RepositoryError>
    where
        C: ConnectionTrait,
    {
        let found = EventZone::find()
            .filter(event_zone::Column::EventId.eq(key.event_id))
            .filter(event_zone::Column::ZoneId.eq(key.zone_id))
            .one(conn)
            .await?;
        Ok(found)
    }

    async fn upsert_once(
        &self,
        key: EventZoneKey,
        attributes: &EventZoneAttributes,
    ) -> Result<Upserted<event_zone::Model>, RepositoryError> {
        if attributes.capacity < 0 {
            return Err(RepositoryError::Validation(format!(
                "capacity must not be negative, got {}",
                attributes.capacity
            )));
        }

        let txn = self.db.begin().await?;
        let now = Utc::now().fixed_offset();

        let outcome = match Self::find_with(&txn, key).await? {
            Some(model) => {
                let mut am: event_zone::ActiveModel = model.into();
                am.price = Set(attributes.price);
                am.capacity = Set(attributes.capacity);
                am.numbered = Set(attributes.numbered);
                am.updated_at = Set(now);
                Upserted::Updated(am.update(&txn).await?)
            }
            None => {
                let am = event_zone::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    event_id: Set(key.event_id),
                    zone_id: Set(key.zone_id),
                    price: Set(attributes.price),
                    capacity: Set(attributes.capacity),
                    numbered: Set(attributes.numbered),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                Upserted::Created(am.insert(&txn).await?)
            }
        };

        txn.commit().await?;
        Ok(outcome)
    }
}

#[async_trait]
impl UpsertRepository for EventZoneRepository {
    type Key = EventZoneKey;
    type Attributes = EventZoneAttributes;
    type Model = event_zone::Model;

    async fn find_by_external_id(
        &self,
        key: EventZoneKey,
    ) -> Result<Option<event_zone::Model>, RepositoryError> {
        Self::find_with(&*self.db, key).await
    }

    async fn upsert(
        &self,
        key: EventZoneKey,
        attributes: EventZoneAttributes,
    ) -> Result<Upserted<event_zone::Model>, RepositoryError> {
        retry_on_unique_violation("event_zone", key, || self.upsert_once(key, &attributes)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_displays_as_pair() {
        let key = EventZoneKey {
            event_id: 291,
            zone_id: 40,
        };
        assert_eq!(key.to_string(), "291/40");
    }
}
