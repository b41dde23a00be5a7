//! Event repository
//!
//! Upserts dated occurrences keyed by the feed's `event_id`. The owning base
//! event is referenced by its external id and must already exist.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::{UpsertRepository, Upserted, retry_on_unique_violation};
use crate::error::RepositoryError;
use crate::models::event::{self, Entity as Event};

/// Mutable attributes of an event, including its parent link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventAttributes {
    pub base_event_id: i64,
    pub event_date: NaiveDateTime,
    pub sell_from: NaiveDateTime,
    pub sell_to: NaiveDateTime,
    pub sold_out: bool,
}

#[derive(Debug, Clone)]
pub struct EventRepository {
    pub db: Arc<DatabaseConnection>,
}

impl EventRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn upsert_once(
        &self,
        event_id: i64,
        attributes: &EventAttributes,
    ) -> Result<Upserted<event::Model>, RepositoryError> {
        let txn = self.db.begin().await?;
        let now = Utc::now().fixed_offset();

        let existing = Event::find()
            .filter(event::Column::EventId.eq(event_id))
            .one(&txn)
            .await?;

        let outcome = match existing {
            Some(model) => {
                let mut am: event::ActiveModel = model.into();
                am.base_event_id = Set(attributes.base_event_id);
                am.event_date = Set(attributes.event_date);
                am.sell_from = Set(attributes.sell_from);
                am.sell_to = Set(attributes.sell_to);
                am.sold_out = Set(attributes.sold_out);
                am.updated_at = Set(now);
                Upserted::Updated(am.update(&txn).await?)
            }
            None => {
                let am = event::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    event_id: Set(event_id),
                    base_event_id: Set(attributes.base_event_id),
                    event_date: Set(attributes.event_date),
                    sell_from: Set(attributes.sell_from),
                    sell_to: Set(attributes.sell_to),
                    sold_out: Set(attributes.sold_out),
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
impl UpsertRepository for EventRepository {
    type Key = i64;
    type Attributes = EventAttributes;
    type Model = event::Model;

    async fn find_by_external_id(
        &self,
        event_id: i64,
    ) -> Result<Option<event::Model>, RepositoryError> {
        let found = Event::find()
            .filter(event::Column::EventId.eq(event_id))
            .one(&*self.db)
            .await?;
        Ok(found)
    }

    async fn upsert(
        &self,
        event_id: i64,
        attributes: EventAttributes,
    ) -> Result<Upserted<event::Model>, RepositoryError> {
        retry_on_unique_violation("event", event_id, || {
            self.upsert_once(event_id, &attributes)
        })
        .await
    }
}
