//! BaseEvent repository
//!
//! Upserts base events keyed by the feed's `base_event_id`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::{UpsertRepository, Upserted, retry_on_unique_violation};
use crate::error::RepositoryError;
use crate::models::base_event::{self, Entity as BaseEvent};

/// Mutable attributes of a base event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseEventAttributes {
    pub title: String,
    pub sell_mode: String,
}

/// Repository for base event database operations
#[derive(Debug, Clone)]
pub struct BaseEventRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl BaseEventRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn upsert_once(
        &self,
        base_event_id: i64,
        attributes: &BaseEventAttributes,
    ) -> Result<Upserted<base_event::Model>, RepositoryError> {
        let txn = self.db.begin().await?;
        let now = Utc::now().fixed_offset();

        let existing = BaseEvent::find()
            .filter(base_event::Column::BaseEventId.eq(base_event_id))
            .one(&txn)
            .await?;

        let outcome = match existing {
            Some(model) => {
                let mut am: base_event::ActiveModel = model.into();
                am.title = Set(attributes.title.clone());
                am.sell_mode = Set(attributes.sell_mode.clone());
                am.updated_at = Set(now);
                Upserted::Updated(am.update(&txn).await?)
            }
            None => {
                let am = base_event::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    base_event_id: Set(base_event_id),
                    title: Set(attributes.title.clone()),
                    sell_mode: Set(attributes.sell_mode.clone()),
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
impl UpsertRepository for BaseEventRepository {
    type Key = i64;
    type Attributes = BaseEventAttributes;
    type Model = base_event::Model;

    async fn find_by_external_id(
        &self,
        base_event_id: i64,
    ) -> Result<Option<base_event::Model>, RepositoryError> {
        let found = BaseEvent::find()
            .filter(base_event::Column::BaseEventId.eq(base_event_id))
            .one(&*self.db)
            .await?;
        Ok(found)
    }

    async fn upsert(
        &self,
        base_event_id: i64,
        attributes: BaseEventAttributes,
    ) -> Result<Upserted<base_event::Model>, RepositoryError> {
        retry_on_unique_violation("base_event", base_event_id, || {
            self.upsert_once(base_event_id, &attributes)
        })
        .await
    }
}
