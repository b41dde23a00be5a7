//! Zone repository
//!
//! Zones are feed-global: the same `zone_id` seen under many events is one row
//! whose name follows the latest sighting.

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
use crate::models::zone::{self, Entity as Zone};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneAttributes {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ZoneRepository {
    pub db: Arc<DatabaseConnection>,
}

impl ZoneRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn upsert_once(
        &self,
        zone_id: i64,
        attributes: &ZoneAttributes,
    ) -> Result<Upserted<zone::Model>, RepositoryError> {
        let txn = self.db.begin().await?;
        let now = Utc::now().fixed_offset();

        let existing = Zone::find()
            .filter(zone::Column::ZoneId.eq(zone_id))
            .one(&txn)
            .await?;

        let outcome = match existing {
            Some(model) => {
                let mut am: zone::ActiveModel = model.into();
                am.name = Set(attributes.name.clone());
                am.updated_at = Set(now);
                Upserted::Updated(am.update(&txn).await?)
            }
            None => {
                let am = zone::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    zone_id: Set(zone_id),
                    name: Set(attributes.name.clone()),
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
impl UpsertRepository for ZoneRepository {
    type Key = i64;
    type Attributes = ZoneAttributes;
    type Model = zone::Model;

    async fn find_by_external_id(
        &self,
        zone_id: i64,
    ) -> Result<Option<zone::Model>, RepositoryError> {
        let found = Zone::find()
            .filter(zone::Column::ZoneId.eq(zone_id))
            .one(&*self.db)
            .await?;
        Ok(found)
    }

    async fn upsert(
        &self,
        zone_id: i64,
        attributes: ZoneAttributes,
    ) -> Result<Upserted<zone::Model>, RepositoryError> {
        retry_on_unique_violation("zone", zone_id, || {
            self.upsert_once(zone_id, &attributes)
        })
        .await
    }
}
