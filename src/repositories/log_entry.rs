//! LogEntry repository
//!
//! Append-only access to the `log_entries` audit table.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::log_entry::{self, Entity as LogEntry};

#[derive(Debug, Clone)]
pub struct LogEntryRepository {
    pub db: Arc<DatabaseConnection>,
}

impl LogEntryRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Appends one entry.
    pub async fn append(
        &self,
        level: &str,
        application: &str,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> Result<log_entry::Model, RepositoryError> {
        let am = log_entry::ActiveModel {
            id: Set(Uuid::new_v4()),
            level: Set(level.to_string()),
            application: Set(application.to_string()),
            text: Set(text.to_string()),
            created_at: Set(created_at.fixed_offset()),
        };
        Ok(am.insert(&*self.db).await?)
    }

    /// Entries for one application tag, oldest first.
    pub async fn list_by_application(
        &self,
        application: &str,
    ) -> Result<Vec<log_entry::Model>, RepositoryError> {
        let entries = LogEntry::find()
            .filter(log_entry::Column::Application.eq(application))
            .order_by_asc(log_entry::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(entries)
    }
}
