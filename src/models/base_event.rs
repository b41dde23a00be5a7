//! BaseEvent entity model
//!
//! This module contains the SeaORM entity model for the base_events table,
//! which stores productions independent of any specific date.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// A recurring show or production as published by the feed
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "base_events")]
pub struct Model {
    /// Surrogate identifier (primary key); never used for reconciliation
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// External identifier assigned by the feed (unique)
    #[sea_orm(unique)]
    pub base_event_id: i64,

    /// Display title
    pub title: String,

    /// Distribution channel, expected `online` or `offline`
    pub sell_mode: String,

    /// Timestamp when the row was first ingested
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp of the latest ingestion that touched the row
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::event::Entity")]
    Event,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
