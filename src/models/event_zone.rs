//! EventZone entity model
//!
//! This module contains the SeaORM entity model for the event_zones table,
//! the priced, capacity-bound offering of one zone for one event. Rows are
//! unique per (event_id, zone_id), both being external feed identifiers.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "event_zones")]
pub struct Model {
    /// Surrogate identifier (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// External identifier of the event
    pub event_id: i64,

    /// External identifier of the zone
    pub zone_id: i64,

    /// Price with two decimal places
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,

    /// Number of available seats (never negative)
    pub capacity: i64,

    /// Whether seats in this zone are numbered
    pub numbered: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::EventId",
        on_delete = "Cascade"
    )]
    Event,
    #[sea_orm(
        belongs_to = "super::zone::Entity",
        from = "Column::ZoneId",
        to = "super::zone::Column::ZoneId",
        on_delete = "Cascade"
    )]
    Zone,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::zone::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Zone.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
