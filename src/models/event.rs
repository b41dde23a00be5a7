//! Event entity model
//!
//! One dated occurrence of a base event. The parent is referenced through the
//! external `base_event_id`.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Event entity representing a single dated occurrence
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    /// Surrogate identifier (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// External identifier assigned by the feed (unique)
    #[sea_orm(unique)]
    pub event_id: i64,

    /// External identifier of the owning base event
    pub base_event_id: i64,

    /// When the occurrence takes place
    pub event_date: DateTime,

    /// Start of the sales window
    pub sell_from: DateTime,

    /// End of the sales window
    pub sell_to: DateTime,

    pub sold_out: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::base_event::Entity",
        from = "Column::BaseEventId",
        to = "super::base_event::Column::BaseEventId",
        on_delete = "Cascade"
    )]
    BaseEvent,
    #[sea_orm(has_many = "super::event_zone::Entity")]
    EventZone,
}

impl Related<super::base_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BaseEvent.def()
    }
}

impl Related<super::event_zone::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventZone.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
