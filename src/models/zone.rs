//! Zone entity model
//!
//! Zones are feed-global: the same `zone_id` seen under different events is a
//! single row.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "zones")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// External identifier assigned by the feed (unique)
    #[sea_orm(unique)]
    pub zone_id: i64,

    pub name: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::event_zone::Entity")]
    EventZone,
}

impl Related<super::event_zone::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventZone.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
