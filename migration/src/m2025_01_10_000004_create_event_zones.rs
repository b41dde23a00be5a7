//! Migration to create the event_zones join table.
//!
//! One row holds the price and availability of a zone for a single event. The
//! composite unique index on (event_id, zone_id) is what keeps re-ingestion of
//! the same pair an in-place update.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EventZones::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventZones::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EventZones::EventId).big_integer().not_null())
                    .col(ColumnDef::new(EventZones::ZoneId).big_integer().not_null())
                    .col(
                        ColumnDef::new(EventZones::Price)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(EventZones::Capacity).big_integer().not_null())
                    .col(
                        ColumnDef::new(EventZones::Numbered)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EventZones::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(EventZones::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_zones_event_id")
                            .from(EventZones::Table, EventZones::EventId)
                            .to(Events::Table, Events::EventId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_zones_zone_id")
                            .from(EventZones::Table, EventZones::ZoneId)
                            .to(Zones::Table, Zones::ZoneId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_zones_event_zone")
                    .table(EventZones::Table)
                    .col(EventZones::EventId)
                    .col(EventZones::ZoneId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_zones_zone_id")
                    .table(EventZones::Table)
                    .col(EventZones::ZoneId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_event_zones_zone_id").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_event_zones_event_zone").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(EventZones::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EventZones {
    Table,
    Id,
    EventId,
    ZoneId,
    Price,
    Capacity,
    Numbered,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Events {
    Table,
    EventId,
}

#[derive(DeriveIden)]
enum Zones {
    Table,
    ZoneId,
}
