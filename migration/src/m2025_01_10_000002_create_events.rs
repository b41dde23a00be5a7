//! Migration to create the events table.
//!
//! Each event is one dated occurrence of a base event. The owning base event is
//! referenced through its external `base_event_id`, not the surrogate key.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Events::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Events::EventId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Events::BaseEventId).big_integer().not_null())
                    .col(ColumnDef::new(Events::EventDate).date_time().not_null())
                    .col(ColumnDef::new(Events::SellFrom).date_time().not_null())
                    .col(ColumnDef::new(Events::SellTo).date_time().not_null())
                    .col(
                        ColumnDef::new(Events::SoldOut)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Events::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Events::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_events_base_event_id")
                            .from(Events::Table, Events::BaseEventId)
                            .to(BaseEvents::Table, BaseEvents::BaseEventId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_events_base_event_id")
                    .table(Events::Table)
                    .col(Events::BaseEventId)
                    .to_owned(),
            )
            .await?;

        // Supports the sell window filter of GET /events
        manager
            .create_index(
                Index::create()
                    .name("idx_events_sell_window")
                    .table(Events::Table)
                    .col(Events::SellFrom)
                    .col(Events::SellTo)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_events_sell_window").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_events_base_event_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
    EventId,
    BaseEventId,
    EventDate,
    SellFrom,
    SellTo,
    SoldOut,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BaseEvents {
    Table,
    BaseEventId,
}
