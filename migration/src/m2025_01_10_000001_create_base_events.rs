//! Migration to create the base_events table.
//!
//! A base event is a production independent of any date. It is keyed by the
//! feed's `base_event_id`, which carries a unique constraint so that repeated
//! ingestion runs can never create a second row for the same production.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BaseEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BaseEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BaseEvents::BaseEventId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(BaseEvents::Title).text().not_null())
                    .col(ColumnDef::new(BaseEvents::SellMode).string_len(40).not_null())
                    .col(
                        ColumnDef::new(BaseEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(BaseEvents::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // The public query always filters on sell mode
        manager
            .create_index(
                Index::create()
                    .name("idx_base_events_sell_mode")
                    .table(BaseEvents::Table)
                    .col(BaseEvents::SellMode)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_base_events_sell_mode").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(BaseEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BaseEvents {
    Table,
    Id,
    BaseEventId,
    Title,
    SellMode,
    CreatedAt,
    UpdatedAt,
}
