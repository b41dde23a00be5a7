//! Migration to create the log_entries audit table (append-only).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LogEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LogEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LogEntries::Level).string_len(16).not_null())
                    .col(
                        ColumnDef::new(LogEntries::Application)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(LogEntries::Text).text().not_null())
                    .col(
                        ColumnDef::new(LogEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_log_entries_application")
                    .table(LogEntries::Table)
                    .col(LogEntries::Application)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_log_entries_created_at")
                    .table(LogEntries::Table)
                    .col(LogEntries::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_log_entries_created_at").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_log_entries_application").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(LogEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LogEntries {
    Table,
    Id,
    Level,
    Application,
    Text,
    CreatedAt,
}
