//! Migration to create the config_sync table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConfigSync::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ConfigSync::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ConfigSync::GestorId).uuid().not_null())
                    .col(
                        ColumnDef::new(ConfigSync::SyncAutomatico)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ConfigSync::IntervaloHoras)
                            .integer()
                            .not_null()
                            .default(6),
                    )
                    .col(
                        ColumnDef::new(ConfigSync::ProximaExecucao)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ConfigSync::UltimaExecucao)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ConfigSync::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ConfigSync::UpdatedAt)
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
                    .name("idx_config_sync_gestor_id")
                    .table(ConfigSync::Table)
                    .col(ConfigSync::GestorId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_config_sync_gestor_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ConfigSync::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ConfigSync {
    Table,
    Id,
    GestorId,
    SyncAutomatico,
    IntervaloHoras,
    ProximaExecucao,
    UltimaExecucao,
    CreatedAt,
    UpdatedAt,
}
