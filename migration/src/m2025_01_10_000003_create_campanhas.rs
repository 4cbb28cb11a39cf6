//! Migration to create the campanhas table.
//!
//! One row per external campaign id per ad account. The composite unique
//! index is the conflict target for campaign upserts.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Campanhas::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Campanhas::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Campanhas::ContaId).uuid().not_null())
                    .col(ColumnDef::new(Campanhas::IdExterno).text().not_null())
                    .col(ColumnDef::new(Campanhas::Nome).text().not_null())
                    .col(ColumnDef::new(Campanhas::Status).text().not_null())
                    .col(ColumnDef::new(Campanhas::Objetivo).text().null())
                    .col(
                        ColumnDef::new(Campanhas::GastoTotal)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Campanhas::Alcance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campanhas::Impressoes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campanhas::Cliques)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campanhas::Ctr)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Campanhas::UltimaAtualizacao)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campanhas_conta_id")
                            .from(Campanhas::Table, Campanhas::ContaId)
                            .to(ContasAnuncio::Table, ContasAnuncio::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_campanhas_externo_conta")
                    .table(Campanhas::Table)
                    .col(Campanhas::IdExterno)
                    .col(Campanhas::ContaId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_campanhas_externo_conta").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Campanhas::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Campanhas {
    Table,
    Id,
    ContaId,
    IdExterno,
    Nome,
    Status,
    Objetivo,
    GastoTotal,
    Alcance,
    Impressoes,
    Cliques,
    Ctr,
    UltimaAtualizacao,
}

#[derive(DeriveIden)]
enum ContasAnuncio {
    Table,
    Id,
}
