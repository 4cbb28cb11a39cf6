//! Migration to create the contas_anuncio table.
//!
//! Stores the Meta ad accounts a manager has connected, together with the
//! encrypted access token used to read campaigns and insights.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContasAnuncio::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContasAnuncio::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ContasAnuncio::GestorId).uuid().not_null())
                    .col(ColumnDef::new(ContasAnuncio::ClienteId).uuid().null())
                    .col(
                        ColumnDef::new(ContasAnuncio::IdContaExterna)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ContasAnuncio::Nome).text().null())
                    .col(
                        ColumnDef::new(ContasAnuncio::TokenAcessoCifrado)
                            .binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ContasAnuncio::TokenExpiraEm)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ContasAnuncio::Ativo)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ContasAnuncio::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ContasAnuncio::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contas_anuncio_cliente_id")
                            .from(ContasAnuncio::Table, ContasAnuncio::ClienteId)
                            .to(Clientes::Table, Clientes::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per external account per manager
        manager
            .create_index(
                Index::create()
                    .name("idx_contas_anuncio_gestor_externa")
                    .table(ContasAnuncio::Table)
                    .col(ContasAnuncio::GestorId)
                    .col(ContasAnuncio::IdContaExterna)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_contas_anuncio_gestor_externa")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ContasAnuncio::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ContasAnuncio {
    Table,
    Id,
    GestorId,
    ClienteId,
    IdContaExterna,
    Nome,
    TokenAcessoCifrado,
    TokenExpiraEm,
    Ativo,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Clientes {
    Table,
    Id,
}
