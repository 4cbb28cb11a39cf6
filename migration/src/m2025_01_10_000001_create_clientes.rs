//! Migration to create the clientes table.
//!
//! Agency clients owned by a manager. Public reports and ad accounts point
//! at a client.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Clientes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Clientes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Clientes::GestorId).uuid().not_null())
                    .col(ColumnDef::new(Clientes::Nome).text().not_null())
                    .col(ColumnDef::new(Clientes::Email).text().null())
                    .col(ColumnDef::new(Clientes::Empresa).text().null())
                    .col(
                        ColumnDef::new(Clientes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Clientes::UpdatedAt)
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
                    .name("idx_clientes_gestor_id")
                    .table(Clientes::Table)
                    .col(Clientes::GestorId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_clientes_gestor_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Clientes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Clientes {
    Table,
    Id,
    GestorId,
    Nome,
    Email,
    Empresa,
    CreatedAt,
    UpdatedAt,
}
