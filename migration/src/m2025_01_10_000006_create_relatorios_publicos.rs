//! Migration to create the relatorios_publicos table.
//!
//! Token-addressed shareable reports. The token column is unique and is the
//! only lookup key used by the public endpoint.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RelatoriosPublicos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RelatoriosPublicos::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RelatoriosPublicos::Token).text().not_null())
                    .col(ColumnDef::new(RelatoriosPublicos::GestorId).uuid().not_null())
                    .col(ColumnDef::new(RelatoriosPublicos::ClienteId).uuid().not_null())
                    .col(ColumnDef::new(RelatoriosPublicos::Titulo).text().not_null())
                    .col(ColumnDef::new(RelatoriosPublicos::Descricao).text().null())
                    .col(
                        ColumnDef::new(RelatoriosPublicos::Ativo)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RelatoriosPublicos::DataExpiracao)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(RelatoriosPublicos::Visualizacoes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RelatoriosPublicos::UltimaVisualizacao)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(RelatoriosPublicos::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(RelatoriosPublicos::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_relatorios_publicos_cliente_id")
                            .from(RelatoriosPublicos::Table, RelatoriosPublicos::ClienteId)
                            .to(Clientes::Table, Clientes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_relatorios_publicos_token")
                    .table(RelatoriosPublicos::Table)
                    .col(RelatoriosPublicos::Token)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_relatorios_publicos_gestor_id")
                    .table(RelatoriosPublicos::Table)
                    .col(RelatoriosPublicos::GestorId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_relatorios_publicos_gestor_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_relatorios_publicos_token").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(RelatoriosPublicos::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RelatoriosPublicos {
    Table,
    Id,
    Token,
    GestorId,
    ClienteId,
    Titulo,
    Descricao,
    Ativo,
    DataExpiracao,
    Visualizacoes,
    UltimaVisualizacao,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Clientes {
    Table,
    Id,
}
