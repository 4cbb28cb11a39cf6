//! Migration to create the metricas_diarias table.
//!
//! Daily insight rows keyed by (campanha_id, data) so a resync of the same
//! window overwrites instead of duplicating.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MetricasDiarias::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MetricasDiarias::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MetricasDiarias::CampanhaId).uuid().not_null())
                    .col(ColumnDef::new(MetricasDiarias::Data).date().not_null())
                    .col(
                        ColumnDef::new(MetricasDiarias::GastoDia)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(MetricasDiarias::ImpressoesDia)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MetricasDiarias::CliquesDia)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MetricasDiarias::LeadsDia)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MetricasDiarias::CtrDia)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(MetricasDiarias::CpcDia)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(MetricasDiarias::CpmDia)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(MetricasDiarias::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_metricas_diarias_campanha_id")
                            .from(MetricasDiarias::Table, MetricasDiarias::CampanhaId)
                            .to(Campanhas::Table, Campanhas::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_metricas_diarias_campanha_data")
                    .table(MetricasDiarias::Table)
                    .col(MetricasDiarias::CampanhaId)
                    .col(MetricasDiarias::Data)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_metricas_diarias_campanha_data")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(MetricasDiarias::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MetricasDiarias {
    Table,
    Id,
    CampanhaId,
    Data,
    GastoDia,
    ImpressoesDia,
    CliquesDia,
    LeadsDia,
    CtrDia,
    CpcDia,
    CpmDia,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Campanhas {
    Table,
    Id,
}
