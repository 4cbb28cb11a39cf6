//! Database migrations for the Traffic Manager API.
//!
//! Schema for clients, connected ad accounts, synced campaigns and daily
//! metrics, per-manager sync settings and public reports.

pub use sea_orm_migration::prelude::*;

mod m2025_01_10_000001_create_clientes;
mod m2025_01_10_000002_create_contas_anuncio;
mod m2025_01_10_000003_create_campanhas;
mod m2025_01_10_000004_create_metricas_diarias;
mod m2025_01_10_000005_create_config_sync;
mod m2025_01_10_000006_create_relatorios_publicos;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_01_10_000001_create_clientes::Migration),
            Box::new(m2025_01_10_000002_create_contas_anuncio::Migration),
            Box::new(m2025_01_10_000003_create_campanhas::Migration),
            Box::new(m2025_01_10_000004_create_metricas_diarias::Migration),
            Box::new(m2025_01_10_000005_create_config_sync::Migration),
            Box::new(m2025_01_10_000006_create_relatorios_publicos::Migration),
        ]
    }
}
