//! Database migrations

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_tag_tables::Migration),
            Box::new(m20250602_000001_create_marker_tables::Migration),
            Box::new(m20250603_000001_add_derivation_edges::Migration),
        ]
    }
}

mod m20250601_000001_create_tag_tables;
mod m20250602_000001_create_marker_tables;
mod m20250603_000001_add_derivation_edges;
