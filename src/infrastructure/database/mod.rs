//! Database infrastructure using SeaORM

use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod entities;
pub mod migration;
pub mod store;

pub use store::SeaOrmStore;

/// Database wrapper for the marker store
pub struct Database {
    /// SeaORM database connection
    conn: DatabaseConnection,
}

impl Database {
    /// Open the database at the specified path, creating it if needed
    pub async fn open_or_create(path: &Path) -> Result<Self, DbErr> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DbErr::Custom(format!("Failed to create directory: {}", e)))?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", path.display());
        let conn = Self::connect(db_url, 10).await?;

        info!("Opened database at {:?}", path);

        Ok(Self { conn })
    }

    /// Open a fresh in-memory database. Used by tests and demos.
    pub async fn in_memory() -> Result<Self, DbErr> {
        // A pool of in-memory connections is a pool of separate
        // databases; keep exactly one
        let conn = Self::connect("sqlite::memory:".to_string(), 1).await?;
        Ok(Self { conn })
    }

    async fn connect(db_url: String, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
        let mut opt = ConnectOptions::new(db_url);
        opt.max_connections(max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .sqlx_logging(false); // We'll use tracing instead

        SeaDatabase::connect(opt).await
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<(), DbErr> {
        migration::Migrator::up(&self.conn, None).await?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the database connection
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }
}
