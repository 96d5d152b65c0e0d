//! Tagmark core
//!
//! Derived-marker materialization over a tag ontology: markers carry a
//! primary tag, status tags and performer slots; configured "implies"
//! rules expand each marker into its full chain of derived markers,
//! which can be previewed and then persisted.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod operations;
pub mod services;

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::{AppConfig, FileOntologyProvider};
use crate::infrastructure::database::{Database, SeaOrmStore};
use crate::operations::derivation::MaterializeOptions;
use crate::services::DerivationService;

/// The main context for core operations: configuration plus the opened
/// database, from which request-scoped services are built.
pub struct Core {
    config: AppConfig,
    db: Arc<Database>,
}

impl Core {
    /// Open (or initialize) a core at the given data directory.
    pub async fn open(data_dir: PathBuf) -> anyhow::Result<Self> {
        info!("Initializing tagmark core at {:?}", data_dir);

        let config = AppConfig::load_or_create(&data_dir)?;
        config.ensure_directories()?;

        let db = Database::open_or_create(&config.database_path()).await?;
        db.migrate().await?;

        Ok(Self {
            config,
            db: Arc::new(db),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn database(&self) -> Arc<Database> {
        self.db.clone()
    }

    /// Build a derivation service wired to the local store and the
    /// file-backed ontology config.
    pub fn derivation(&self) -> DerivationService {
        let store = Arc::new(SeaOrmStore::new(self.db.clone()));
        DerivationService::new(
            Arc::new(FileOntologyProvider::new(self.config.ontology_path())),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            MaterializeOptions {
                derived_marker_tag_id: self.config.derived_marker_tag_id,
            },
        )
    }
}
