//! Application configuration

pub mod ontology;

pub use ontology::{
    FileOntologyProvider, OntologyConfigError, OntologySnapshot, StaticOntologyProvider,
};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const CONFIG_FILE: &str = "tagmark.json";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config schema version
    pub version: u32,

    /// Data directory path
    pub data_dir: PathBuf,

    /// Logging level
    pub log_level: String,

    /// Tag appended to every materialized marker, when set
    pub derived_marker_tag_id: Option<i32>,
}

impl AppConfig {
    fn target_version() -> u32 {
        1
    }

    /// Load configuration from a specific data directory
    pub fn load_from(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE);

        if config_path.exists() {
            info!("Loading config from {:?}", config_path);
            let json = fs::read_to_string(&config_path)?;
            let config: AppConfig = serde_json::from_str(&json)?;
            Ok(config)
        } else {
            warn!("No config found, creating default at {:?}", config_path);
            let config = Self::default_with_dir(data_dir.to_path_buf());
            config.save()?;
            Ok(config)
        }
    }

    /// Load or create configuration
    pub fn load_or_create(data_dir: &Path) -> Result<Self> {
        Self::load_from(data_dir).or_else(|_| {
            let config = Self::default_with_dir(data_dir.to_path_buf());
            config.save()?;
            Ok(config)
        })
    }

    /// Create default configuration with specific data directory
    pub fn default_with_dir(data_dir: PathBuf) -> Self {
        Self {
            version: Self::target_version(),
            data_dir,
            log_level: "info".to_string(),
            derived_marker_tag_id: None,
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;

        let config_path = self.data_dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, json)?;
        info!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("tagmark.db")
    }

    /// Path of the ontology rule document
    pub fn ontology_path(&self) -> PathBuf {
        self.data_dir.join("ontology.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_or_create_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::load_or_create(dir.path()).unwrap();
        config.derived_marker_tag_id = Some(7);
        config.save().unwrap();

        let reloaded = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(reloaded.derived_marker_tag_id, Some(7));
        assert_eq!(reloaded.version, AppConfig::target_version());
    }
}
