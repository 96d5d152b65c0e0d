//! Derivation error types

use thiserror::Error;

/// Errors surfaced by derivation analysis and materialization.
#[derive(Error, Debug)]
pub enum DerivationError {
    /// Ontology configuration failed to load or validate
    #[error("Ontology configuration error: {0}")]
    Config(#[from] crate::config::OntologyConfigError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Source marker referenced by a plan no longer exists
    #[error("Marker not found: {0}")]
    MarkerNotFound(i32),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type for derivation operations
pub type Result<T> = std::result::Result<T, DerivationError>;
