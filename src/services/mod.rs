//! Request-scoped services

pub mod derivation;

pub use derivation::{DerivationService, MaterializeSummary};
