//! Derived-marker materialization engine
//!
//! The pipeline: the closure engine expands one marker into every
//! implied (tag, slots) pair, the planner diffs that against the
//! derivation ledger to build a dry-run plan, and the writer persists
//! confirmed candidates through the marker store. The structural slot
//! mapper serves retag operations, separately from ontology expansion.

pub mod closure;
pub mod error;
pub mod planner;
pub mod slots;
pub mod sources;
pub mod writer;

pub use error::{DerivationError, Result};
pub use slots::{SlotMapper, SlotMappingDecision, SlotMappingObserver, TracingObserver};
pub use sources::{
    DerivationLedger, MarkerStore, MaterializeOptions, OntologyProvider, SlotDefinitionSource,
    TagNameSource,
};
pub use writer::{MaterializationWriter, MaterializeOutcome};
