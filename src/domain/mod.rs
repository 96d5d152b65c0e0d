//! Core domain types
//!
//! Value types shared across the derivation engine: markers as they come
//! in from the marker store, the tag ontology, and the candidate/preview
//! types produced by analysis.

pub mod derivation;
pub mod marker;
pub mod ontology;

pub use derivation::{
    AlreadyMaterializedMarker, CandidateSlot, DerivationPlan, DerivedMarkerCandidate, MappedSlot,
    MarkerMaterialization, SkipReason, SkippedMarker,
};
pub use marker::{MarkerSlot, SceneMarker, TagRef};
pub use ontology::{OntologyGraph, OntologyRule, RelationshipType, SlotDefinition, SlotMapEntry};
