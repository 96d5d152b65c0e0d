//! Collaborator boundaries consumed by the derivation engine
//!
//! Every external lookup the engine needs goes through one of these
//! traits. The SQLite store implements all of them; tests substitute
//! in-memory fakes.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

use super::error::Result;
use crate::config::OntologySnapshot;
use crate::domain::{DerivedMarkerCandidate, SceneMarker, SlotDefinition};

/// Supplies the current rule set and depth bound as an immutable
/// snapshot for the duration of one computation.
#[async_trait]
pub trait OntologyProvider: Send + Sync {
    async fn ontology(&self) -> Result<OntologySnapshot>;
}

/// Ordered slot-definition set for a tag. Empty means the tag has no
/// slot set configured.
#[async_trait]
pub trait SlotDefinitionSource: Send + Sync {
    async fn slot_definitions(&self, tag_id: i32) -> Result<Vec<SlotDefinition>>;
}

/// Display names for tags. Preview output only, never derivation logic.
#[async_trait]
pub trait TagNameSource: Send + Sync {
    async fn tag_names(&self, ids: &[i32]) -> Result<HashMap<i32, String>>;
}

/// Rule ids already materialized from a given source marker. The engine
/// trusts this set; it never re-derives identity.
#[async_trait]
pub trait DerivationLedger: Send + Sync {
    async fn materialized_rule_ids(&self, marker_id: i32) -> Result<HashSet<String>>;

    /// Which of the given markers are themselves derivation targets.
    /// Derived markers never act as closure sources: their chain was
    /// computed up front when the real source was materialized.
    async fn derived_marker_ids(&self, marker_ids: &[i32]) -> Result<HashSet<i32>>;
}

/// Write-time knobs for materialization.
#[derive(Debug, Clone, Default)]
pub struct MaterializeOptions {
    /// Tag appended to every materialized marker, when set.
    pub derived_marker_tag_id: Option<i32>,
}

/// Marker persistence boundary.
#[async_trait]
pub trait MarkerStore: Send + Sync {
    /// All markers of a scene, with slots and additional tags attached.
    async fn markers_for_scene(&self, scene_id: i32) -> Result<Vec<SceneMarker>>;

    /// Persist one candidate: the marker row, its tag and slot rows, and
    /// the derivation edge. Atomic — either all of it commits or none.
    /// Returns the new marker's id.
    async fn create_derived_marker(
        &self,
        source: &SceneMarker,
        candidate: &DerivedMarkerCandidate,
        options: &MaterializeOptions,
    ) -> Result<i32>;
}
