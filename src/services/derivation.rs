//! Scene-level derivation workflows
//!
//! One service instance wires the collaborator boundaries together for
//! the duration of a request: snapshot the ontology, load the scene's
//! markers, plan, and (after confirmation) write. Nothing here holds
//! mutable state; concurrent requests only meet at the storage layer.

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{DerivationPlan, MappedSlot, SceneMarker, SkipReason, SkippedMarker};
use crate::operations::derivation::planner;
use crate::operations::derivation::{
    DerivationError, DerivationLedger, MarkerStore, MaterializationWriter, MaterializeOptions,
    OntologyProvider, Result, SlotDefinitionSource, SlotMapper, TagNameSource,
};

/// What a confirmed materialization run created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializeSummary {
    /// Source markers that had at least one new derivation
    pub sources_processed: usize,
    /// Derived markers created across all sources
    pub markers_created: usize,
}

/// Scene-level analysis and materialization.
pub struct DerivationService {
    ontology: Arc<dyn OntologyProvider>,
    markers: Arc<dyn MarkerStore>,
    ledger: Arc<dyn DerivationLedger>,
    tag_names: Arc<dyn TagNameSource>,
    slot_definitions: Arc<dyn SlotDefinitionSource>,
    options: MaterializeOptions,
}

impl DerivationService {
    pub fn new(
        ontology: Arc<dyn OntologyProvider>,
        markers: Arc<dyn MarkerStore>,
        ledger: Arc<dyn DerivationLedger>,
        tag_names: Arc<dyn TagNameSource>,
        slot_definitions: Arc<dyn SlotDefinitionSource>,
        options: MaterializeOptions,
    ) -> Self {
        Self {
            ontology,
            markers,
            ledger,
            tag_names,
            slot_definitions,
            options,
        }
    }

    /// Dry-run derivation analysis for one scene.
    ///
    /// Read-only and idempotent: repeated calls with no writes in
    /// between return the same plan.
    pub async fn analyze_scene(&self, scene_id: i32) -> Result<DerivationPlan> {
        let snapshot = self.ontology.ontology().await?;
        let all_markers = self.markers.markers_for_scene(scene_id).await?;

        // Materialized markers never act as closure sources; their
        // chains were computed up front from the real source
        let marker_ids: Vec<i32> = all_markers.iter().map(|marker| marker.id).collect();
        let derived_ids = self.ledger.derived_marker_ids(&marker_ids).await?;
        let (derived, markers): (Vec<SceneMarker>, Vec<SceneMarker>) = all_markers
            .into_iter()
            .partition(|marker| derived_ids.contains(&marker.id));

        // Ledger reads are independent per marker
        let ledgers = try_join_all(
            markers
                .iter()
                .map(|marker| self.ledger.materialized_rule_ids(marker.id)),
        )
        .await?;
        let existing: HashMap<i32, HashSet<String>> = markers
            .iter()
            .map(|marker| marker.id)
            .zip(ledgers)
            .collect();

        // Names are display-only: a failed lookup degrades the preview,
        // never the analysis
        let preview_tag_ids = snapshot.graph.derived_tag_ids();
        let tag_names = match self.tag_names.tag_names(&preview_tag_ids).await {
            Ok(names) => names,
            Err(err) => {
                warn!(%err, "tag name lookup failed, preview falls back to ids");
                HashMap::new()
            }
        };

        let mut plan = planner::analyze(
            &markers,
            &snapshot.graph,
            snapshot.max_depth,
            &existing,
            &tag_names,
        );
        plan.skipped.extend(derived.iter().map(|marker| SkippedMarker {
            marker_id: marker.id,
            marker_tag: marker
                .primary_tag
                .as_ref()
                .map(|t| t.name.clone())
                .unwrap_or_default(),
            reason: SkipReason::DerivedMarker,
        }));
        info!(
            scene_id,
            materializable = plan.materializable.len(),
            already_materialized = plan.already_materialized.len(),
            skipped = plan.skipped.len(),
            new_derivations = plan.new_derivations_total(),
            "derivation analysis complete"
        );
        Ok(plan)
    }

    /// Persist every new candidate in a previously computed plan.
    pub async fn materialize_plan(
        &self,
        scene_id: i32,
        plan: &DerivationPlan,
    ) -> Result<MaterializeSummary> {
        let markers = self.markers.markers_for_scene(scene_id).await?;
        let by_id: HashMap<i32, &SceneMarker> =
            markers.iter().map(|marker| (marker.id, marker)).collect();

        let writer = MaterializationWriter::new(self.markers.clone(), self.options.clone());
        let mut summary = MaterializeSummary::default();

        for entry in &plan.materializable {
            let source = by_id
                .get(&entry.marker_id)
                .ok_or(DerivationError::MarkerNotFound(entry.marker_id))?;
            let outcome = writer.materialize(source, &entry.new_candidates).await?;
            summary.sources_processed += 1;
            summary.markers_created += outcome.created_marker_ids.len();
        }

        Ok(summary)
    }

    /// Analyze a scene and persist everything new in one call.
    pub async fn materialize_scene(&self, scene_id: i32) -> Result<MaterializeSummary> {
        let plan = self.analyze_scene(scene_id).await?;
        self.materialize_plan(scene_id, &plan).await
    }

    /// Structural slot remap for retagging one marker (no ontology
    /// involvement). `None` means the assignments do not survive the
    /// retag and should be cleared.
    pub async fn map_marker_slots(
        &self,
        marker: &SceneMarker,
        target_tag_id: i32,
    ) -> Option<Vec<MappedSlot>> {
        SlotMapper::new(self.slot_definitions.clone())
            .map_slots(&marker.slots, target_tag_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{self, StaticOntologyProvider};
    use crate::infrastructure::database::{Database, SeaOrmStore};
    use pretty_assertions::assert_eq;

    const ONTOLOGY: &str = r#"{
        "maxDerivationDepth": 3,
        "rules": [
            {
                "sourceTagId": 1,
                "derivedTagId": 2,
                "relationshipType": "implies",
                "slotMapping": [{"from": "Giver", "to": "Giver"}]
            },
            {
                "sourceTagId": 2,
                "derivedTagId": 4,
                "relationshipType": "implies",
                "slotMapping": [{"from": "Giver", "to": "Performer"}]
            }
        ]
    }"#;

    async fn service() -> (DerivationService, Arc<SeaOrmStore>) {
        let db = Database::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        let store = Arc::new(SeaOrmStore::new(Arc::new(db)));

        store.upsert_tag(1, "Handjob").await.unwrap();
        store.upsert_tag(2, "Sex Act").await.unwrap();
        store.upsert_tag(3, "Needs Review").await.unwrap();
        store.upsert_tag(4, "Any Act").await.unwrap();
        store.upsert_tag(5, "Unrelated").await.unwrap();

        let giver = store
            .create_slot_definition(1, Some("Giver"), &[], 0)
            .await
            .unwrap();
        store
            .create_slot_definition(2, Some("Giver"), &[], 0)
            .await
            .unwrap();
        store
            .create_slot_definition(4, Some("Performer"), &[], 0)
            .await
            .unwrap();

        let marker = store.create_marker(10, 1, 30.0, None).await.unwrap();
        store.add_marker_tag(marker, 3).await.unwrap();
        store.add_marker_slot(marker, giver, Some(77)).await.unwrap();

        // A marker nothing derives from
        store.create_marker(10, 5, 60.0, None).await.unwrap();

        let snapshot = config::ontology::from_json(ONTOLOGY).unwrap();
        let service = DerivationService::new(
            Arc::new(StaticOntologyProvider::new(snapshot)),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            MaterializeOptions::default(),
        );
        (service, store)
    }

    #[tokio::test]
    async fn test_analyze_materialize_reanalyze_round_trip() {
        let (service, _store) = service().await;

        let plan = service.analyze_scene(10).await.unwrap();
        assert_eq!(plan.materializable.len(), 1);
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.new_derivations_total(), 2);
        assert_eq!(
            plan.materializable[0].derived_tags,
            vec!["Sex Act", "Any Act"]
        );

        // Analysis alone changes nothing
        let again = service.analyze_scene(10).await.unwrap();
        assert_eq!(plan, again);

        let summary = service.materialize_plan(10, &plan).await.unwrap();
        assert_eq!(
            summary,
            MaterializeSummary {
                sources_processed: 1,
                markers_created: 2,
            }
        );

        // Everything derivable is now on the ledger, and the markers
        // just created never become closure sources themselves
        let after = service.analyze_scene(10).await.unwrap();
        assert!(after.materializable.is_empty());
        assert_eq!(after.already_materialized.len(), 1);
        assert_eq!(
            after.already_materialized[0].marker_id,
            plan.materializable[0].marker_id
        );
        assert_eq!(
            after
                .skipped
                .iter()
                .filter(|s| s.reason == SkipReason::DerivedMarker)
                .count(),
            2
        );
        assert_eq!(after.new_derivations_total(), 0);
    }

    #[tokio::test]
    async fn test_materialized_chain_carries_slots_through_renames() {
        let (service, store) = service().await;

        let plan = service.analyze_scene(10).await.unwrap();
        service.materialize_plan(10, &plan).await.unwrap();

        let markers = store.markers_for_scene(10).await.unwrap();
        let deep = markers
            .iter()
            .find(|m| m.primary_tag.as_ref().map(|t| t.id) == Some(4))
            .unwrap();
        // Giver -> Giver -> Performer, performer 77 intact at depth 1
        assert_eq!(deep.slots.len(), 1);
        assert_eq!(deep.slots[0].label.as_deref(), Some("Performer"));
        assert_eq!(deep.slots[0].performer_id, Some(77));
        // Status tag rode along
        assert_eq!(deep.tags.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3]);
    }

    #[tokio::test]
    async fn test_map_marker_slots_round_trip() {
        let (service, store) = service().await;
        let marker = store.markers_for_scene(10).await.unwrap().remove(0);

        // Tag 2 has an identically shaped slot set
        let mapped = service.map_marker_slots(&marker, 2).await.unwrap();
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].performer_id.as_deref(), Some("77"));

        // Tag 4's set is labeled differently; assignments are cleared
        assert_eq!(service.map_marker_slots(&marker, 4).await, None);
    }
}
