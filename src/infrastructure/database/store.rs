//! SeaORM-backed implementations of the derivation collaborators
//!
//! One store type implements every boundary trait the engine consumes.
//! The derived-marker write path runs inside a single transaction per
//! candidate, so a failure can never leave a marker without its edge or
//! an edge without its marker.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use super::entities::{derivation_edge, marker, marker_slot, marker_tag, slot_definition, tag};
use super::Database;
use crate::domain::{self, DerivedMarkerCandidate, SceneMarker, TagRef};
use crate::operations::derivation::sources::{
    DerivationLedger, MarkerStore, MaterializeOptions, SlotDefinitionSource, TagNameSource,
};
use crate::operations::derivation::{DerivationError, Result};

/// SQLite-backed store behind the derivation collaborator traits.
pub struct SeaOrmStore {
    db: Arc<Database>,
}

impl SeaOrmStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.db.conn()
    }

    /// Insert or refresh one cached tag.
    pub async fn upsert_tag(&self, id: i32, name: &str) -> Result<()> {
        let model = tag::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            updated_at: Set(Utc::now()),
        };
        tag::Entity::insert(model)
            .on_conflict(
                OnConflict::column(tag::Column::Id)
                    .update_columns([tag::Column::Name, tag::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(self.conn())
            .await?;
        Ok(())
    }

    /// Add one slot definition to a tag's slot set.
    pub async fn create_slot_definition(
        &self,
        tag_id: i32,
        label: Option<&str>,
        gender_hints: &[String],
        display_order: i32,
    ) -> Result<i32> {
        let model = slot_definition::ActiveModel {
            tag_id: Set(tag_id),
            label: Set(label.map(str::to_string)),
            gender_hints: Set(serde_json::json!(gender_hints)),
            display_order: Set(display_order),
            ..Default::default()
        };
        Ok(model.insert(self.conn()).await?.id)
    }

    /// Create an observed (non-derived) marker.
    pub async fn create_marker(
        &self,
        scene_id: i32,
        primary_tag_id: i32,
        seconds: f64,
        end_seconds: Option<f64>,
    ) -> Result<i32> {
        let now = Utc::now();
        let model = marker::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            scene_id: Set(scene_id),
            primary_tag_id: Set(primary_tag_id),
            seconds: Set(seconds),
            end_seconds: Set(end_seconds),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(model.insert(self.conn()).await?.id)
    }

    /// Attach an additional tag to a marker.
    pub async fn add_marker_tag(&self, marker_id: i32, tag_id: i32) -> Result<()> {
        marker_tag::ActiveModel {
            marker_id: Set(marker_id),
            tag_id: Set(tag_id),
        }
        .insert(self.conn())
        .await?;
        Ok(())
    }

    /// Assign a performer (or an empty slot) on a marker.
    pub async fn add_marker_slot(
        &self,
        marker_id: i32,
        slot_definition_id: i32,
        performer_id: Option<i32>,
    ) -> Result<i32> {
        let model = marker_slot::ActiveModel {
            marker_id: Set(marker_id),
            slot_definition_id: Set(slot_definition_id),
            performer_id: Set(performer_id),
            ..Default::default()
        };
        Ok(model.insert(self.conn()).await?.id)
    }
}

fn definition_from_row(row: slot_definition::Model) -> domain::SlotDefinition {
    domain::SlotDefinition {
        id: row.id,
        tag_id: row.tag_id,
        label: row.label,
        gender_hints: serde_json::from_value(row.gender_hints).unwrap_or_default(),
        order: row.display_order,
    }
}

#[async_trait]
impl SlotDefinitionSource for SeaOrmStore {
    async fn slot_definitions(&self, tag_id: i32) -> Result<Vec<domain::SlotDefinition>> {
        let rows = slot_definition::Entity::find()
            .filter(slot_definition::Column::TagId.eq(tag_id))
            .order_by_asc(slot_definition::Column::DisplayOrder)
            .all(self.conn())
            .await?;
        Ok(rows.into_iter().map(definition_from_row).collect())
    }
}

#[async_trait]
impl TagNameSource for SeaOrmStore {
    async fn tag_names(&self, ids: &[i32]) -> Result<HashMap<i32, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = tag::Entity::find()
            .filter(tag::Column::Id.is_in(ids.iter().copied()))
            .all(self.conn())
            .await?;
        Ok(rows.into_iter().map(|t| (t.id, t.name)).collect())
    }
}

#[async_trait]
impl DerivationLedger for SeaOrmStore {
    async fn materialized_rule_ids(&self, marker_id: i32) -> Result<HashSet<String>> {
        let rows = derivation_edge::Entity::find()
            .filter(derivation_edge::Column::SourceMarkerId.eq(marker_id))
            .all(self.conn())
            .await?;
        Ok(rows.into_iter().map(|edge| edge.rule_id).collect())
    }

    async fn derived_marker_ids(&self, marker_ids: &[i32]) -> Result<HashSet<i32>> {
        if marker_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let rows = derivation_edge::Entity::find()
            .filter(derivation_edge::Column::DerivedMarkerId.is_in(marker_ids.iter().copied()))
            .all(self.conn())
            .await?;
        Ok(rows.into_iter().map(|edge| edge.derived_marker_id).collect())
    }
}

#[async_trait]
impl MarkerStore for SeaOrmStore {
    async fn markers_for_scene(&self, scene_id: i32) -> Result<Vec<SceneMarker>> {
        let conn = self.conn();

        let rows = marker::Entity::find()
            .filter(marker::Column::SceneId.eq(scene_id))
            .order_by_asc(marker::Column::Seconds)
            .order_by_asc(marker::Column::Id)
            .all(conn)
            .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let marker_ids: Vec<i32> = rows.iter().map(|m| m.id).collect();

        let tag_rows = marker_tag::Entity::find()
            .filter(marker_tag::Column::MarkerId.is_in(marker_ids.iter().copied()))
            .order_by_asc(marker_tag::Column::TagId)
            .all(conn)
            .await?;

        let slot_rows = marker_slot::Entity::find()
            .filter(marker_slot::Column::MarkerId.is_in(marker_ids.iter().copied()))
            .all(conn)
            .await?;

        let definitions: HashMap<i32, slot_definition::Model> = slot_definition::Entity::find()
            .filter(
                slot_definition::Column::Id
                    .is_in(slot_rows.iter().map(|s| s.slot_definition_id)),
            )
            .all(conn)
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();

        let mut name_ids: HashSet<i32> = rows.iter().map(|m| m.primary_tag_id).collect();
        name_ids.extend(tag_rows.iter().map(|t| t.tag_id));
        let names: HashMap<i32, String> = tag::Entity::find()
            .filter(tag::Column::Id.is_in(name_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();
        let display =
            |id: i32| names.get(&id).cloned().unwrap_or_else(|| format!("tag {id}"));

        Ok(rows
            .into_iter()
            .map(|row| {
                let tags = tag_rows
                    .iter()
                    .filter(|t| t.marker_id == row.id)
                    .map(|t| TagRef {
                        id: t.tag_id,
                        name: display(t.tag_id),
                    })
                    .collect();

                let mut slots: Vec<domain::MarkerSlot> = slot_rows
                    .iter()
                    .filter(|s| s.marker_id == row.id)
                    .map(|s| {
                        let definition = definitions.get(&s.slot_definition_id);
                        domain::MarkerSlot {
                            slot_definition_id: s.slot_definition_id,
                            performer_id: s.performer_id,
                            label: definition.and_then(|d| d.label.clone()),
                            gender_hints: definition
                                .map(|d| {
                                    serde_json::from_value(d.gender_hints.clone())
                                        .unwrap_or_default()
                                })
                                .unwrap_or_default(),
                            order: definition.map(|d| d.display_order).unwrap_or(0),
                        }
                    })
                    .collect();
                slots.sort_by_key(|s| s.order);

                SceneMarker {
                    id: row.id,
                    scene_id: row.scene_id,
                    seconds: row.seconds,
                    end_seconds: row.end_seconds,
                    primary_tag: Some(TagRef {
                        id: row.primary_tag_id,
                        name: display(row.primary_tag_id),
                    }),
                    tags,
                    slots,
                }
            })
            .collect())
    }

    async fn create_derived_marker(
        &self,
        source: &SceneMarker,
        candidate: &DerivedMarkerCandidate,
        options: &MaterializeOptions,
    ) -> Result<i32> {
        let source = source.clone();
        let candidate = candidate.clone();
        let options = options.clone();

        let marker_id = self
            .conn()
            .transaction::<_, i32, DbErr>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();

                    let created = marker::ActiveModel {
                        uuid: Set(Uuid::new_v4()),
                        scene_id: Set(source.scene_id),
                        primary_tag_id: Set(candidate.derived_tag_id),
                        seconds: Set(source.seconds),
                        end_seconds: Set(source.end_seconds),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    // Carried status tags plus the optional configured
                    // "derived" tag, never the new primary itself
                    let mut tag_ids = candidate.tags.clone();
                    if let Some(extra) = options.derived_marker_tag_id {
                        tag_ids.push(extra);
                    }
                    tag_ids.sort_unstable();
                    tag_ids.dedup();
                    tag_ids.retain(|id| *id != candidate.derived_tag_id);
                    for tag_id in tag_ids {
                        marker_tag::ActiveModel {
                            marker_id: Set(created.id),
                            tag_id: Set(tag_id),
                        }
                        .insert(txn)
                        .await?;
                    }

                    // Resolve candidate labels against the derived tag's
                    // slot set; labels with no definition are dropped
                    let definitions = slot_definition::Entity::find()
                        .filter(
                            slot_definition::Column::TagId.eq(candidate.derived_tag_id),
                        )
                        .all(txn)
                        .await?;
                    for slot in &candidate.slots {
                        let matched = definitions
                            .iter()
                            .find(|d| d.label.as_deref() == Some(slot.label.as_str()));
                        if let Some(definition) = matched {
                            marker_slot::ActiveModel {
                                marker_id: Set(created.id),
                                slot_definition_id: Set(definition.id),
                                performer_id: Set(slot.performer_id),
                                ..Default::default()
                            }
                            .insert(txn)
                            .await?;
                        }
                    }

                    derivation_edge::ActiveModel {
                        source_marker_id: Set(candidate.source_marker_id),
                        derived_marker_id: Set(created.id),
                        rule_id: Set(candidate.rule_id.clone()),
                        depth: Set(candidate.depth as i32),
                        created_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    Ok(created.id)
                })
            })
            .await
            .map_err(|err| match err {
                sea_orm::TransactionError::Connection(db) => DerivationError::Database(db),
                sea_orm::TransactionError::Transaction(db) => DerivationError::Database(db),
            })?;

        Ok(marker_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CandidateSlot;
    use pretty_assertions::assert_eq;

    async fn store() -> SeaOrmStore {
        let db = Database::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        SeaOrmStore::new(Arc::new(db))
    }

    /// Tags 1..=3, slot sets on 1 and 2, one observed marker on tag 1
    /// with a status tag and a filled "Giver" slot.
    async fn seeded() -> (SeaOrmStore, i32) {
        let store = store().await;
        store.upsert_tag(1, "Handjob").await.unwrap();
        store.upsert_tag(2, "Sex Act").await.unwrap();
        store.upsert_tag(3, "Needs Review").await.unwrap();

        let giver = store
            .create_slot_definition(1, Some("Giver"), &["female".to_string()], 0)
            .await
            .unwrap();
        store
            .create_slot_definition(2, Some("Giver"), &[], 0)
            .await
            .unwrap();

        let marker_id = store.create_marker(10, 1, 42.5, None).await.unwrap();
        store.add_marker_tag(marker_id, 3).await.unwrap();
        store.add_marker_slot(marker_id, giver, Some(77)).await.unwrap();

        (store, marker_id)
    }

    fn candidate(marker_id: i32) -> DerivedMarkerCandidate {
        DerivedMarkerCandidate {
            source_marker_id: marker_id,
            derived_tag_id: 2,
            tags: vec![3],
            slots: vec![CandidateSlot {
                label: "Giver".to_string(),
                performer_id: Some(77),
            }],
            depth: 0,
            rule_id: "1->2".to_string(),
        }
    }

    #[tokio::test]
    async fn test_markers_for_scene_assembles_tags_and_slots() {
        let (store, marker_id) = seeded().await;

        let markers = store.markers_for_scene(10).await.unwrap();
        assert_eq!(markers.len(), 1);

        let marker = &markers[0];
        assert_eq!(marker.id, marker_id);
        assert_eq!(marker.primary_tag.as_ref().unwrap().name, "Handjob");
        assert_eq!(marker.tags.len(), 1);
        assert_eq!(marker.tags[0].name, "Needs Review");
        assert_eq!(marker.slots.len(), 1);
        assert_eq!(marker.slots[0].label.as_deref(), Some("Giver"));
        assert_eq!(marker.slots[0].performer_id, Some(77));
        assert_eq!(marker.slots[0].gender_hints, vec!["female".to_string()]);
    }

    #[tokio::test]
    async fn test_create_derived_marker_persists_all_rows() {
        let (store, marker_id) = seeded().await;
        let source = store.markers_for_scene(10).await.unwrap().remove(0);

        let derived_id = store
            .create_derived_marker(&source, &candidate(marker_id), &MaterializeOptions::default())
            .await
            .unwrap();

        let markers = store.markers_for_scene(10).await.unwrap();
        assert_eq!(markers.len(), 2);

        let derived = markers.iter().find(|m| m.id == derived_id).unwrap();
        assert_eq!(derived.primary_tag.as_ref().unwrap().id, 2);
        assert_eq!(derived.seconds, 42.5);
        // Status tag carried through, slot remapped onto tag 2's set
        assert_eq!(derived.tags[0].id, 3);
        assert_eq!(derived.slots.len(), 1);
        assert_eq!(derived.slots[0].performer_id, Some(77));

        let ledger = store.materialized_rule_ids(marker_id).await.unwrap();
        assert_eq!(ledger, HashSet::from(["1->2".to_string()]));
    }

    #[tokio::test]
    async fn test_derived_marker_tag_option_is_appended() {
        let (store, marker_id) = seeded().await;
        store.upsert_tag(99, "Derived").await.unwrap();
        let source = store.markers_for_scene(10).await.unwrap().remove(0);

        let options = MaterializeOptions {
            derived_marker_tag_id: Some(99),
        };
        let derived_id = store
            .create_derived_marker(&source, &candidate(marker_id), &options)
            .await
            .unwrap();

        let markers = store.markers_for_scene(10).await.unwrap();
        let derived = markers.iter().find(|m| m.id == derived_id).unwrap();
        let tag_ids: Vec<i32> = derived.tags.iter().map(|t| t.id).collect();
        assert_eq!(tag_ids, vec![3, 99]);
    }

    #[tokio::test]
    async fn test_unresolvable_slot_labels_are_dropped() {
        let (store, marker_id) = seeded().await;
        let source = store.markers_for_scene(10).await.unwrap().remove(0);

        let mut candidate = candidate(marker_id);
        candidate.slots.push(CandidateSlot {
            label: "Receiver".to_string(),
            performer_id: Some(88),
        });

        let derived_id = store
            .create_derived_marker(&source, &candidate, &MaterializeOptions::default())
            .await
            .unwrap();

        let markers = store.markers_for_scene(10).await.unwrap();
        let derived = markers.iter().find(|m| m.id == derived_id).unwrap();
        // Tag 2 defines only "Giver"; the unresolvable label vanished
        assert_eq!(derived.slots.len(), 1);
        assert_eq!(derived.slots[0].label.as_deref(), Some("Giver"));
    }

    #[tokio::test]
    async fn test_duplicate_materialization_rolls_back_cleanly() {
        let (store, marker_id) = seeded().await;
        let source = store.markers_for_scene(10).await.unwrap().remove(0);

        store
            .create_derived_marker(&source, &candidate(marker_id), &MaterializeOptions::default())
            .await
            .unwrap();
        let after_first = store.markers_for_scene(10).await.unwrap().len();

        // Same rule again: the (source, rule) uniqueness fires inside the
        // transaction, so the half-created marker must vanish with it
        let result = store
            .create_derived_marker(&source, &candidate(marker_id), &MaterializeOptions::default())
            .await;
        assert!(result.is_err());

        assert_eq!(store.markers_for_scene(10).await.unwrap().len(), after_first);
        assert_eq!(
            store.materialized_rule_ids(marker_id).await.unwrap().len(),
            1
        );
    }
}
