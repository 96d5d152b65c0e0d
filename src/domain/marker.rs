//! Scene marker input types

use serde::{Deserialize, Serialize};

/// A tag reference: id plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: i32,
    pub name: String,
}

/// One labeled role assignment on a marker.
///
/// `label` and `order` come from the slot definition the assignment was
/// created against; `performer_id` is the bound performer, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSlot {
    pub slot_definition_id: i32,
    pub performer_id: Option<i32>,
    pub label: Option<String>,
    #[serde(default)]
    pub gender_hints: Vec<String>,
    pub order: i32,
}

/// A time-ranged annotation on a scene.
///
/// Markers are read-only inputs to the derivation engine; nothing in the
/// engine mutates them. `tags` holds the additional (status) tags, with
/// the primary excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMarker {
    pub id: i32,
    pub scene_id: i32,
    pub seconds: f64,
    pub end_seconds: Option<f64>,
    pub primary_tag: Option<TagRef>,
    #[serde(default)]
    pub tags: Vec<TagRef>,
    #[serde(default)]
    pub slots: Vec<MarkerSlot>,
}

impl SceneMarker {
    /// Additional-tag ids in input order.
    pub fn tag_ids(&self) -> Vec<i32> {
        self.tags.iter().map(|t| t.id).collect()
    }
}
