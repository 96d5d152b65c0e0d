//! Tag ontology: implication rules and the forward-traversal graph

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};

/// Relationship kinds an ontology edge can carry.
///
/// Closed enum: unknown strings are rejected when the configuration is
/// loaded, not at traversal time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RelationshipType {
    Implies,
}

/// One slot-label rename carried by a rule.
///
/// A source slot whose label matches `source_label` has its performer
/// assignment carried into a derived slot labeled `derived_label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotMapEntry {
    pub source_label: String,
    pub derived_label: String,
}

/// A validated ontology edge.
///
/// Identity is `(source_tag_id, derived_tag_id)`; the loader rejects
/// duplicate edges for the same pair. `slot_mapping` has unique source
/// labels; source slots it does not mention are dropped from the
/// derived marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyRule {
    pub source_tag_id: i32,
    pub derived_tag_id: i32,
    pub relationship: RelationshipType,
    pub slot_mapping: Vec<SlotMapEntry>,
}

impl OntologyRule {
    /// Canonical edge identity, stable regardless of the path that
    /// reached the edge. Formatted in exactly one place.
    pub fn rule_id(&self) -> String {
        format!("{}->{}", self.source_tag_id, self.derived_tag_id)
    }
}

/// One slot in a tag's slot-definition set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDefinition {
    pub id: i32,
    pub tag_id: i32,
    pub label: Option<String>,
    #[serde(default)]
    pub gender_hints: Vec<String>,
    pub order: i32,
}

/// All configured rules, indexed by source tag for forward traversal.
///
/// No DAG validation happens at construction; termination is owned by
/// the closure engine's depth bound, so a misconfigured cycle cannot
/// hang a request.
#[derive(Debug, Clone, Default)]
pub struct OntologyGraph {
    by_source: HashMap<i32, Vec<OntologyRule>>,
}

impl OntologyGraph {
    pub fn new(rules: Vec<OntologyRule>) -> Self {
        let mut by_source: HashMap<i32, Vec<OntologyRule>> = HashMap::new();
        for rule in rules {
            by_source.entry(rule.source_tag_id).or_default().push(rule);
        }
        Self { by_source }
    }

    /// Outgoing rules for a tag, in configuration order.
    pub fn rules_from(&self, tag_id: i32) -> &[OntologyRule] {
        self.by_source
            .get(&tag_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every tag id that appears as a derivation target, deduplicated.
    pub fn derived_tag_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self
            .by_source
            .values()
            .flatten()
            .map(|r| r.derived_tag_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn rule_count(&self) -> usize {
        self.by_source.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }
}
