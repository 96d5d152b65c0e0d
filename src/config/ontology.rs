//! Ontology rule configuration
//!
//! The rule document is loose JSON on disk (the shape the web UI edits);
//! loading turns it into validated, typed rules. Malformed entries are
//! rejected here, at load time, never at traversal time.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

use crate::domain::{OntologyGraph, OntologyRule, RelationshipType, SlotMapEntry};
use crate::operations::derivation::sources::OntologyProvider;
use crate::operations::derivation::Result as DerivationResult;

/// Ontology configuration errors. All of these are hard failures: the
/// engine never guesses a default ruleset.
#[derive(Error, Debug)]
pub enum OntologyConfigError {
    /// No rule document at the expected path
    #[error("Ontology config not found at {0}")]
    NotFound(PathBuf),

    /// IO error
    #[error("Failed to read ontology config: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("Malformed ontology config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Relationship string outside the closed enum
    #[error("Unknown relationship type '{relationship}' on rule {source_id}->{derived}")]
    UnknownRelationship {
        relationship: String,
        source_id: i32,
        derived: i32,
    },

    /// Two rules for the same (source, derived) pair
    #[error("Duplicate rule for edge {0}->{1}")]
    DuplicateRule(i32, i32),

    /// Slot mapping mentions the same source label twice
    #[error("Duplicate slot mapping source label '{label}' on rule {source_id}->{derived}")]
    DuplicateSlotLabel {
        label: String,
        source_id: i32,
        derived: i32,
    },

    /// Depth bound must be at least 1
    #[error("maxDerivationDepth must be positive (got {0})")]
    InvalidDepth(i64),
}

/// An immutable ontology snapshot, valid for the duration of one
/// computation.
#[derive(Debug, Clone)]
pub struct OntologySnapshot {
    pub graph: OntologyGraph,
    pub max_depth: u32,
}

fn default_max_depth() -> i64 {
    3
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(default = "default_max_depth")]
    max_derivation_depth: i64,
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRule {
    source_tag_id: i32,
    derived_tag_id: i32,
    relationship_type: String,
    #[serde(default)]
    slot_mapping: Vec<RawSlotMapEntry>,
}

#[derive(Debug, Deserialize)]
struct RawSlotMapEntry {
    #[serde(rename = "from")]
    source: String,
    #[serde(rename = "to")]
    derived: String,
}

/// Load and validate the rule document at `path`.
pub fn load(path: &Path) -> Result<OntologySnapshot, OntologyConfigError> {
    if !path.exists() {
        return Err(OntologyConfigError::NotFound(path.to_path_buf()));
    }
    let json = fs::read_to_string(path)?;
    let snapshot = from_json(&json)?;
    info!(
        rules = snapshot.graph.rule_count(),
        max_depth = snapshot.max_depth,
        "Loaded ontology config from {:?}",
        path
    );
    Ok(snapshot)
}

/// Validate a rule document already in memory.
pub fn from_json(json: &str) -> Result<OntologySnapshot, OntologyConfigError> {
    let raw: RawDocument = serde_json::from_str(json)?;

    if raw.max_derivation_depth < 1 {
        return Err(OntologyConfigError::InvalidDepth(raw.max_derivation_depth));
    }

    let mut seen_edges: HashSet<(i32, i32)> = HashSet::new();
    let mut rules = Vec::with_capacity(raw.rules.len());

    for entry in raw.rules {
        let edge = (entry.source_tag_id, entry.derived_tag_id);
        if !seen_edges.insert(edge) {
            return Err(OntologyConfigError::DuplicateRule(edge.0, edge.1));
        }

        let relationship = RelationshipType::from_str(&entry.relationship_type).map_err(|_| {
            OntologyConfigError::UnknownRelationship {
                relationship: entry.relationship_type.clone(),
                source_id: edge.0,
                derived: edge.1,
            }
        })?;

        let mut seen_labels: HashSet<&str> = HashSet::new();
        for mapping in &entry.slot_mapping {
            if !seen_labels.insert(mapping.source.as_str()) {
                return Err(OntologyConfigError::DuplicateSlotLabel {
                    label: mapping.source.clone(),
                    source_id: edge.0,
                    derived: edge.1,
                });
            }
        }

        rules.push(OntologyRule {
            source_tag_id: entry.source_tag_id,
            derived_tag_id: entry.derived_tag_id,
            relationship,
            slot_mapping: entry
                .slot_mapping
                .into_iter()
                .map(|m| SlotMapEntry {
                    source_label: m.source,
                    derived_label: m.derived,
                })
                .collect(),
        });
    }

    Ok(OntologySnapshot {
        graph: OntologyGraph::new(rules),
        max_depth: raw.max_derivation_depth as u32,
    })
}

/// File-backed ontology provider.
///
/// Re-reads and re-validates the document on every snapshot request, so
/// edits take effect on the next analysis without a restart.
pub struct FileOntologyProvider {
    path: PathBuf,
}

impl FileOntologyProvider {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl OntologyProvider for FileOntologyProvider {
    async fn ontology(&self) -> DerivationResult<OntologySnapshot> {
        Ok(load(&self.path)?)
    }
}

/// Fixed in-memory ontology provider, for embedding and tests.
pub struct StaticOntologyProvider {
    snapshot: OntologySnapshot,
}

impl StaticOntologyProvider {
    pub fn new(snapshot: OntologySnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl OntologyProvider for StaticOntologyProvider {
    async fn ontology(&self) -> DerivationResult<OntologySnapshot> {
        Ok(self.snapshot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_valid_document() {
        let snapshot = from_json(
            r#"{
                "maxDerivationDepth": 5,
                "rules": [
                    {
                        "sourceTagId": 1,
                        "derivedTagId": 2,
                        "relationshipType": "implies",
                        "slotMapping": [{"from": "Giver", "to": "Receiver"}]
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.max_depth, 5);
        let rules = snapshot.graph.rules_from(1);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].relationship, RelationshipType::Implies);
        assert_eq!(rules[0].slot_mapping[0].source_label, "Giver");
        assert_eq!(rules[0].slot_mapping[0].derived_label, "Receiver");
    }

    #[test]
    fn test_depth_defaults_to_three() {
        let snapshot = from_json(r#"{"rules": []}"#).unwrap();
        assert_eq!(snapshot.max_depth, 3);
    }

    #[test]
    fn test_rejects_duplicate_edge() {
        let err = from_json(
            r#"{"rules": [
                {"sourceTagId": 1, "derivedTagId": 2, "relationshipType": "implies"},
                {"sourceTagId": 1, "derivedTagId": 2, "relationshipType": "implies"}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, OntologyConfigError::DuplicateRule(1, 2)));
    }

    #[test]
    fn test_rejects_duplicate_slot_label() {
        let err = from_json(
            r#"{"rules": [
                {
                    "sourceTagId": 1,
                    "derivedTagId": 2,
                    "relationshipType": "implies",
                    "slotMapping": [
                        {"from": "Giver", "to": "A"},
                        {"from": "Giver", "to": "B"}
                    ]
                }
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            OntologyConfigError::DuplicateSlotLabel { .. }
        ));
    }

    #[test]
    fn test_rejects_unknown_relationship() {
        let err = from_json(
            r#"{"rules": [
                {"sourceTagId": 1, "derivedTagId": 2, "relationshipType": "broader"}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            OntologyConfigError::UnknownRelationship { .. }
        ));
    }

    #[test]
    fn test_rejects_non_positive_depth() {
        let err = from_json(r#"{"maxDerivationDepth": 0, "rules": []}"#).unwrap_err();
        assert!(matches!(err, OntologyConfigError::InvalidDepth(0)));
    }

    #[test]
    fn test_missing_file_is_a_hard_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("ontology.json")).unwrap_err();
        assert!(matches!(err, OntologyConfigError::NotFound(_)));
    }
}
