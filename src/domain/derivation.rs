//! Derivation candidates and the dry-run plan

use serde::{Deserialize, Serialize};
use strum::Display;

/// Label-keyed performer assignment propagated through the closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSlot {
    pub label: String,
    pub performer_id: Option<i32>,
}

/// A derivable (tag, slots) pair discovered by the closure engine.
///
/// Candidates are ephemeral: computed fresh per analysis, persisted only
/// after explicit confirmation. `source_marker_id` is always the real
/// marker the closure started from, even for chained derivations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMarkerCandidate {
    pub source_marker_id: i32,
    pub derived_tag_id: i32,
    /// Additional-tag ids carried over from the source marker.
    pub tags: Vec<i32>,
    pub slots: Vec<CandidateSlot>,
    /// 0 = direct derivation, N = N-th generation through the chain.
    pub depth: u32,
    pub rule_id: String,
}

/// Slot assignment remapped onto a target tag's definition set.
///
/// The performer id is stringified here because this shape crosses the
/// remote-server boundary, which speaks string ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedSlot {
    pub slot_definition_id: i32,
    pub performer_id: Option<String>,
}

/// Preview row: a marker with at least one underived candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerMaterialization {
    pub marker_id: i32,
    pub marker_tag: String,
    pub marker_time: String,
    /// Display names of the newly derivable tags.
    pub derived_tags: Vec<String>,
    pub new_derivations_count: usize,
    pub total_derivations_count: usize,
    pub new_candidates: Vec<DerivedMarkerCandidate>,
}

/// Preview row: every applicable rule already has a persisted edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlreadyMaterializedMarker {
    pub marker_id: i32,
    pub marker_tag: String,
    pub marker_time: String,
    pub total_derivations_count: usize,
}

/// Why a marker was left out of the plan entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    NoPrimaryTag,
    NoApplicableRules,
    /// The marker was itself materialized from another marker; its
    /// chain was computed up front and never re-expands.
    DerivedMarker,
}

/// Preview row: no ontology rule applies to this marker at any depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedMarker {
    pub marker_id: i32,
    pub marker_tag: String,
    pub reason: SkipReason,
}

/// Full dry-run analysis result for one scene.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationPlan {
    pub materializable: Vec<MarkerMaterialization>,
    pub already_materialized: Vec<AlreadyMaterializedMarker>,
    pub skipped: Vec<SkippedMarker>,
}

impl DerivationPlan {
    /// Total new derivations this plan would create.
    pub fn new_derivations_total(&self) -> usize {
        self.materializable
            .iter()
            .map(|m| m.new_derivations_count)
            .sum()
    }

    pub fn is_noop(&self) -> bool {
        self.materializable.is_empty()
    }
}
