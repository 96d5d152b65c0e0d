//! Dry-run materialization planning
//!
//! Runs the closure engine per marker and diffs the result against the
//! derivation ledger. Pure and read-only: calling it twice with the
//! same inputs yields the same plan.

use std::collections::{HashMap, HashSet};

use super::closure::expand_marker;
use crate::domain::{
    AlreadyMaterializedMarker, DerivationPlan, MarkerMaterialization, OntologyGraph, SceneMarker,
    SkipReason, SkippedMarker,
};

/// Human-readable name for a tag id, with a stable fallback when the
/// lookup had no answer.
fn display_name(names: &HashMap<i32, String>, id: i32) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| format!("tag {id}"))
}

/// Marker time as shown in preview rows: `m:ss`, with the end time
/// appended for ranged markers. Display only.
fn format_time(seconds: f64, end_seconds: Option<f64>) -> String {
    let clock = |s: f64| {
        let total = s.max(0.0).round() as u64;
        format!("{}:{:02}", total / 60, total % 60)
    };
    match end_seconds {
        Some(end) => format!("{}-{}", clock(seconds), clock(end)),
        None => clock(seconds),
    }
}

/// Classify every marker of a batch by what the closure engine can
/// still derive from it.
///
/// - skipped: the closure finds nothing (no primary tag, or no
///   outgoing rules at any depth)
/// - already materialized: candidates exist, but every rule id is in
///   the marker's ledger set
/// - materializable: at least one candidate rule id is new
pub fn analyze(
    markers: &[SceneMarker],
    graph: &OntologyGraph,
    max_depth: u32,
    existing_by_marker: &HashMap<i32, HashSet<String>>,
    tag_names: &HashMap<i32, String>,
) -> DerivationPlan {
    let mut plan = DerivationPlan::default();
    let no_edges = HashSet::new();

    for marker in markers {
        let marker_tag = marker
            .primary_tag
            .as_ref()
            .map(|t| t.name.clone())
            .unwrap_or_default();

        if marker.primary_tag.is_none() {
            plan.skipped.push(SkippedMarker {
                marker_id: marker.id,
                marker_tag,
                reason: SkipReason::NoPrimaryTag,
            });
            continue;
        }

        let candidates = expand_marker(marker, graph, max_depth);
        if candidates.is_empty() {
            plan.skipped.push(SkippedMarker {
                marker_id: marker.id,
                marker_tag,
                reason: SkipReason::NoApplicableRules,
            });
            continue;
        }

        let existing = existing_by_marker.get(&marker.id).unwrap_or(&no_edges);
        let total_derivations_count = candidates.len();
        let new_candidates: Vec<_> = candidates
            .into_iter()
            .filter(|c| !existing.contains(&c.rule_id))
            .collect();

        let marker_time = format_time(marker.seconds, marker.end_seconds);
        if new_candidates.is_empty() {
            plan.already_materialized.push(AlreadyMaterializedMarker {
                marker_id: marker.id,
                marker_tag,
                marker_time,
                total_derivations_count,
            });
        } else {
            plan.materializable.push(MarkerMaterialization {
                marker_id: marker.id,
                marker_tag,
                marker_time,
                derived_tags: new_candidates
                    .iter()
                    .map(|c| display_name(tag_names, c.derived_tag_id))
                    .collect(),
                new_derivations_count: new_candidates.len(),
                total_derivations_count,
                new_candidates,
            });
        }
    }

    plan
}
