//! Bounded transitive-closure expansion over the tag ontology
//!
//! Pure and synchronous: a closure run is a function of the marker, the
//! graph and the depth bound, with no I/O and no shared state. Batch
//! callers can therefore expand markers independently.

use std::collections::HashSet;

use crate::domain::{
    CandidateSlot, DerivedMarkerCandidate, OntologyGraph, OntologyRule, SceneMarker,
};

/// One frontier entry: a tag plus the slot assignments inherited from
/// the chain that reached it.
#[derive(Debug, Clone)]
struct FrontierNode {
    tag_id: i32,
    slots: Vec<CandidateSlot>,
}

/// Expand one marker into every derivable (tag, slots) pair.
///
/// Multi-pass BFS: pass N derives depth-N candidates from the frontier
/// left by pass N-1. Each rule edge fires at most once per run (the
/// visited-edge set), and `max_depth` caps the pass count independently
/// of that dedup, so a misconfigured cycle terminates either way.
///
/// When the same derived tag is reachable through different edges, the
/// first edge seen (pass order, then rule input order) supplies the
/// slot assignments its descendants inherit; the other edges still emit
/// their own candidates.
///
/// A marker with no primary tag, or whose primary tag has no outgoing
/// rules, expands to nothing. That is a policy outcome, not an error.
pub fn expand_marker(
    marker: &SceneMarker,
    graph: &OntologyGraph,
    max_depth: u32,
) -> Vec<DerivedMarkerCandidate> {
    let Some(primary) = marker.primary_tag.as_ref() else {
        return Vec::new();
    };

    let carried_tags = marker.tag_ids();

    let mut frontier = vec![FrontierNode {
        tag_id: primary.id,
        slots: marker
            .slots
            .iter()
            .filter_map(|slot| {
                slot.label.as_ref().map(|label| CandidateSlot {
                    label: label.clone(),
                    performer_id: slot.performer_id,
                })
            })
            .collect(),
    }];

    let mut fired: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();

    for depth in 0..max_depth {
        let mut next = Vec::new();

        for node in &frontier {
            for rule in graph.rules_from(node.tag_id) {
                let rule_id = rule.rule_id();
                if !fired.insert(rule_id.clone()) {
                    continue;
                }

                let slots = apply_slot_mapping(rule, &node.slots);
                candidates.push(DerivedMarkerCandidate {
                    source_marker_id: marker.id,
                    derived_tag_id: rule.derived_tag_id,
                    tags: carried_tags.clone(),
                    slots: slots.clone(),
                    depth,
                    rule_id,
                });
                next.push(FrontierNode {
                    tag_id: rule.derived_tag_id,
                    slots,
                });
            }
        }

        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    candidates
}

/// Carry assignments across the rule's explicit label mapping.
///
/// Source slots the mapping does not mention are dropped; mapping
/// entries with no matching source label are silently omitted.
fn apply_slot_mapping(rule: &OntologyRule, slots: &[CandidateSlot]) -> Vec<CandidateSlot> {
    rule.slot_mapping
        .iter()
        .filter_map(|entry| {
            slots
                .iter()
                .find(|slot| slot.label == entry.source_label)
                .map(|slot| CandidateSlot {
                    label: entry.derived_label.clone(),
                    performer_id: slot.performer_id,
                })
        })
        .collect()
}
