//! Structural slot compatibility mapping
//!
//! Used when a marker's primary tag changes (write/retag): decides
//! whether the existing performer assignments can be transplanted onto
//! the new tag's slot-definition set, and produces the transplanted
//! assignments. Distinct from the closure engine's rule-defined label
//! mapping — here compatibility is inferred by positional comparison.

use std::sync::Arc;
use tracing::{debug, warn};

use super::sources::SlotDefinitionSource;
use crate::domain::{MappedSlot, MarkerSlot};

/// Decision points the mapper reports as it works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotMappingDecision {
    /// Source marker carries no slots; nothing to map
    NoSourceSlots,
    /// Target tag has no slot-definition set
    NoTargetDefinitions { target_tag_id: i32 },
    /// Slot counts differ between source and target
    CountMismatch { source: usize, target: usize },
    /// A label was null on either side at this position
    MissingLabel { position: usize },
    /// Labels diverged at this position after sorting by order
    LabelMismatch { position: usize },
    /// Definition lookup failed; mapping cleared
    LookupFailed { target_tag_id: i32 },
    /// Full structural match
    Mapped { slots: usize },
}

/// Observer for mapper decisions.
///
/// Injectable so tests assert on decision points instead of scraping
/// log output.
pub trait SlotMappingObserver: Send + Sync {
    fn on_decision(&self, decision: &SlotMappingDecision);
}

/// Default observer: forwards every decision to tracing at debug level.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl SlotMappingObserver for TracingObserver {
    fn on_decision(&self, decision: &SlotMappingDecision) {
        debug!(?decision, "slot mapping decision");
    }
}

/// Structural slot mapper over a slot-definition source.
pub struct SlotMapper {
    definitions: Arc<dyn SlotDefinitionSource>,
    observer: Arc<dyn SlotMappingObserver>,
}

impl SlotMapper {
    pub fn new(definitions: Arc<dyn SlotDefinitionSource>) -> Self {
        Self {
            definitions,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SlotMappingObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Remap `source_slots` onto `target_tag_id`'s slot-definition set.
    ///
    /// `None` means "clear slots": empty input, a missing or empty
    /// target set, any structural mismatch, or a failed lookup. The
    /// mapper always fails toward clearing rather than keeping a
    /// possibly-wrong assignment. Compatibility requires an identical
    /// slot count and, after sorting both sides by `order`, an exact
    /// (case-sensitive, untrimmed) label match at every position.
    pub async fn map_slots(
        &self,
        source_slots: &[MarkerSlot],
        target_tag_id: i32,
    ) -> Option<Vec<MappedSlot>> {
        if source_slots.is_empty() {
            self.observer.on_decision(&SlotMappingDecision::NoSourceSlots);
            return None;
        }

        let mut target = match self.definitions.slot_definitions(target_tag_id).await {
            Ok(definitions) => definitions,
            Err(err) => {
                warn!(
                    target_tag_id,
                    %err,
                    "slot definition lookup failed, clearing slots"
                );
                self.observer
                    .on_decision(&SlotMappingDecision::LookupFailed { target_tag_id });
                return None;
            }
        };

        if target.is_empty() {
            self.observer
                .on_decision(&SlotMappingDecision::NoTargetDefinitions { target_tag_id });
            return None;
        }

        if target.len() != source_slots.len() {
            self.observer.on_decision(&SlotMappingDecision::CountMismatch {
                source: source_slots.len(),
                target: target.len(),
            });
            return None;
        }

        let mut source: Vec<&MarkerSlot> = source_slots.iter().collect();
        source.sort_by_key(|slot| slot.order);
        target.sort_by_key(|definition| definition.order);

        let mut mapped = Vec::with_capacity(target.len());
        for (position, (slot, definition)) in source.iter().zip(&target).enumerate() {
            match (&slot.label, &definition.label) {
                (Some(source_label), Some(target_label)) if source_label == target_label => {
                    mapped.push(MappedSlot {
                        slot_definition_id: definition.id,
                        performer_id: slot.performer_id.map(|id| id.to_string()),
                    });
                }
                (Some(_), Some(_)) => {
                    self.observer
                        .on_decision(&SlotMappingDecision::LabelMismatch { position });
                    return None;
                }
                _ => {
                    self.observer
                        .on_decision(&SlotMappingDecision::MissingLabel { position });
                    return None;
                }
            }
        }

        self.observer.on_decision(&SlotMappingDecision::Mapped {
            slots: mapped.len(),
        });
        Some(mapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SlotDefinition;
    use crate::operations::derivation::error::{DerivationError, Result};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    struct FakeDefinitions {
        definitions: Vec<SlotDefinition>,
        fail: bool,
    }

    #[async_trait]
    impl SlotDefinitionSource for FakeDefinitions {
        async fn slot_definitions(&self, tag_id: i32) -> Result<Vec<SlotDefinition>> {
            if self.fail {
                return Err(DerivationError::Other("lookup unavailable".to_string()));
            }
            Ok(self
                .definitions
                .iter()
                .filter(|d| d.tag_id == tag_id)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        decisions: Mutex<Vec<SlotMappingDecision>>,
    }

    impl SlotMappingObserver for RecordingObserver {
        fn on_decision(&self, decision: &SlotMappingDecision) {
            self.decisions.lock().unwrap().push(decision.clone());
        }
    }

    fn definition(id: i32, tag_id: i32, label: &str, order: i32) -> SlotDefinition {
        SlotDefinition {
            id,
            tag_id,
            label: Some(label.to_string()),
            gender_hints: Vec::new(),
            order,
        }
    }

    fn source_slot(label: &str, performer_id: Option<i32>, order: i32) -> MarkerSlot {
        MarkerSlot {
            slot_definition_id: order + 1,
            performer_id,
            label: Some(label.to_string()),
            gender_hints: Vec::new(),
            order,
        }
    }

    fn mapper(definitions: Vec<SlotDefinition>, fail: bool) -> (SlotMapper, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        let mapper = SlotMapper::new(Arc::new(FakeDefinitions { definitions, fail }))
            .with_observer(observer.clone());
        (mapper, observer)
    }

    #[tokio::test]
    async fn test_compatible_slots_are_remapped() {
        let (mapper, observer) = mapper(
            vec![
                definition(21, 2, "giver", 0),
                definition(22, 2, "receiver", 1),
            ],
            false,
        );
        let slots = vec![
            source_slot("receiver", Some(456), 1),
            source_slot("giver", Some(123), 0),
        ];

        let mapped = mapper.map_slots(&slots, 2).await.unwrap();
        assert_eq!(
            mapped,
            vec![
                MappedSlot {
                    slot_definition_id: 21,
                    performer_id: Some("123".to_string()),
                },
                MappedSlot {
                    slot_definition_id: 22,
                    performer_id: Some("456".to_string()),
                },
            ]
        );
        assert_eq!(
            observer.decisions.lock().unwrap().last(),
            Some(&SlotMappingDecision::Mapped { slots: 2 })
        );
    }

    #[tokio::test]
    async fn test_count_mismatch_clears_slots() {
        let (mapper, observer) = mapper(vec![definition(21, 2, "performer", 0)], false);
        let slots = vec![
            source_slot("giver", Some(123), 0),
            source_slot("receiver", Some(456), 1),
        ];

        assert_eq!(mapper.map_slots(&slots, 2).await, None);
        assert_eq!(
            observer.decisions.lock().unwrap().as_slice(),
            &[SlotMappingDecision::CountMismatch {
                source: 2,
                target: 1,
            }]
        );
    }

    #[tokio::test]
    async fn test_label_mismatch_invalidates_entire_mapping() {
        let (mapper, observer) = mapper(
            vec![
                definition(21, 2, "giver", 0),
                definition(22, 2, "Receiver", 1),
            ],
            false,
        );
        let slots = vec![
            source_slot("giver", Some(123), 0),
            source_slot("receiver", Some(456), 1),
        ];

        // Case-sensitive comparison: "receiver" != "Receiver".
        assert_eq!(mapper.map_slots(&slots, 2).await, None);
        assert_eq!(
            observer.decisions.lock().unwrap().last(),
            Some(&SlotMappingDecision::LabelMismatch { position: 1 })
        );
    }

    #[tokio::test]
    async fn test_null_label_invalidates_mapping() {
        let (mapper, observer) = mapper(vec![definition(21, 2, "giver", 0)], false);
        let mut slot = source_slot("giver", Some(123), 0);
        slot.label = None;

        assert_eq!(mapper.map_slots(&[slot], 2).await, None);
        assert_eq!(
            observer.decisions.lock().unwrap().last(),
            Some(&SlotMappingDecision::MissingLabel { position: 0 })
        );
    }

    #[tokio::test]
    async fn test_empty_source_slots_map_to_none() {
        let (mapper, observer) = mapper(vec![definition(21, 2, "giver", 0)], false);

        assert_eq!(mapper.map_slots(&[], 2).await, None);
        assert_eq!(
            observer.decisions.lock().unwrap().as_slice(),
            &[SlotMappingDecision::NoSourceSlots]
        );
    }

    #[tokio::test]
    async fn test_missing_target_definitions_clear_slots() {
        let (mapper, observer) = mapper(Vec::new(), false);
        let slots = vec![source_slot("giver", Some(123), 0)];

        assert_eq!(mapper.map_slots(&slots, 2).await, None);
        assert_eq!(
            observer.decisions.lock().unwrap().as_slice(),
            &[SlotMappingDecision::NoTargetDefinitions { target_tag_id: 2 }]
        );
    }

    #[tokio::test]
    async fn test_lookup_failure_fails_safe() {
        let (mapper, observer) = mapper(vec![definition(21, 2, "giver", 0)], true);
        let slots = vec![source_slot("giver", Some(123), 0)];

        assert_eq!(mapper.map_slots(&slots, 2).await, None);
        assert_eq!(
            observer.decisions.lock().unwrap().as_slice(),
            &[SlotMappingDecision::LookupFailed { target_tag_id: 2 }]
        );
    }

    #[tokio::test]
    async fn test_unassigned_performer_maps_to_none() {
        let (mapper, _observer) = mapper(vec![definition(21, 2, "giver", 0)], false);
        let slots = vec![source_slot("giver", None, 0)];

        let mapped = mapper.map_slots(&slots, 2).await.unwrap();
        assert_eq!(
            mapped,
            vec![MappedSlot {
                slot_definition_id: 21,
                performer_id: None,
            }]
        );
    }
}
