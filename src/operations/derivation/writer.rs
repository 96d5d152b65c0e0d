//! Materialization write path
//!
//! Thin by design: per-candidate atomicity lives behind the
//! `MarkerStore` boundary, and the writer only sequences candidates and
//! reports what was created.

use std::sync::Arc;
use tracing::info;

use super::error::Result;
use super::sources::{MarkerStore, MaterializeOptions};
use crate::domain::{DerivedMarkerCandidate, SceneMarker};

/// Outcome of one materialization call.
#[derive(Debug, Clone, Default)]
pub struct MaterializeOutcome {
    /// Ids of the markers created, in candidate order.
    pub created_marker_ids: Vec<i32>,
}

/// Persists approved candidates through the marker store.
pub struct MaterializationWriter {
    store: Arc<dyn MarkerStore>,
    options: MaterializeOptions,
}

impl MaterializationWriter {
    pub fn new(store: Arc<dyn MarkerStore>, options: MaterializeOptions) -> Self {
        Self { store, options }
    }

    /// Persist every candidate derived from one source marker.
    ///
    /// Each candidate is one storage transaction; the batch stops at
    /// the first failure. Candidates committed before the failure stay
    /// committed — each is individually consistent, and the ledger
    /// makes the next analysis resume exactly where this one stopped.
    pub async fn materialize(
        &self,
        source: &SceneMarker,
        candidates: &[DerivedMarkerCandidate],
    ) -> Result<MaterializeOutcome> {
        let mut outcome = MaterializeOutcome::default();

        for candidate in candidates {
            let derived_marker_id = self
                .store
                .create_derived_marker(source, candidate, &self.options)
                .await?;
            info!(
                source_marker = source.id,
                derived_marker = derived_marker_id,
                rule = %candidate.rule_id,
                depth = candidate.depth,
                "materialized derived marker"
            );
            outcome.created_marker_ids.push(derived_marker_id);
        }

        Ok(outcome)
    }
}
