//! Derivation edge entity
//!
//! Provenance record linking a materialized marker back to the real
//! source marker and the ontology rule that produced it. The unique
//! keys on (source, derived) and (source, rule) make double
//! materialization a constraint violation rather than a data bug.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "derivation_edges")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub source_marker_id: i32,
    pub derived_marker_id: i32,
    pub rule_id: String,
    pub depth: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::marker::Entity",
        from = "Column::SourceMarkerId",
        to = "super::marker::Column::Id"
    )]
    SourceMarker,
    #[sea_orm(
        belongs_to = "super::marker::Entity",
        from = "Column::DerivedMarkerId",
        to = "super::marker::Column::Id"
    )]
    DerivedMarker,
}

impl ActiveModelBehavior for ActiveModel {}
