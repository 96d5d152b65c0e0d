//! Marker slot entity
//!
//! A performer assignment against one of the primary tag's slot
//! definitions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "marker_slots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub marker_id: i32,
    pub slot_definition_id: i32,
    pub performer_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::marker::Entity",
        from = "Column::MarkerId",
        to = "super::marker::Column::Id"
    )]
    Marker,
    #[sea_orm(
        belongs_to = "super::slot_definition::Entity",
        from = "Column::SlotDefinitionId",
        to = "super::slot_definition::Column::Id"
    )]
    SlotDefinition,
}

impl Related<super::marker::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Marker.def()
    }
}

impl Related<super::slot_definition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SlotDefinition.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
