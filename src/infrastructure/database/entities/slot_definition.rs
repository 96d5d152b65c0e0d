//! Slot definition entity
//!
//! One named role within a tag's slot set. `label` is nullable: the
//! remote server allows unlabeled slots, and the mappers treat a null
//! label as unmatchable rather than as an error.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "slot_definitions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tag_id: i32,
    pub label: Option<String>,
    pub gender_hints: Json,
    pub display_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tag::Entity",
        from = "Column::TagId",
        to = "super::tag::Column::Id"
    )]
    Tag,
    #[sea_orm(has_many = "super::marker_slot::Entity")]
    MarkerSlot,
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tag.def()
    }
}

impl Related<super::marker_slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MarkerSlot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
