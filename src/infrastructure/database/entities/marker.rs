//! Marker entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "markers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub uuid: Uuid,
    pub scene_id: i32,
    pub primary_tag_id: i32,
    pub seconds: f64,
    pub end_seconds: Option<f64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tag::Entity",
        from = "Column::PrimaryTagId",
        to = "super::tag::Column::Id"
    )]
    PrimaryTag,
    #[sea_orm(has_many = "super::marker_tag::Entity")]
    MarkerTag,
    #[sea_orm(has_many = "super::marker_slot::Entity")]
    MarkerSlot,
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PrimaryTag.def()
    }
}

impl Related<super::marker_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MarkerTag.def()
    }
}

impl Related<super::marker_slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MarkerSlot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
