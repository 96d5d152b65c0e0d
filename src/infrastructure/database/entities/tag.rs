//! Tag entity
//!
//! Local cache of the remote tag namespace. Ids are the remote server's
//! ids, so nothing here auto-increments.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::slot_definition::Entity")]
    SlotDefinition,
    #[sea_orm(has_many = "super::marker::Entity")]
    Marker,
}

impl Related<super::slot_definition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SlotDefinition.def()
    }
}

impl Related<super::marker::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Marker.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
