//! Tag entity
//!
//! Tags are created lazily on document writes (looked up by exact name,
//! inserted only if absent) and never deleted. The name column uses a binary
//! collation so lookups are case-sensitive.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::document_tag::Entity")]
    DocumentTags,
}

impl Related<super::document_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DocumentTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
