//! Collaboration file entity - an attachment stored on disk

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "collaboration_files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub collaboration_id: i32,

    /// Relative path under the upload root
    #[sea_orm(column_type = "Text")]
    pub file_url: String,

    /// Original client-side filename
    #[sea_orm(column_type = "Text")]
    pub file_name: String,

    pub file_size: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::collaboration::Entity",
        from = "Column::CollaborationId",
        to = "super::collaboration::Column::Id"
    )]
    Collaboration,
}

impl Related<super::collaboration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collaboration.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
