//! Gallery item entity - one ordered photo/video url inside a gallery

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gallery_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub gallery_id: i32,

    #[sea_orm(column_type = "Text")]
    pub url: String,

    /// Matches the parent gallery's kind
    #[sea_orm(column_type = "Text")]
    pub kind: String,

    /// Ordering within the gallery
    pub position: i32,

    #[sea_orm(column_type = "Text", nullable)]
    pub caption: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::gallery::Entity",
        from = "Column::GalleryId",
        to = "super::gallery::Column::Id"
    )]
    Gallery,
}

impl Related<super::gallery::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Gallery.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
