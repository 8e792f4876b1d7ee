//! Location entity - a named point of interest

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "locations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    pub latitude: f64,

    pub longitude: f64,

    #[sea_orm(column_type = "Text")]
    pub country: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Relative path under the upload root
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::gallery::Entity")]
    Galleries,

    #[sea_orm(has_many = "super::document::Entity")]
    Documents,
}

impl Related<super::gallery::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Galleries.def()
    }
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
