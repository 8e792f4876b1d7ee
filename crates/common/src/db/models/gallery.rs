//! Gallery entity - a named photo or video collection attached to a location

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Gallery kind enum
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryKind {
    Photo,
    Video,
}

impl GalleryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GalleryKind::Photo => "photo",
            GalleryKind::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(GalleryKind::Photo),
            "video" => Some(GalleryKind::Video),
            _ => None,
        }
    }
}

impl From<GalleryKind> for String {
    fn from(kind: GalleryKind) -> Self {
        kind.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "galleries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub location_id: i32,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    /// "photo" or "video"; items must match
    #[sea_orm(column_type = "Text")]
    pub kind: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id"
    )]
    Location,

    #[sea_orm(has_many = "super::gallery_item::Entity")]
    Items,
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::gallery_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!(GalleryKind::parse("photo"), Some(GalleryKind::Photo));
        assert_eq!(GalleryKind::parse("video"), Some(GalleryKind::Video));
        assert_eq!(GalleryKind::parse("audio"), None);
    }
}
