//! Document entity - a digital-collection entry
//!
//! The `kind` discriminant decides which attribute group is populated:
//! `internal` documents carry file_url/file_type/file_size, `external`
//! documents carry external_url with the file fields zeroed. Both groups are
//! nullable columns in the same row; the split is enforced by the write path,
//! not by the schema.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether the document's content is stored by this system or hosted elsewhere
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Internal,
    External,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Internal => "internal",
            DocumentKind::External => "external",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "internal" => Some(DocumentKind::Internal),
            "external" => Some(DocumentKind::External),
            _ => None,
        }
    }
}

impl From<DocumentKind> for String {
    fn from(kind: DocumentKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Collection section the document belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentCategory {
    Books,
    Articles,
    Reports,
    Legislation,
    Maps,
    Other,
}

impl DocumentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::Books => "books",
            DocumentCategory::Articles => "articles",
            DocumentCategory::Reports => "reports",
            DocumentCategory::Legislation => "legislation",
            DocumentCategory::Maps => "maps",
            DocumentCategory::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "books" => Some(DocumentCategory::Books),
            "articles" => Some(DocumentCategory::Articles),
            "reports" => Some(DocumentCategory::Reports),
            "legislation" => Some(DocumentCategory::Legislation),
            "maps" => Some(DocumentCategory::Maps),
            "other" => Some(DocumentCategory::Other),
            _ => None,
        }
    }
}

impl From<DocumentCategory> for String {
    fn from(category: DocumentCategory) -> Self {
        category.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub author: String,

    pub publication_year: i32,

    #[sea_orm(column_type = "Text")]
    pub category: String,

    /// "internal" or "external"
    #[sea_orm(column_type = "Text")]
    pub kind: String,

    /// Relative path under the upload root; "" for external documents
    #[sea_orm(column_type = "Text", nullable)]
    pub file_url: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub file_type: Option<String>,

    /// Bytes; 0 for external documents
    pub file_size: Option<i64>,

    /// Remote location of the content; "" for internal documents
    #[sea_orm(column_type = "Text", nullable)]
    pub external_url: Option<String>,

    pub twin_city_id: i32,

    pub location_id: Option<i32>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn is_internal(&self) -> bool {
        self.kind == DocumentKind::Internal.as_str()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::twin_city::Entity",
        from = "Column::TwinCityId",
        to = "super::twin_city::Column::Id"
    )]
    TwinCity,

    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id"
    )]
    Location,

    #[sea_orm(has_many = "super::document_tag::Entity")]
    DocumentTags,
}

impl Related<super::twin_city::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TwinCity.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!(DocumentKind::parse("internal"), Some(DocumentKind::Internal));
        assert_eq!(DocumentKind::parse("external"), Some(DocumentKind::External));
        assert_eq!(DocumentKind::parse("remote"), None);
        assert_eq!(DocumentKind::parse("Internal"), None);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(DocumentCategory::parse("books"), Some(DocumentCategory::Books));
        assert_eq!(DocumentCategory::parse("maps"), Some(DocumentCategory::Maps));
        assert_eq!(DocumentCategory::parse("podcasts"), None);
    }
}
