//! Collaboration entity - a public submission with optional file attachments

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Collaboration review status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaborationStatus {
    Pending,
    Approved,
    Rejected,
}

impl CollaborationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaborationStatus::Pending => "pending",
            CollaborationStatus::Approved => "approved",
            CollaborationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CollaborationStatus::Pending),
            "approved" => Some(CollaborationStatus::Approved),
            "rejected" => Some(CollaborationStatus::Rejected),
            _ => None,
        }
    }
}

impl Default for CollaborationStatus {
    fn default() -> Self {
        CollaborationStatus::Pending
    }
}

impl From<CollaborationStatus> for String {
    fn from(status: CollaborationStatus) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "collaborations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub email: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub phone: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub subject: String,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::collaboration_file::Entity")]
    Files,
}

impl Related<super::collaboration_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(CollaborationStatus::parse("pending"), Some(CollaborationStatus::Pending));
        assert_eq!(CollaborationStatus::parse("approved"), Some(CollaborationStatus::Approved));
        assert_eq!(CollaborationStatus::parse("rejected"), Some(CollaborationStatus::Rejected));
        assert_eq!(CollaborationStatus::parse("archived"), None);
    }

    #[test]
    fn test_default_status() {
        assert_eq!(CollaborationStatus::default(), CollaborationStatus::Pending);
    }
}
