//! Twin city entity - a cross-border pair of named points
//!
//! Referenced by documents and indicators. Deletion is refused while
//! dependents exist (restrict policy, enforced in the repository).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "twin_cities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub city_a_name: String,

    pub city_a_latitude: f64,

    pub city_a_longitude: f64,

    #[sea_orm(column_type = "Text")]
    pub city_b_name: String,

    pub city_b_latitude: f64,

    pub city_b_longitude: f64,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub created_at: DateTimeUtc,
}

impl Model {
    /// Display name of the pair, as exposed on documents
    pub fn pair_name(&self) -> String {
        format!("{} - {}", self.city_a_name, self.city_b_name)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::document::Entity")]
    Documents,

    #[sea_orm(has_many = "super::indicator::Entity")]
    Indicators,
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl Related<super::indicator::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Indicators.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_name() {
        let city = Model {
            id: 5,
            city_a_name: "Oiapoque".into(),
            city_a_latitude: 3.84,
            city_a_longitude: -51.83,
            city_b_name: "Saint-Georges".into(),
            city_b_latitude: 3.89,
            city_b_longitude: -51.80,
            description: None,
            created_at: chrono::Utc::now(),
        };
        assert_eq!(city.pair_name(), "Oiapoque - Saint-Georges");
    }
}
