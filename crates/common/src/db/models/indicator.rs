//! Indicator entity - a comparison metric between the two cities of a pair

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Indicator category enum
///
/// The platform's fixed thematic areas. Stored as the display string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorCategory {
    #[serde(rename = "Saúde")]
    Saude,
    #[serde(rename = "População")]
    Populacao,
    #[serde(rename = "Comércio")]
    Comercio,
    #[serde(rename = "Educação")]
    Educacao,
    #[serde(rename = "Meio Ambiente")]
    MeioAmbiente,
}

impl IndicatorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorCategory::Saude => "Saúde",
            IndicatorCategory::Populacao => "População",
            IndicatorCategory::Comercio => "Comércio",
            IndicatorCategory::Educacao => "Educação",
            IndicatorCategory::MeioAmbiente => "Meio Ambiente",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Saúde" => Some(IndicatorCategory::Saude),
            "População" => Some(IndicatorCategory::Populacao),
            "Comércio" => Some(IndicatorCategory::Comercio),
            "Educação" => Some(IndicatorCategory::Educacao),
            "Meio Ambiente" => Some(IndicatorCategory::MeioAmbiente),
            _ => None,
        }
    }
}

impl From<IndicatorCategory> for String {
    fn from(category: IndicatorCategory) -> Self {
        category.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "indicators")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub twin_city_id: i32,

    #[sea_orm(column_type = "Text")]
    pub category: String,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    /// Start of the study period the values refer to
    pub study_start: Option<Date>,

    /// End of the study period the values refer to
    pub study_end: Option<Date>,

    #[sea_orm(column_type = "Text")]
    pub source_title: String,

    #[sea_orm(column_type = "Text")]
    pub source_link: String,

    pub city_a_value: f64,

    pub city_b_value: f64,

    #[sea_orm(column_type = "Text")]
    pub unit: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub icon: Option<String>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::twin_city::Entity",
        from = "Column::TwinCityId",
        to = "super::twin_city::Column::Id"
    )]
    TwinCity,
}

impl Related<super::twin_city::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TwinCity.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        for name in ["Saúde", "População", "Comércio", "Educação", "Meio Ambiente"] {
            let parsed = IndicatorCategory::parse(name).unwrap();
            assert_eq!(parsed.as_str(), name);
        }
    }

    #[test]
    fn test_category_rejects_unknown() {
        assert!(IndicatorCategory::parse("Turismo").is_none());
        assert!(IndicatorCategory::parse("saúde").is_none());
    }
}
