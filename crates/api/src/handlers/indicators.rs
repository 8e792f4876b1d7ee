//! Indicator handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use fronteira_common::{
    db::{
        models::{Indicator, IndicatorCategory},
        CreateIndicator, IndicatorFilter, Repository, UpdateIndicator,
    },
    errors::{AppError, Result},
};

use super::require;

fn parse_category(value: &str) -> Result<IndicatorCategory> {
    IndicatorCategory::parse(value).ok_or_else(|| AppError::InvalidValue {
        field: "category".to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct IndicatorListQuery {
    pub twin_city_id: Option<i32>,
    pub category: Option<String>,
}

/// Request to create an indicator
#[derive(Debug, Deserialize, Validate)]
pub struct CreateIndicatorRequest {
    pub twin_city_id: Option<i32>,
    pub category: Option<String>,

    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,

    pub study_start: Option<chrono::NaiveDate>,
    pub study_end: Option<chrono::NaiveDate>,

    #[validate(length(min = 1, max = 500))]
    pub source_title: Option<String>,
    pub source_link: Option<String>,

    pub city_a_value: Option<f64>,
    pub city_b_value: Option<f64>,

    #[validate(length(min = 1, max = 64))]
    pub unit: Option<String>,
    pub icon: Option<String>,
}

/// Request to update an indicator (partial)
#[derive(Debug, Default, Deserialize)]
pub struct UpdateIndicatorRequest {
    pub twin_city_id: Option<i32>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub study_start: Option<chrono::NaiveDate>,
    pub study_end: Option<chrono::NaiveDate>,
    pub source_title: Option<String>,
    pub source_link: Option<String>,
    pub city_a_value: Option<f64>,
    pub city_b_value: Option<f64>,
    pub unit: Option<String>,
    pub icon: Option<String>,
}

#[derive(Serialize)]
pub struct IndicatorResponse {
    pub id: i32,
    pub twin_city_id: i32,
    pub category: String,
    pub title: String,
    pub study_start: Option<String>,
    pub study_end: Option<String>,
    pub source_title: String,
    pub source_link: String,
    pub city_a_value: f64,
    pub city_b_value: f64,
    pub unit: String,
    pub icon: Option<String>,
    pub created_at: String,
}

impl From<Indicator> for IndicatorResponse {
    fn from(indicator: Indicator) -> Self {
        Self {
            id: indicator.id,
            twin_city_id: indicator.twin_city_id,
            category: indicator.category,
            title: indicator.title,
            study_start: indicator.study_start.map(|d| d.to_string()),
            study_end: indicator.study_end.map(|d| d.to_string()),
            source_title: indicator.source_title,
            source_link: indicator.source_link,
            city_a_value: indicator.city_a_value,
            city_b_value: indicator.city_b_value,
            unit: indicator.unit,
            icon: indicator.icon,
            created_at: indicator.created_at.to_rfc3339(),
        }
    }
}

/// List indicators, optionally filtered by pair and category
pub async fn list_indicators(
    State(state): State<AppState>,
    Query(query): Query<IndicatorListQuery>,
) -> Result<Json<Vec<IndicatorResponse>>> {
    let filter = IndicatorFilter {
        twin_city_id: query.twin_city_id,
        category: query.category.as_deref().map(parse_category).transpose()?,
    };

    let repo = Repository::new(state.db.clone());
    let indicators = repo.list_indicators(&filter).await?;

    Ok(Json(indicators.into_iter().map(Into::into).collect()))
}

/// Get an indicator by ID
pub async fn get_indicator(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<IndicatorResponse>> {
    let repo = Repository::new(state.db.clone());

    let indicator = repo
        .find_indicator_by_id(id)
        .await?
        .ok_or_else(|| AppError::IndicatorNotFound { id: id.to_string() })?;

    Ok(Json(indicator.into()))
}

/// Create an indicator. The referenced twin city pair must exist.
pub async fn create_indicator(
    State(state): State<AppState>,
    Json(request): Json<CreateIndicatorRequest>,
) -> Result<(StatusCode, Json<IndicatorResponse>)> {
    request.validate()?;

    let category = parse_category(&require("category", request.category)?)?;

    let input = CreateIndicator {
        twin_city_id: require("twin_city_id", request.twin_city_id)?,
        category,
        title: require("title", request.title)?,
        study_start: request.study_start,
        study_end: request.study_end,
        source_title: require("source_title", request.source_title)?,
        source_link: require("source_link", request.source_link)?,
        city_a_value: require("city_a_value", request.city_a_value)?,
        city_b_value: require("city_b_value", request.city_b_value)?,
        unit: require("unit", request.unit)?,
        icon: request.icon,
    };

    let repo = Repository::new(state.db.clone());
    let indicator = repo.create_indicator(input).await?;

    tracing::info!(
        indicator_id = indicator.id,
        twin_city_id = indicator.twin_city_id,
        category = %indicator.category,
        "Indicator created"
    );

    Ok((StatusCode::CREATED, Json(indicator.into())))
}

/// Update an indicator (JSON, partial)
pub async fn update_indicator(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateIndicatorRequest>,
) -> Result<Json<IndicatorResponse>> {
    let update = UpdateIndicator {
        twin_city_id: request.twin_city_id,
        category: request.category.as_deref().map(parse_category).transpose()?,
        title: request.title,
        study_start: request.study_start,
        study_end: request.study_end,
        source_title: request.source_title,
        source_link: request.source_link,
        city_a_value: request.city_a_value,
        city_b_value: request.city_b_value,
        unit: request.unit,
        icon: request.icon,
    };

    let repo = Repository::new(state.db.clone());
    let indicator = repo.update_indicator(id, update).await?;

    tracing::info!(indicator_id = id, "Indicator updated");

    Ok(Json(indicator.into()))
}

/// Delete an indicator
pub async fn delete_indicator(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let repo = Repository::new(state.db.clone());

    let deleted = repo.delete_indicator(id).await?;
    if !deleted {
        return Err(AppError::IndicatorNotFound { id: id.to_string() });
    }

    tracing::info!(indicator_id = id, "Indicator deleted");

    Ok(StatusCode::NO_CONTENT)
}
