//! Twin city pair handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use fronteira_common::{
    db::{models::TwinCity, CreateTwinCity, Repository, UpdateTwinCity},
    errors::{AppError, Result},
};

use super::require;

/// Request to create a twin city pair
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTwinCityRequest {
    #[validate(length(min = 1, max = 255))]
    pub city_a_name: Option<String>,
    pub city_a_latitude: Option<f64>,
    pub city_a_longitude: Option<f64>,

    #[validate(length(min = 1, max = 255))]
    pub city_b_name: Option<String>,
    pub city_b_latitude: Option<f64>,
    pub city_b_longitude: Option<f64>,

    pub description: Option<String>,
}

#[derive(Serialize)]
pub struct TwinCityResponse {
    pub id: i32,
    pub city_a_name: String,
    pub city_a_latitude: f64,
    pub city_a_longitude: f64,
    pub city_b_name: String,
    pub city_b_latitude: f64,
    pub city_b_longitude: f64,
    pub description: Option<String>,
    pub name: String,
    pub created_at: String,
}

impl From<TwinCity> for TwinCityResponse {
    fn from(twin_city: TwinCity) -> Self {
        let name = twin_city.pair_name();
        Self {
            id: twin_city.id,
            city_a_name: twin_city.city_a_name,
            city_a_latitude: twin_city.city_a_latitude,
            city_a_longitude: twin_city.city_a_longitude,
            city_b_name: twin_city.city_b_name,
            city_b_latitude: twin_city.city_b_latitude,
            city_b_longitude: twin_city.city_b_longitude,
            description: twin_city.description,
            name,
            created_at: twin_city.created_at.to_rfc3339(),
        }
    }
}

/// List all twin city pairs
pub async fn list_twin_cities(
    State(state): State<AppState>,
) -> Result<Json<Vec<TwinCityResponse>>> {
    let repo = Repository::new(state.db.clone());
    let twin_cities = repo.list_twin_cities().await?;

    Ok(Json(twin_cities.into_iter().map(Into::into).collect()))
}

/// Get a twin city pair by ID
pub async fn get_twin_city(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TwinCityResponse>> {
    let repo = Repository::new(state.db.clone());

    let twin_city = repo
        .find_twin_city_by_id(id)
        .await?
        .ok_or_else(|| AppError::TwinCityNotFound { id: id.to_string() })?;

    Ok(Json(twin_city.into()))
}

/// Create a twin city pair
pub async fn create_twin_city(
    State(state): State<AppState>,
    Json(request): Json<CreateTwinCityRequest>,
) -> Result<(StatusCode, Json<TwinCityResponse>)> {
    request.validate()?;

    let input = CreateTwinCity {
        city_a_name: require("city_a_name", request.city_a_name)?,
        city_a_latitude: require("city_a_latitude", request.city_a_latitude)?,
        city_a_longitude: require("city_a_longitude", request.city_a_longitude)?,
        city_b_name: require("city_b_name", request.city_b_name)?,
        city_b_latitude: require("city_b_latitude", request.city_b_latitude)?,
        city_b_longitude: require("city_b_longitude", request.city_b_longitude)?,
        description: request.description,
    };

    let repo = Repository::new(state.db.clone());
    let twin_city = repo.create_twin_city(input).await?;

    tracing::info!(
        twin_city_id = twin_city.id,
        pair = %twin_city.pair_name(),
        "Twin city pair created"
    );

    Ok((StatusCode::CREATED, Json(twin_city.into())))
}

/// Update a twin city pair (JSON, partial)
pub async fn update_twin_city(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(update): Json<UpdateTwinCity>,
) -> Result<Json<TwinCityResponse>> {
    let repo = Repository::new(state.db.clone());
    let twin_city = repo.update_twin_city(id, update).await?;

    tracing::info!(twin_city_id = id, "Twin city pair updated");

    Ok(Json(twin_city.into()))
}

/// Delete a twin city pair. Refused while documents or indicators
/// reference it.
pub async fn delete_twin_city(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let repo = Repository::new(state.db.clone());

    let deleted = repo.delete_twin_city(id).await?;
    if !deleted {
        return Err(AppError::TwinCityNotFound { id: id.to_string() });
    }

    tracing::info!(twin_city_id = id, "Twin city pair deleted");

    Ok(StatusCode::NO_CONTENT)
}
