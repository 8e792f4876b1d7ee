//! Location handlers

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::AppState;
use fronteira_common::{
    db::{models::Location, CreateLocation, Repository, UpdateLocation},
    errors::{AppError, Result},
    metrics, storage,
};

use super::{multipart_error, non_empty, parse_number, read_upload, require};

#[derive(Serialize)]
pub struct LocationResponse {
    pub id: i32,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: String,
}

impl From<Location> for LocationResponse {
    fn from(location: Location) -> Self {
        Self {
            id: location.id,
            name: location.name,
            latitude: location.latitude,
            longitude: location.longitude,
            country: location.country,
            description: location.description,
            image_url: location.image_url,
            created_at: location.created_at.to_rfc3339(),
        }
    }
}

/// List all locations
pub async fn list_locations(State(state): State<AppState>) -> Result<Json<Vec<LocationResponse>>> {
    let repo = Repository::new(state.db.clone());
    let locations = repo.list_locations().await?;

    Ok(Json(locations.into_iter().map(Into::into).collect()))
}

/// Get a location by ID
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<LocationResponse>> {
    let repo = Repository::new(state.db.clone());

    let location = repo
        .find_location_by_id(id)
        .await?
        .ok_or_else(|| AppError::LocationNotFound { id: id.to_string() })?;

    Ok(Json(location.into()))
}

/// Create a location (multipart: fields plus an optional image)
pub async fn create_location(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<LocationResponse>)> {
    let max_bytes = state.config.uploads.max_upload_bytes;

    let mut name = None;
    let mut latitude = None;
    let mut longitude = None;
    let mut country = None;
    let mut description = None;
    let mut image_url = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => name = Some(field.text().await.map_err(multipart_error)?),
            "latitude" => {
                latitude = Some(parse_number::<f64>(
                    "latitude",
                    &field.text().await.map_err(multipart_error)?,
                )?)
            }
            "longitude" => {
                longitude = Some(parse_number::<f64>(
                    "longitude",
                    &field.text().await.map_err(multipart_error)?,
                )?)
            }
            "country" => country = Some(field.text().await.map_err(multipart_error)?),
            "description" => description = Some(field.text().await.map_err(multipart_error)?),
            "image" => {
                let upload = read_upload(field, max_bytes).await?;
                let stored = state
                    .uploads
                    .save(storage::LOCATIONS_DIR, &upload.file_name, &upload.bytes)
                    .await?;
                metrics::record_upload("location");
                image_url = Some(stored.relative_path);
            }
            _ => {}
        }
    }

    let input = CreateLocation {
        name: non_empty("name", require("name", name)?)?,
        latitude: require("latitude", latitude)?,
        longitude: require("longitude", longitude)?,
        country: non_empty("country", require("country", country)?)?,
        description,
        image_url,
    };

    let repo = Repository::new(state.db.clone());
    let location = repo.create_location(input).await?;

    tracing::info!(location_id = location.id, name = %location.name, "Location created");

    Ok((StatusCode::CREATED, Json(location.into())))
}

/// Update a location (JSON, partial)
pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(update): Json<UpdateLocation>,
) -> Result<Json<LocationResponse>> {
    let repo = Repository::new(state.db.clone());
    let location = repo.update_location(id, update).await?;

    tracing::info!(location_id = id, "Location updated");

    Ok(Json(location.into()))
}

/// Delete a location. Refused while galleries or documents reference it.
pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let repo = Repository::new(state.db.clone());

    let deleted = repo.delete_location(id).await?;
    if !deleted {
        return Err(AppError::LocationNotFound { id: id.to_string() });
    }

    tracing::info!(location_id = id, "Location deleted");

    Ok(StatusCode::NO_CONTENT)
}
