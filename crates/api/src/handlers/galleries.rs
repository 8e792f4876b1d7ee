//! Gallery handlers

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
        models::{Gallery, GalleryItem, GalleryKind},
        CreateGallery, GalleryFilter, GalleryItemInput, Repository, UpdateGallery,
    },
    errors::{AppError, Result},
};

use super::require;

fn parse_kind(value: &str) -> Result<GalleryKind> {
    GalleryKind::parse(value).ok_or_else(|| AppError::InvalidValue {
        field: "kind".to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct GalleryListQuery {
    pub location_id: Option<i32>,
    pub kind: Option<String>,
}

/// Request to create a gallery with its items
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGalleryRequest {
    pub location_id: Option<i32>,

    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,

    pub kind: Option<String>,
    pub description: Option<String>,

    #[serde(default)]
    pub items: Vec<GalleryItemInput>,
}

/// Request to update a gallery (partial; items replace the full set)
#[derive(Debug, Default, Deserialize)]
pub struct UpdateGalleryRequest {
    pub title: Option<String>,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub items: Option<Vec<GalleryItemInput>>,
}

#[derive(Serialize)]
pub struct GalleryItemResponse {
    pub id: i32,
    pub url: String,
    pub kind: String,
    pub position: i32,
    pub caption: Option<String>,
}

impl From<GalleryItem> for GalleryItemResponse {
    fn from(item: GalleryItem) -> Self {
        Self {
            id: item.id,
            url: item.url,
            kind: item.kind,
            position: item.position,
            caption: item.caption,
        }
    }
}

#[derive(Serialize)]
pub struct GalleryResponse {
    pub id: i32,
    pub location_id: i32,
    pub title: String,
    pub kind: String,
    pub description: Option<String>,
    pub items: Vec<GalleryItemResponse>,
    pub created_at: String,
}

impl GalleryResponse {
    fn new(gallery: Gallery, items: Vec<GalleryItem>) -> Self {
        Self {
            id: gallery.id,
            location_id: gallery.location_id,
            title: gallery.title,
            kind: gallery.kind,
            description: gallery.description,
            items: items.into_iter().map(Into::into).collect(),
            created_at: gallery.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct GallerySummaryResponse {
    pub id: i32,
    pub location_id: i32,
    pub title: String,
    pub kind: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<Gallery> for GallerySummaryResponse {
    fn from(gallery: Gallery) -> Self {
        Self {
            id: gallery.id,
            location_id: gallery.location_id,
            title: gallery.title,
            kind: gallery.kind,
            description: gallery.description,
            created_at: gallery.created_at.to_rfc3339(),
        }
    }
}

/// List galleries, optionally filtered by location and kind
pub async fn list_galleries(
    State(state): State<AppState>,
    Query(query): Query<GalleryListQuery>,
) -> Result<Json<Vec<GallerySummaryResponse>>> {
    let filter = GalleryFilter {
        location_id: query.location_id,
        kind: query.kind.as_deref().map(parse_kind).transpose()?,
    };

    let repo = Repository::new(state.db.clone());
    let galleries = repo.list_galleries(&filter).await?;

    Ok(Json(galleries.into_iter().map(Into::into).collect()))
}

/// Get a gallery with its ordered items
pub async fn get_gallery(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GalleryResponse>> {
    let repo = Repository::new(state.db.clone());

    let (gallery, items) = repo
        .find_gallery_with_items(id)
        .await?
        .ok_or_else(|| AppError::GalleryNotFound { id: id.to_string() })?;

    Ok(Json(GalleryResponse::new(gallery, items)))
}

/// Create a gallery. The referenced location must exist.
pub async fn create_gallery(
    State(state): State<AppState>,
    Json(request): Json<CreateGalleryRequest>,
) -> Result<(StatusCode, Json<GalleryResponse>)> {
    request.validate()?;

    let input = CreateGallery {
        location_id: require("location_id", request.location_id)?,
        title: require("title", request.title)?,
        kind: parse_kind(&require("kind", request.kind)?)?,
        description: request.description,
        items: request.items,
    };

    let repo = Repository::new(state.db.clone());
    let (gallery, items) = repo.create_gallery(input).await?;

    tracing::info!(
        gallery_id = gallery.id,
        location_id = gallery.location_id,
        kind = %gallery.kind,
        items = items.len(),
        "Gallery created"
    );

    Ok((StatusCode::CREATED, Json(GalleryResponse::new(gallery, items))))
}

/// Update a gallery (JSON, partial; an items array replaces all items)
pub async fn update_gallery(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateGalleryRequest>,
) -> Result<Json<GalleryResponse>> {
    let update = UpdateGallery {
        title: request.title,
        kind: request.kind.as_deref().map(parse_kind).transpose()?,
        description: request.description,
        items: request.items,
    };

    let repo = Repository::new(state.db.clone());
    let (gallery, items) = repo.update_gallery(id, update).await?;

    tracing::info!(gallery_id = id, "Gallery updated");

    Ok(Json(GalleryResponse::new(gallery, items)))
}

/// Delete a gallery and its items
pub async fn delete_gallery(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let repo = Repository::new(state.db.clone());

    let deleted = repo.delete_gallery(id).await?;
    if !deleted {
        return Err(AppError::GalleryNotFound { id: id.to_string() });
    }

    tracing::info!(gallery_id = id, "Gallery deleted");

    Ok(StatusCode::NO_CONTENT)
}
