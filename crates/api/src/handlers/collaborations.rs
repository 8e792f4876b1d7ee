//! Collaboration handlers
//!
//! Public submissions arrive as multipart bodies with zero or more attached
//! files. Attachments live in the upload store; deleting a collaboration
//! removes them from disk best-effort.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::AppState;
use fronteira_common::{
    db::{
        models::{Collaboration, CollaborationFile, CollaborationStatus},
        CreateCollaboration, NewCollaborationFile, Pagination, Repository, UpdateCollaboration,
    },
    errors::{AppError, Result},
    metrics, storage,
};

use super::{multipart_error, non_empty, read_upload, require, stream_stored_file};

fn parse_status(value: &str) -> Result<CollaborationStatus> {
    CollaborationStatus::parse(value).ok_or_else(|| AppError::InvalidValue {
        field: "status".to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct CollaborationListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

/// Request to update a collaboration (partial)
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCollaborationRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct CollaborationFileResponse {
    pub id: i32,
    pub file_url: String,
    pub file_name: String,
    pub file_size: i64,
}

impl From<CollaborationFile> for CollaborationFileResponse {
    fn from(file: CollaborationFile) -> Self {
        Self {
            id: file.id,
            file_url: file.file_url,
            file_name: file.file_name,
            file_size: file.file_size,
        }
    }
}

#[derive(Serialize)]
pub struct CollaborationResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub files: Vec<CollaborationFileResponse>,
    pub created_at: String,
}

impl CollaborationResponse {
    fn new(collaboration: Collaboration, files: Vec<CollaborationFile>) -> Self {
        Self {
            id: collaboration.id,
            name: collaboration.name,
            email: collaboration.email,
            phone: collaboration.phone,
            subject: collaboration.subject,
            message: collaboration.message,
            status: collaboration.status,
            files: files.into_iter().map(Into::into).collect(),
            created_at: collaboration.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct CollaborationSummaryResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub status: String,
    pub created_at: String,
}

impl From<Collaboration> for CollaborationSummaryResponse {
    fn from(collaboration: Collaboration) -> Self {
        Self {
            id: collaboration.id,
            name: collaboration.name,
            email: collaboration.email,
            subject: collaboration.subject,
            status: collaboration.status,
            created_at: collaboration.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct CollaborationListResponse {
    pub collaborations: Vec<CollaborationSummaryResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// List collaborations, paginated, optionally filtered by status
pub async fn list_collaborations(
    State(state): State<AppState>,
    Query(query): Query<CollaborationListQuery>,
) -> Result<Json<CollaborationListResponse>> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let page = Pagination::new(query.page, query.limit);

    let repo = Repository::new(state.db.clone());
    let (collaborations, total) = repo.list_collaborations(status, page).await?;

    Ok(Json(CollaborationListResponse {
        collaborations: collaborations.into_iter().map(Into::into).collect(),
        total,
        page: page.page(),
        limit: page.limit(),
    }))
}

/// Get a collaboration with its attachments
pub async fn get_collaboration(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CollaborationResponse>> {
    let repo = Repository::new(state.db.clone());

    let (collaboration, files) = repo
        .find_collaboration_with_files(id)
        .await?
        .ok_or_else(|| AppError::CollaborationNotFound { id: id.to_string() })?;

    Ok(Json(CollaborationResponse::new(collaboration, files)))
}

/// Create a collaboration (multipart: fields plus zero or more `files`)
pub async fn create_collaboration(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CollaborationResponse>)> {
    let max_bytes = state.config.uploads.max_upload_bytes;

    let mut name = None;
    let mut email = None;
    let mut phone = None;
    let mut subject = None;
    let mut message = None;
    let mut files: Vec<NewCollaborationFile> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => name = Some(field.text().await.map_err(multipart_error)?),
            "email" => email = Some(field.text().await.map_err(multipart_error)?),
            "phone" => phone = Some(field.text().await.map_err(multipart_error)?),
            "subject" => subject = Some(field.text().await.map_err(multipart_error)?),
            "message" => message = Some(field.text().await.map_err(multipart_error)?),
            "files" => {
                let upload = read_upload(field, max_bytes).await?;
                let stored = state
                    .uploads
                    .save(storage::COLLABORATIONS_DIR, &upload.file_name, &upload.bytes)
                    .await?;
                metrics::record_upload("collaboration");
                files.push(NewCollaborationFile {
                    file_url: stored.relative_path,
                    file_name: upload.file_name,
                    file_size: stored.size,
                });
            }
            _ => {}
        }
    }

    let email = non_empty("email", require("email", email)?)?;
    if !email.validate_email() {
        return Err(AppError::Validation {
            message: format!("Invalid email address: {}", email),
            field: Some("email".to_string()),
        });
    }

    let input = CreateCollaboration {
        name: non_empty("name", require("name", name)?)?,
        email,
        phone,
        subject: non_empty("subject", require("subject", subject)?)?,
        message: non_empty("message", require("message", message)?)?,
    };

    let repo = Repository::new(state.db.clone());
    let stored_paths: Vec<String> = files.iter().map(|f| f.file_url.clone()).collect();

    match repo.create_collaboration(input, files).await {
        Ok((collaboration, files)) => {
            tracing::info!(
                collaboration_id = collaboration.id,
                files = files.len(),
                "Collaboration submitted"
            );
            Ok((
                StatusCode::CREATED,
                Json(CollaborationResponse::new(collaboration, files)),
            ))
        }
        Err(e) => {
            // The insert rolled back; drop the files it would have referenced
            for path in stored_paths {
                state.uploads.delete(&path).await;
            }
            Err(e)
        }
    }
}

/// Update a collaboration (JSON, partial; typically the review status)
pub async fn update_collaboration(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateCollaborationRequest>,
) -> Result<Json<CollaborationResponse>> {
    let update = UpdateCollaboration {
        name: request.name,
        email: request.email,
        phone: request.phone,
        subject: request.subject,
        message: request.message,
        status: request.status.as_deref().map(parse_status).transpose()?,
    };

    let repo = Repository::new(state.db.clone());
    let collaboration = repo.update_collaboration(id, update).await?;

    let files = repo
        .find_collaboration_with_files(id)
        .await?
        .map(|(_, files)| files)
        .unwrap_or_default();

    tracing::info!(collaboration_id = id, "Collaboration updated");

    Ok(Json(CollaborationResponse::new(collaboration, files)))
}

/// Delete a collaboration. Attachment files are removed from disk
/// best-effort; a failed file deletion never aborts the record deletion.
pub async fn delete_collaboration(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let repo = Repository::new(state.db.clone());

    let files = repo
        .delete_collaboration(id)
        .await?
        .ok_or_else(|| AppError::CollaborationNotFound { id: id.to_string() })?;

    for file in &files {
        state.uploads.delete(&file.file_url).await;
    }

    tracing::info!(
        collaboration_id = id,
        files = files.len(),
        "Collaboration deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Stream one attachment of a collaboration
pub async fn download_file(
    State(state): State<AppState>,
    Path((id, file_id)): Path<(i32, i32)>,
) -> Result<Response> {
    let repo = Repository::new(state.db.clone());

    let file = repo
        .find_collaboration_file(id, file_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource_type: "collaboration_file".to_string(),
            id: file_id.to_string(),
        })?;

    metrics::record_download("collaboration");

    stream_stored_file(&state.uploads, &file.file_url, &file.file_name).await
}
