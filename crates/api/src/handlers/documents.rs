//! Digital collection handlers
//!
//! Document create/update arrives as a multipart body: scalar text parts,
//! a `tags` part holding a JSON array of names, and an optional binary
//! `file` part for internal documents. The repository runs the write and
//! the tag linking in one transaction.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use fronteira_common::{
    db::{
        models::{DocumentCategory, DocumentKind},
        DocumentFilter, DocumentRecord, DocumentWrite, FileMeta, Pagination, Repository,
    },
    errors::{AppError, Result},
    metrics, storage,
};

use super::{multipart_error, non_empty, parse_number, read_upload, require, stream_stored_file};

fn parse_kind(value: &str) -> Result<DocumentKind> {
    DocumentKind::parse(value).ok_or_else(|| AppError::InvalidValue {
        field: "kind".to_string(),
        value: value.to_string(),
    })
}

fn parse_doc_category(value: &str) -> Result<DocumentCategory> {
    DocumentCategory::parse(value).ok_or_else(|| AppError::InvalidValue {
        field: "category".to_string(),
        value: value.to_string(),
    })
}

fn parse_tags(value: &str) -> Result<Vec<String>> {
    serde_json::from_str(value).map_err(|_| AppError::Validation {
        message: "tags must be a JSON array of strings".to_string(),
        field: Some("tags".to_string()),
    })
}

#[derive(Debug, Deserialize)]
pub struct DocumentListQuery {
    pub category: Option<String>,
    pub location_id: Option<i32>,
    pub twin_city_id: Option<i32>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct DocumentResponse {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    pub category: String,
    pub kind: String,
    pub file_url: String,
    pub file_type: String,
    pub file_size: i64,
    pub external_url: String,
    pub twin_city_id: i32,
    pub twin_city_name: String,
    pub location_id: Option<i32>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<DocumentRecord> for DocumentResponse {
    fn from(record: DocumentRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            author: record.author,
            publication_year: record.publication_year,
            category: record.category,
            kind: record.kind,
            file_url: record.file_url,
            file_type: record.file_type,
            file_size: record.file_size,
            external_url: record.external_url,
            twin_city_id: record.twin_city_id,
            twin_city_name: record.twin_city_name,
            location_id: record.location_id,
            tags: record.tags,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Pull the document payload out of a multipart body. A binary `file` part
/// is persisted immediately; on any later validation failure the stored
/// file is removed again.
async fn collect_document_form(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<(DocumentWrite, Option<String>)> {
    let max_bytes = state.config.uploads.max_upload_bytes;

    let mut title = None;
    let mut author = None;
    let mut publication_year = None;
    let mut category = None;
    let mut kind = None;
    let mut external_url = None;
    let mut twin_city_id = None;
    let mut location_id = None;
    let mut tags = None;
    let mut file: Option<FileMeta> = None;

    let collected: Result<()> = async {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let field_name = field.name().unwrap_or_default().to_string();
            match field_name.as_str() {
                "title" => title = Some(field.text().await.map_err(multipart_error)?),
                "author" => author = Some(field.text().await.map_err(multipart_error)?),
                "publication_year" => {
                    publication_year = Some(parse_number::<i32>(
                        "publication_year",
                        &field.text().await.map_err(multipart_error)?,
                    )?)
                }
                "category" => category = Some(field.text().await.map_err(multipart_error)?),
                "kind" => kind = Some(field.text().await.map_err(multipart_error)?),
                "external_url" => {
                    external_url = Some(field.text().await.map_err(multipart_error)?)
                }
                "twin_city_id" => {
                    twin_city_id = Some(parse_number::<i32>(
                        "twin_city_id",
                        &field.text().await.map_err(multipart_error)?,
                    )?)
                }
                "location_id" => {
                    location_id = Some(parse_number::<i32>(
                        "location_id",
                        &field.text().await.map_err(multipart_error)?,
                    )?)
                }
                "tags" => {
                    tags = Some(parse_tags(&field.text().await.map_err(multipart_error)?)?)
                }
                "file" => {
                    let upload = read_upload(field, max_bytes).await?;
                    let stored = state
                        .uploads
                        .save(storage::DOCUMENTS_DIR, &upload.file_name, &upload.bytes)
                        .await?;
                    metrics::record_upload("document");
                    file = Some(FileMeta {
                        url: stored.relative_path,
                        mime: upload.content_type,
                        size: stored.size,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
    .await;

    let uploaded_path = file.as_ref().map(|f| f.url.clone());

    let assembled = collected.and_then(|()| {
        Ok(DocumentWrite {
            title: non_empty("title", require("title", title)?)?,
            author: non_empty("author", require("author", author)?)?,
            publication_year: require("publication_year", publication_year)?,
            category: parse_doc_category(&require("category", category)?)?,
            kind: parse_kind(&require("kind", kind)?)?,
            file,
            external_url,
            twin_city_id: require("twin_city_id", twin_city_id)?,
            location_id,
            tags: tags.unwrap_or_default(),
        })
    });

    match assembled {
        Ok(write) => Ok((write, uploaded_path)),
        Err(e) => {
            if let Some(path) = uploaded_path {
                state.uploads.delete(&path).await;
            }
            Err(e)
        }
    }
}

/// List documents with combined filters and pagination
pub async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<DocumentListQuery>,
) -> Result<Json<DocumentListResponse>> {
    let filter = DocumentFilter {
        category: query
            .category
            .as_deref()
            .map(parse_doc_category)
            .transpose()?,
        location_id: query.location_id,
        twin_city_id: query.twin_city_id,
        search: query.search.filter(|s| !s.trim().is_empty()),
    };
    let page = Pagination::new(query.page, query.limit);

    let repo = Repository::new(state.db.clone());
    let (documents, total) = repo.list_documents(&filter, page).await?;

    Ok(Json(DocumentListResponse {
        documents: documents.into_iter().map(Into::into).collect(),
        total,
        page: page.page(),
        limit: page.limit(),
    }))
}

/// Get a document by ID, with its pair name and tag list
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DocumentResponse>> {
    let repo = Repository::new(state.db.clone());

    let document = repo
        .find_document(id)
        .await?
        .ok_or_else(|| AppError::DocumentNotFound { id: id.to_string() })?;

    Ok(Json(document.into()))
}

/// Create a document with its tag links (multipart)
pub async fn create_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentResponse>)> {
    let (write, uploaded_path) = collect_document_form(&state, &mut multipart).await?;

    let repo = Repository::new(state.db.clone());

    match repo.create_document(write).await {
        Ok(document) => {
            tracing::info!(
                document_id = document.id,
                kind = %document.kind,
                tags = document.tags.len(),
                "Document created"
            );
            Ok((StatusCode::CREATED, Json(document.into())))
        }
        Err(e) => {
            // The transaction rolled back; drop the stored file it would
            // have referenced
            if let Some(path) = uploaded_path {
                state.uploads.delete(&path).await;
            }
            Err(e)
        }
    }
}

/// Update a document, replacing its tag set (multipart, same shape as
/// create)
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<DocumentResponse>> {
    let repo = Repository::new(state.db.clone());

    let previous = repo
        .find_document(id)
        .await?
        .ok_or_else(|| AppError::DocumentNotFound { id: id.to_string() })?;

    let (write, uploaded_path) = collect_document_form(&state, &mut multipart).await?;

    match repo.update_document(id, write).await {
        Ok(document) => {
            // Replaced or abandoned internal file leaves the store
            if !previous.file_url.is_empty() && previous.file_url != document.file_url {
                state.uploads.delete(&previous.file_url).await;
            }

            tracing::info!(
                document_id = id,
                kind = %document.kind,
                tags = document.tags.len(),
                "Document updated"
            );
            Ok(Json(document.into()))
        }
        Err(e) => {
            if let Some(path) = uploaded_path {
                state.uploads.delete(&path).await;
            }
            Err(e)
        }
    }
}

/// Delete a document and its tag links
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let repo = Repository::new(state.db.clone());

    let document = repo
        .delete_document(id)
        .await?
        .ok_or_else(|| AppError::DocumentNotFound { id: id.to_string() })?;

    // Internal content goes with the record, best-effort
    if let Some(file_url) = document.file_url.filter(|url| !url.is_empty()) {
        state.uploads.delete(&file_url).await;
    }

    tracing::info!(document_id = id, "Document deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Stream an internal document's stored file
pub async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response> {
    let repo = Repository::new(state.db.clone());

    let document = repo
        .find_document(id)
        .await?
        .ok_or_else(|| AppError::DocumentNotFound { id: id.to_string() })?;

    if document.file_url.is_empty() {
        return Err(AppError::NotFound {
            resource_type: "document_file".to_string(),
            id: id.to_string(),
        });
    }

    let download_name = document
        .file_url
        .rsplit('/')
        .next()
        .unwrap_or("document")
        .to_string();

    metrics::record_download("document");

    stream_stored_file(&state.uploads, &document.file_url, &download_name).await
}
