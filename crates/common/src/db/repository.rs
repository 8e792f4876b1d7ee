//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling and transaction support.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbBackend, EntityTrait, FromQueryResult, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, Set, Statement, TransactionTrait, Value,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Pagination
// ============================================================================

/// Page/limit pair with the service-wide clamping rules applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u64,
    limit: u64,
}

impl Pagination {
    /// Build from raw query-string values: page below 1 becomes 1, a missing
    /// or non-positive limit becomes the default, and the limit is capped.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1) as u64;
        let limit = match limit {
            Some(l) if l >= 1 => (l as u64).min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        };
        Self { page, limit }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }

    /// Zero-based page index for the SeaORM paginator
    pub fn page_index(&self) -> u64 {
        self.page - 1
    }
}

// ============================================================================
// Input types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLocation {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub country: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTwinCity {
    pub city_a_name: String,
    pub city_a_latitude: f64,
    pub city_a_longitude: f64,
    pub city_b_name: String,
    pub city_b_latitude: f64,
    pub city_b_longitude: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTwinCity {
    pub city_a_name: Option<String>,
    pub city_a_latitude: Option<f64>,
    pub city_a_longitude: Option<f64>,
    pub city_b_name: Option<String>,
    pub city_b_latitude: Option<f64>,
    pub city_b_longitude: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateIndicator {
    pub twin_city_id: i32,
    pub category: IndicatorCategory,
    pub title: String,
    pub study_start: Option<chrono::NaiveDate>,
    pub study_end: Option<chrono::NaiveDate>,
    pub source_title: String,
    pub source_link: String,
    pub city_a_value: f64,
    pub city_b_value: f64,
    pub unit: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateIndicator {
    pub twin_city_id: Option<i32>,
    pub category: Option<IndicatorCategory>,
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

#[derive(Debug, Clone, Default)]
pub struct IndicatorFilter {
    pub twin_city_id: Option<i32>,
    pub category: Option<IndicatorCategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GalleryItemInput {
    pub url: String,
    pub caption: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateGallery {
    pub location_id: i32,
    pub title: String,
    pub kind: GalleryKind,
    pub description: Option<String>,
    pub items: Vec<GalleryItemInput>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateGallery {
    pub title: Option<String>,
    pub kind: Option<GalleryKind>,
    pub description: Option<String>,
    /// When present, replaces all items
    pub items: Option<Vec<GalleryItemInput>>,
}

#[derive(Debug, Clone, Default)]
pub struct GalleryFilter {
    pub location_id: Option<i32>,
    pub kind: Option<GalleryKind>,
}

#[derive(Debug, Clone)]
pub struct CreateCollaboration {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCollaboration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub status: Option<CollaborationStatus>,
}

/// A stored attachment to link to a collaboration
#[derive(Debug, Clone)]
pub struct NewCollaborationFile {
    pub file_url: String,
    pub file_name: String,
    pub file_size: i64,
}

/// A file already persisted to the upload store
#[derive(Debug, Clone)]
pub struct FileMeta {
    /// Relative path under the upload root
    pub url: String,
    pub mime: String,
    pub size: i64,
}

/// Full payload of a document create or update
#[derive(Debug, Clone)]
pub struct DocumentWrite {
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    pub category: DocumentCategory,
    pub kind: DocumentKind,
    /// Freshly uploaded file, for internal documents
    pub file: Option<FileMeta>,
    pub external_url: Option<String>,
    pub twin_city_id: i32,
    pub location_id: Option<i32>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub category: Option<DocumentCategory>,
    pub location_id: Option<i32>,
    pub twin_city_id: Option<i32>,
    pub search: Option<String>,
}

// ============================================================================
// Document query results
// ============================================================================

/// Full document as returned by the read paths: row fields plus the joined
/// pair name and the aggregated tag list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
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
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, FromQueryResult)]
struct DocumentRow {
    id: i32,
    title: String,
    author: String,
    publication_year: i32,
    category: String,
    kind: String,
    file_url: Option<String>,
    file_type: Option<String>,
    file_size: Option<i64>,
    external_url: Option<String>,
    twin_city_id: i32,
    twin_city_name: String,
    location_id: Option<i32>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    tag_names: Option<String>,
}

impl From<DocumentRow> for DocumentRecord {
    fn from(row: DocumentRow) -> Self {
        let tags = row
            .tag_names
            .map(|names| {
                names
                    .split(',')
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: row.id,
            title: row.title,
            author: row.author,
            publication_year: row.publication_year,
            category: row.category,
            kind: row.kind,
            file_url: row.file_url.unwrap_or_default(),
            file_type: row.file_type.unwrap_or_default(),
            file_size: row.file_size.unwrap_or_default(),
            external_url: row.external_url.unwrap_or_default(),
            twin_city_id: row.twin_city_id,
            twin_city_name: row.twin_city_name,
            location_id: row.location_id,
            tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    total: i64,
}

/// Shared SELECT for the document read paths: one row per document with the
/// joined pair name and a comma-aggregated tag list.
const DOCUMENT_SELECT: &str = "\
SELECT d.id, d.title, d.author, d.publication_year, d.category, d.kind, \
d.file_url, d.file_type, d.file_size, d.external_url, \
d.twin_city_id, d.location_id, d.created_at, d.updated_at, \
CONCAT(tc.city_a_name, ' - ', tc.city_b_name) AS twin_city_name, \
GROUP_CONCAT(t.name ORDER BY t.name SEPARATOR ',') AS tag_names \
FROM documents d \
INNER JOIN twin_cities tc ON tc.id = d.twin_city_id \
LEFT JOIN document_tags dt ON dt.document_id = d.id \
LEFT JOIN tags t ON t.id = dt.tag_id";

const DOCUMENT_GROUP_BY: &str = " GROUP BY d.id, tc.city_a_name, tc.city_b_name";

/// Build the WHERE clause (and its bind values) shared by the document list
/// and count queries. Returns an empty string when no filter applies.
fn document_where_clause(filter: &DocumentFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(category) = filter.category {
        clauses.push("d.category = ?".to_string());
        values.push(category.as_str().into());
    }

    if let Some(location_id) = filter.location_id {
        clauses.push("d.location_id = ?".to_string());
        values.push(location_id.into());
    }

    if let Some(twin_city_id) = filter.twin_city_id {
        clauses.push("d.twin_city_id = ?".to_string());
        values.push(twin_city_id.into());
    }

    if let Some(ref search) = filter.search {
        // Tag matches go through EXISTS so the WHERE does not thin out the
        // aggregated tag list of matching documents.
        clauses.push(
            "(d.title LIKE ? OR d.author LIKE ? OR EXISTS (\
             SELECT 1 FROM document_tags dt2 \
             INNER JOIN tags t2 ON t2.id = dt2.tag_id \
             WHERE dt2.document_id = d.id AND t2.name LIKE ?))"
                .to_string(),
        );
        let pattern = format!("%{}%", search);
        values.push(pattern.clone().into());
        values.push(pattern.clone().into());
        values.push(pattern.into());
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

/// Decide the stored file/external fields for a document write.
///
/// External documents require an external url and get the file fields
/// zeroed; internal documents require either a fresh upload or, on update,
/// an already-stored file to fall back to.
fn resolve_file_fields(
    kind: DocumentKind,
    file: Option<&FileMeta>,
    external_url: Option<&str>,
    existing: Option<&Document>,
) -> Result<(String, String, i64, String)> {
    match kind {
        DocumentKind::External => {
            let url = external_url.map(str::trim).unwrap_or_default();
            if url.is_empty() {
                return Err(AppError::MissingField {
                    field: "external_url".to_string(),
                });
            }
            Ok((String::new(), String::new(), 0, url.to_string()))
        }
        DocumentKind::Internal => {
            if let Some(file) = file {
                return Ok((file.url.clone(), file.mime.clone(), file.size, String::new()));
            }
            // On update an internal document may keep its stored file
            if let Some(doc) = existing {
                let stored = doc.file_url.clone().unwrap_or_default();
                if !stored.is_empty() {
                    return Ok((
                        stored,
                        doc.file_type.clone().unwrap_or_default(),
                        doc.file_size.unwrap_or_default(),
                        String::new(),
                    ));
                }
            }
            Err(AppError::MissingField {
                field: "file".to_string(),
            })
        }
    }
}

/// Trim, drop empties, and dedup tag names while preserving request order
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_string()))
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Merge helpers for partial updates
// ============================================================================

fn merge_location(existing: Location, update: UpdateLocation) -> LocationActiveModel {
    let mut model = existing.into_active_model();
    if let Some(name) = update.name {
        model.name = Set(name);
    }
    if let Some(latitude) = update.latitude {
        model.latitude = Set(latitude);
    }
    if let Some(longitude) = update.longitude {
        model.longitude = Set(longitude);
    }
    if let Some(country) = update.country {
        model.country = Set(country);
    }
    if let Some(description) = update.description {
        model.description = Set(Some(description));
    }
    if let Some(image_url) = update.image_url {
        model.image_url = Set(Some(image_url));
    }
    model
}

fn merge_twin_city(existing: TwinCity, update: UpdateTwinCity) -> TwinCityActiveModel {
    let mut model = existing.into_active_model();
    if let Some(name) = update.city_a_name {
        model.city_a_name = Set(name);
    }
    if let Some(latitude) = update.city_a_latitude {
        model.city_a_latitude = Set(latitude);
    }
    if let Some(longitude) = update.city_a_longitude {
        model.city_a_longitude = Set(longitude);
    }
    if let Some(name) = update.city_b_name {
        model.city_b_name = Set(name);
    }
    if let Some(latitude) = update.city_b_latitude {
        model.city_b_latitude = Set(latitude);
    }
    if let Some(longitude) = update.city_b_longitude {
        model.city_b_longitude = Set(longitude);
    }
    if let Some(description) = update.description {
        model.description = Set(Some(description));
    }
    model
}

fn merge_indicator(existing: Indicator, update: UpdateIndicator) -> IndicatorActiveModel {
    let mut model = existing.into_active_model();
    if let Some(twin_city_id) = update.twin_city_id {
        model.twin_city_id = Set(twin_city_id);
    }
    if let Some(category) = update.category {
        model.category = Set(category.as_str().to_string());
    }
    if let Some(title) = update.title {
        model.title = Set(title);
    }
    if let Some(study_start) = update.study_start {
        model.study_start = Set(Some(study_start));
    }
    if let Some(study_end) = update.study_end {
        model.study_end = Set(Some(study_end));
    }
    if let Some(source_title) = update.source_title {
        model.source_title = Set(source_title);
    }
    if let Some(source_link) = update.source_link {
        model.source_link = Set(source_link);
    }
    if let Some(value) = update.city_a_value {
        model.city_a_value = Set(value);
    }
    if let Some(value) = update.city_b_value {
        model.city_b_value = Set(value);
    }
    if let Some(unit) = update.unit {
        model.unit = Set(unit);
    }
    if let Some(icon) = update.icon {
        model.icon = Set(Some(icon));
    }
    model
}

fn merge_collaboration(
    existing: Collaboration,
    update: UpdateCollaboration,
) -> CollaborationActiveModel {
    let mut model = existing.into_active_model();
    if let Some(name) = update.name {
        model.name = Set(name);
    }
    if let Some(email) = update.email {
        model.email = Set(email);
    }
    if let Some(phone) = update.phone {
        model.phone = Set(Some(phone));
    }
    if let Some(subject) = update.subject {
        model.subject = Set(subject);
    }
    if let Some(message) = update.message {
        model.message = Set(message);
    }
    if let Some(status) = update.status {
        model.status = Set(status.as_str().to_string());
    }
    model
}

// ============================================================================
// Repository
// ============================================================================

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Location Operations
    // ========================================================================

    pub async fn list_locations(&self) -> Result<Vec<Location>> {
        LocationEntity::find()
            .order_by_asc(LocationColumn::Name)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_location_by_id(&self, id: i32) -> Result<Option<Location>> {
        LocationEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn create_location(&self, input: CreateLocation) -> Result<Location> {
        let location = LocationActiveModel {
            id: NotSet,
            name: Set(input.name),
            latitude: Set(input.latitude),
            longitude: Set(input.longitude),
            country: Set(input.country),
            description: Set(input.description),
            image_url: Set(input.image_url),
            created_at: Set(chrono::Utc::now()),
        };

        location.insert(self.conn()).await.map_err(Into::into)
    }

    pub async fn update_location(&self, id: i32, update: UpdateLocation) -> Result<Location> {
        let existing = self
            .find_location_by_id(id)
            .await?
            .ok_or_else(|| AppError::LocationNotFound { id: id.to_string() })?;

        merge_location(existing, update)
            .update(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Delete a location. Refused while galleries or documents reference it.
    pub async fn delete_location(&self, id: i32) -> Result<bool> {
        let galleries = GalleryEntity::find()
            .filter(GalleryColumn::LocationId.eq(id))
            .count(self.conn())
            .await?;
        let documents = DocumentEntity::find()
            .filter(DocumentColumn::LocationId.eq(id))
            .count(self.conn())
            .await?;

        if galleries + documents > 0 {
            return Err(AppError::ResourceInUse {
                resource_type: "location".to_string(),
                id: id.to_string(),
                dependents: format!("{} galleries, {} documents", galleries, documents),
            });
        }

        let result = LocationEntity::delete_by_id(id).exec(self.conn()).await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Twin City Operations
    // ========================================================================

    pub async fn list_twin_cities(&self) -> Result<Vec<TwinCity>> {
        TwinCityEntity::find()
            .order_by_desc(TwinCityColumn::CreatedAt)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_twin_city_by_id(&self, id: i32) -> Result<Option<TwinCity>> {
        TwinCityEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn create_twin_city(&self, input: CreateTwinCity) -> Result<TwinCity> {
        let twin_city = TwinCityActiveModel {
            id: NotSet,
            city_a_name: Set(input.city_a_name),
            city_a_latitude: Set(input.city_a_latitude),
            city_a_longitude: Set(input.city_a_longitude),
            city_b_name: Set(input.city_b_name),
            city_b_latitude: Set(input.city_b_latitude),
            city_b_longitude: Set(input.city_b_longitude),
            description: Set(input.description),
            created_at: Set(chrono::Utc::now()),
        };

        twin_city.insert(self.conn()).await.map_err(Into::into)
    }

    pub async fn update_twin_city(&self, id: i32, update: UpdateTwinCity) -> Result<TwinCity> {
        let existing = self
            .find_twin_city_by_id(id)
            .await?
            .ok_or_else(|| AppError::TwinCityNotFound { id: id.to_string() })?;

        merge_twin_city(existing, update)
            .update(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Delete a twin city pair. Refused while documents or indicators
    /// reference it.
    pub async fn delete_twin_city(&self, id: i32) -> Result<bool> {
        let documents = DocumentEntity::find()
            .filter(DocumentColumn::TwinCityId.eq(id))
            .count(self.conn())
            .await?;
        let indicators = IndicatorEntity::find()
            .filter(IndicatorColumn::TwinCityId.eq(id))
            .count(self.conn())
            .await?;

        if documents + indicators > 0 {
            return Err(AppError::ResourceInUse {
                resource_type: "twin_city".to_string(),
                id: id.to_string(),
                dependents: format!("{} documents, {} indicators", documents, indicators),
            });
        }

        let result = TwinCityEntity::delete_by_id(id).exec(self.conn()).await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Indicator Operations
    // ========================================================================

    pub async fn list_indicators(&self, filter: &IndicatorFilter) -> Result<Vec<Indicator>> {
        let mut query = IndicatorEntity::find();

        if let Some(twin_city_id) = filter.twin_city_id {
            query = query.filter(IndicatorColumn::TwinCityId.eq(twin_city_id));
        }
        if let Some(category) = filter.category {
            query = query.filter(IndicatorColumn::Category.eq(category.as_str()));
        }

        query
            .order_by_asc(IndicatorColumn::Category)
            .order_by_desc(IndicatorColumn::CreatedAt)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_indicator_by_id(&self, id: i32) -> Result<Option<Indicator>> {
        IndicatorEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn create_indicator(&self, input: CreateIndicator) -> Result<Indicator> {
        self.require_twin_city(input.twin_city_id).await?;

        let indicator = IndicatorActiveModel {
            id: NotSet,
            twin_city_id: Set(input.twin_city_id),
            category: Set(input.category.as_str().to_string()),
            title: Set(input.title),
            study_start: Set(input.study_start),
            study_end: Set(input.study_end),
            source_title: Set(input.source_title),
            source_link: Set(input.source_link),
            city_a_value: Set(input.city_a_value),
            city_b_value: Set(input.city_b_value),
            unit: Set(input.unit),
            icon: Set(input.icon),
            created_at: Set(chrono::Utc::now()),
        };

        indicator.insert(self.conn()).await.map_err(Into::into)
    }

    pub async fn update_indicator(&self, id: i32, update: UpdateIndicator) -> Result<Indicator> {
        let existing = self
            .find_indicator_by_id(id)
            .await?
            .ok_or_else(|| AppError::IndicatorNotFound { id: id.to_string() })?;

        if let Some(twin_city_id) = update.twin_city_id {
            self.require_twin_city(twin_city_id).await?;
        }

        merge_indicator(existing, update)
            .update(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn delete_indicator(&self, id: i32) -> Result<bool> {
        let result = IndicatorEntity::delete_by_id(id).exec(self.conn()).await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Gallery Operations
    // ========================================================================

    pub async fn list_galleries(&self, filter: &GalleryFilter) -> Result<Vec<Gallery>> {
        let mut query = GalleryEntity::find();

        if let Some(location_id) = filter.location_id {
            query = query.filter(GalleryColumn::LocationId.eq(location_id));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(GalleryColumn::Kind.eq(kind.as_str()));
        }

        query
            .order_by_desc(GalleryColumn::CreatedAt)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_gallery_with_items(
        &self,
        id: i32,
    ) -> Result<Option<(Gallery, Vec<GalleryItem>)>> {
        let Some(gallery) = GalleryEntity::find_by_id(id).one(self.conn()).await? else {
            return Ok(None);
        };

        let items = GalleryItemEntity::find()
            .filter(GalleryItemColumn::GalleryId.eq(id))
            .order_by_asc(GalleryItemColumn::Position)
            .all(self.conn())
            .await?;

        Ok(Some((gallery, items)))
    }

    pub async fn create_gallery(
        &self,
        input: CreateGallery,
    ) -> Result<(Gallery, Vec<GalleryItem>)> {
        let location = self.find_location_by_id(input.location_id).await?;
        if location.is_none() {
            return Err(AppError::LocationNotFound {
                id: input.location_id.to_string(),
            });
        }

        let txn = self.conn().begin().await?;

        let result: Result<i32> = async {
            let gallery = GalleryActiveModel {
                id: NotSet,
                location_id: Set(input.location_id),
                title: Set(input.title.clone()),
                kind: Set(input.kind.as_str().to_string()),
                description: Set(input.description.clone()),
                created_at: Set(chrono::Utc::now()),
            }
            .insert(&txn)
            .await?;

            replace_gallery_items(&txn, gallery.id, input.kind, &input.items).await?;

            Ok(gallery.id)
        }
        .await;

        match result {
            Ok(id) => {
                txn.commit().await?;
                self.find_gallery_with_items(id).await?.ok_or_else(|| {
                    AppError::Internal {
                        message: "gallery missing after insert".to_string(),
                    }
                })
            }
            Err(e) => {
                txn.rollback().await?;
                Err(e)
            }
        }
    }

    pub async fn update_gallery(
        &self,
        id: i32,
        update: UpdateGallery,
    ) -> Result<(Gallery, Vec<GalleryItem>)> {
        let Some((existing, _)) = self.find_gallery_with_items(id).await? else {
            return Err(AppError::GalleryNotFound { id: id.to_string() });
        };

        let kind = update
            .kind
            .or_else(|| GalleryKind::parse(&existing.kind))
            .unwrap_or(GalleryKind::Photo);

        let txn = self.conn().begin().await?;

        let result: Result<()> = async {
            let mut model = existing.into_active_model();
            if let Some(title) = update.title {
                model.title = Set(title);
            }
            if let Some(kind) = update.kind {
                model.kind = Set(kind.as_str().to_string());
            }
            if let Some(description) = update.description {
                model.description = Set(Some(description));
            }
            model.update(&txn).await?;

            if let Some(ref items) = update.items {
                replace_gallery_items(&txn, id, kind, items).await?;
            } else if update.kind.is_some() {
                // Items always carry the parent's kind
                GalleryItemEntity::update_many()
                    .col_expr(
                        GalleryItemColumn::Kind,
                        sea_orm::sea_query::Expr::value(kind.as_str()),
                    )
                    .filter(GalleryItemColumn::GalleryId.eq(id))
                    .exec(&txn)
                    .await?;
            }

            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                txn.commit().await?;
                self.find_gallery_with_items(id).await?.ok_or_else(|| {
                    AppError::Internal {
                        message: "gallery missing after update".to_string(),
                    }
                })
            }
            Err(e) => {
                txn.rollback().await?;
                Err(e)
            }
        }
    }

    pub async fn delete_gallery(&self, id: i32) -> Result<bool> {
        let txn = self.conn().begin().await?;

        let result: Result<u64> = async {
            GalleryItemEntity::delete_many()
                .filter(GalleryItemColumn::GalleryId.eq(id))
                .exec(&txn)
                .await?;

            let deleted = GalleryEntity::delete_by_id(id).exec(&txn).await?;
            Ok(deleted.rows_affected)
        }
        .await;

        match result {
            Ok(rows) => {
                txn.commit().await?;
                Ok(rows > 0)
            }
            Err(e) => {
                txn.rollback().await?;
                Err(e)
            }
        }
    }

    // ========================================================================
    // Collaboration Operations
    // ========================================================================

    pub async fn list_collaborations(
        &self,
        status: Option<CollaborationStatus>,
        page: Pagination,
    ) -> Result<(Vec<Collaboration>, u64)> {
        let mut query = CollaborationEntity::find();

        if let Some(status) = status {
            query = query.filter(CollaborationColumn::Status.eq(status.as_str()));
        }

        let paginator = query
            .order_by_desc(CollaborationColumn::CreatedAt)
            .paginate(self.conn(), page.limit());

        let total = paginator.num_items().await?;
        let collaborations = paginator.fetch_page(page.page_index()).await?;

        Ok((collaborations, total))
    }

    pub async fn find_collaboration_with_files(
        &self,
        id: i32,
    ) -> Result<Option<(Collaboration, Vec<CollaborationFile>)>> {
        let Some(collaboration) = CollaborationEntity::find_by_id(id).one(self.conn()).await?
        else {
            return Ok(None);
        };

        let files = CollaborationFileEntity::find()
            .filter(CollaborationFileColumn::CollaborationId.eq(id))
            .all(self.conn())
            .await?;

        Ok(Some((collaboration, files)))
    }

    pub async fn find_collaboration_file(
        &self,
        collaboration_id: i32,
        file_id: i32,
    ) -> Result<Option<CollaborationFile>> {
        CollaborationFileEntity::find_by_id(file_id)
            .filter(CollaborationFileColumn::CollaborationId.eq(collaboration_id))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn create_collaboration(
        &self,
        input: CreateCollaboration,
        files: Vec<NewCollaborationFile>,
    ) -> Result<(Collaboration, Vec<CollaborationFile>)> {
        let txn = self.conn().begin().await?;

        let result: Result<i32> = async {
            let collaboration = CollaborationActiveModel {
                id: NotSet,
                name: Set(input.name.clone()),
                email: Set(input.email.clone()),
                phone: Set(input.phone.clone()),
                subject: Set(input.subject.clone()),
                message: Set(input.message.clone()),
                status: Set(CollaborationStatus::default().as_str().to_string()),
                created_at: Set(chrono::Utc::now()),
            }
            .insert(&txn)
            .await?;

            for file in &files {
                CollaborationFileActiveModel {
                    id: NotSet,
                    collaboration_id: Set(collaboration.id),
                    file_url: Set(file.file_url.clone()),
                    file_name: Set(file.file_name.clone()),
                    file_size: Set(file.file_size),
                }
                .insert(&txn)
                .await?;
            }

            Ok(collaboration.id)
        }
        .await;

        match result {
            Ok(id) => {
                txn.commit().await?;
                self.find_collaboration_with_files(id).await?.ok_or_else(|| {
                    AppError::Internal {
                        message: "collaboration missing after insert".to_string(),
                    }
                })
            }
            Err(e) => {
                txn.rollback().await?;
                Err(e)
            }
        }
    }

    pub async fn update_collaboration(
        &self,
        id: i32,
        update: UpdateCollaboration,
    ) -> Result<Collaboration> {
        let existing = CollaborationEntity::find_by_id(id)
            .one(self.conn())
            .await?
            .ok_or_else(|| AppError::CollaborationNotFound { id: id.to_string() })?;

        merge_collaboration(existing, update)
            .update(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Delete a collaboration and its file rows. Returns the file rows so
    /// the caller can remove the stored files from disk (best-effort).
    pub async fn delete_collaboration(&self, id: i32) -> Result<Option<Vec<CollaborationFile>>> {
        let Some((_, files)) = self.find_collaboration_with_files(id).await? else {
            return Ok(None);
        };

        let txn = self.conn().begin().await?;

        let result: Result<()> = async {
            CollaborationFileEntity::delete_many()
                .filter(CollaborationFileColumn::CollaborationId.eq(id))
                .exec(&txn)
                .await?;

            CollaborationEntity::delete_by_id(id).exec(&txn).await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                txn.commit().await?;
                Ok(Some(files))
            }
            Err(e) => {
                txn.rollback().await?;
                Err(e)
            }
        }
    }

    // ========================================================================
    // Document Operations
    // ========================================================================

    /// List documents with combined filters and pagination. The total comes
    /// from an independent COUNT over the same predicate.
    pub async fn list_documents(
        &self,
        filter: &DocumentFilter,
        page: Pagination,
    ) -> Result<(Vec<DocumentRecord>, u64)> {
        let (where_sql, values) = document_where_clause(filter);

        let count_sql = format!(
            "SELECT COUNT(*) AS total FROM documents d \
             INNER JOIN twin_cities tc ON tc.id = d.twin_city_id{}",
            where_sql
        );
        let total = CountRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::MySql,
            &count_sql,
            values.clone(),
        ))
        .one(self.conn())
        .await?
        .map(|row| row.total)
        .unwrap_or(0);

        let list_sql = format!(
            "{}{}{} ORDER BY d.created_at DESC, d.id DESC LIMIT ? OFFSET ?",
            DOCUMENT_SELECT, where_sql, DOCUMENT_GROUP_BY
        );
        let mut list_values = values;
        list_values.push((page.limit() as i64).into());
        list_values.push((page.offset() as i64).into());

        let rows = DocumentRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::MySql,
            &list_sql,
            list_values,
        ))
        .all(self.conn())
        .await?;

        Ok((
            rows.into_iter().map(DocumentRecord::from).collect(),
            total.max(0) as u64,
        ))
    }

    /// Fetch one document with its pair name and tag list
    pub async fn find_document(&self, id: i32) -> Result<Option<DocumentRecord>> {
        let sql = format!("{} WHERE d.id = ?{}", DOCUMENT_SELECT, DOCUMENT_GROUP_BY);

        let row = DocumentRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::MySql,
            &sql,
            [Value::from(id)],
        ))
        .one(self.conn())
        .await?;

        Ok(row.map(DocumentRecord::from))
    }

    /// Create a document and its tag links in one transaction
    pub async fn create_document(&self, input: DocumentWrite) -> Result<DocumentRecord> {
        self.require_twin_city(input.twin_city_id).await?;
        if let Some(location_id) = input.location_id {
            self.require_location(location_id).await?;
        }

        let (file_url, file_type, file_size, external_url) =
            resolve_file_fields(input.kind, input.file.as_ref(), input.external_url.as_deref(), None)?;
        let tags = normalize_tags(&input.tags);
        let now = chrono::Utc::now();

        let txn = self.conn().begin().await?;

        let result: Result<i32> = async {
            let document = DocumentActiveModel {
                id: NotSet,
                title: Set(input.title.clone()),
                author: Set(input.author.clone()),
                publication_year: Set(input.publication_year),
                category: Set(input.category.as_str().to_string()),
                kind: Set(input.kind.as_str().to_string()),
                file_url: Set(Some(file_url.clone())),
                file_type: Set(Some(file_type.clone())),
                file_size: Set(Some(file_size)),
                external_url: Set(Some(external_url.clone())),
                twin_city_id: Set(input.twin_city_id),
                location_id: Set(input.location_id),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?;

            link_tags(&txn, document.id, &tags).await?;

            Ok(document.id)
        }
        .await;

        match result {
            Ok(id) => {
                txn.commit().await?;
                self.find_document(id).await?.ok_or_else(|| AppError::Internal {
                    message: "document missing after insert".to_string(),
                })
            }
            Err(e) => {
                txn.rollback().await?;
                Err(e)
            }
        }
    }

    /// Update a document, replacing (not merging) its tag set, in one
    /// transaction
    pub async fn update_document(&self, id: i32, input: DocumentWrite) -> Result<DocumentRecord> {
        let existing = DocumentEntity::find_by_id(id)
            .one(self.conn())
            .await?
            .ok_or_else(|| AppError::DocumentNotFound { id: id.to_string() })?;

        self.require_twin_city(input.twin_city_id).await?;
        if let Some(location_id) = input.location_id {
            self.require_location(location_id).await?;
        }

        let (file_url, file_type, file_size, external_url) = resolve_file_fields(
            input.kind,
            input.file.as_ref(),
            input.external_url.as_deref(),
            Some(&existing),
        )?;
        let tags = normalize_tags(&input.tags);

        let txn = self.conn().begin().await?;

        let result: Result<()> = async {
            let mut document = existing.into_active_model();
            document.title = Set(input.title.clone());
            document.author = Set(input.author.clone());
            document.publication_year = Set(input.publication_year);
            document.category = Set(input.category.as_str().to_string());
            document.kind = Set(input.kind.as_str().to_string());
            document.file_url = Set(Some(file_url.clone()));
            document.file_type = Set(Some(file_type.clone()));
            document.file_size = Set(Some(file_size));
            document.external_url = Set(Some(external_url.clone()));
            document.twin_city_id = Set(input.twin_city_id);
            document.location_id = Set(input.location_id);
            document.updated_at = Set(chrono::Utc::now());
            document.update(&txn).await?;

            // Tag set is replaced wholesale: old links out, new links in
            DocumentTagEntity::delete_many()
                .filter(DocumentTagColumn::DocumentId.eq(id))
                .exec(&txn)
                .await?;

            link_tags(&txn, id, &tags).await?;

            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                txn.commit().await?;
                self.find_document(id).await?.ok_or_else(|| AppError::Internal {
                    message: "document missing after update".to_string(),
                })
            }
            Err(e) => {
                txn.rollback().await?;
                Err(e)
            }
        }
    }

    /// Delete a document and its tag links. Returns the deleted row so the
    /// caller can remove an internally stored file from disk.
    pub async fn delete_document(&self, id: i32) -> Result<Option<Document>> {
        let Some(document) = DocumentEntity::find_by_id(id).one(self.conn()).await? else {
            return Ok(None);
        };

        let txn = self.conn().begin().await?;

        let result: Result<()> = async {
            DocumentTagEntity::delete_many()
                .filter(DocumentTagColumn::DocumentId.eq(id))
                .exec(&txn)
                .await?;

            DocumentEntity::delete_by_id(id).exec(&txn).await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                txn.commit().await?;
                Ok(Some(document))
            }
            Err(e) => {
                txn.rollback().await?;
                Err(e)
            }
        }
    }

    // ========================================================================
    // Reference checks
    // ========================================================================

    async fn require_twin_city(&self, id: i32) -> Result<()> {
        let exists = TwinCityEntity::find_by_id(id).one(self.conn()).await?;
        if exists.is_none() {
            return Err(AppError::TwinCityNotFound { id: id.to_string() });
        }
        Ok(())
    }

    async fn require_location(&self, id: i32) -> Result<()> {
        let exists = LocationEntity::find_by_id(id).one(self.conn()).await?;
        if exists.is_none() {
            return Err(AppError::LocationNotFound { id: id.to_string() });
        }
        Ok(())
    }
}

/// Insert or reuse each tag by exact name and link it to the document.
/// An empty list is valid and links nothing.
async fn link_tags<C: ConnectionTrait>(conn: &C, document_id: i32, tags: &[String]) -> Result<()> {
    for name in tags {
        let existing = TagEntity::find()
            .filter(TagColumn::Name.eq(name.as_str()))
            .one(conn)
            .await?;

        let tag_id = match existing {
            Some(tag) => tag.id,
            None => {
                TagActiveModel {
                    id: NotSet,
                    name: Set(name.clone()),
                }
                .insert(conn)
                .await?
                .id
            }
        };

        DocumentTagActiveModel {
            document_id: Set(document_id),
            tag_id: Set(tag_id),
        }
        .insert(conn)
        .await?;
    }

    Ok(())
}

/// Delete all items of a gallery and insert the given list in order
async fn replace_gallery_items<C: ConnectionTrait>(
    conn: &C,
    gallery_id: i32,
    kind: GalleryKind,
    items: &[GalleryItemInput],
) -> Result<()> {
    GalleryItemEntity::delete_many()
        .filter(GalleryItemColumn::GalleryId.eq(gallery_id))
        .exec(conn)
        .await?;

    for (position, item) in items.iter().enumerate() {
        GalleryItemActiveModel {
            id: NotSet,
            gallery_id: Set(gallery_id),
            url: Set(item.url.clone()),
            kind: Set(kind.as_str().to_string()),
            position: Set(position as i32),
            caption: Set(item.caption.clone()),
        }
        .insert(conn)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveValue;

    #[test]
    fn test_pagination_defaults() {
        let page = Pagination::new(None, None);
        assert_eq!(page.page(), 1);
        assert_eq!(page.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_pagination_clamps() {
        assert_eq!(Pagination::new(Some(0), None).page(), 1);
        assert_eq!(Pagination::new(Some(-3), None).page(), 1);
        assert_eq!(Pagination::new(None, Some(0)).limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(Pagination::new(None, Some(-1)).limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(Pagination::new(None, Some(500)).limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_pagination_offset() {
        let page = Pagination::new(Some(2), Some(10));
        assert_eq!(page.offset(), 10);
        assert_eq!(page.page_index(), 1);
    }

    #[test]
    fn test_where_clause_empty_filter() {
        let (sql, values) = document_where_clause(&DocumentFilter::default());
        assert!(sql.is_empty());
        assert!(values.is_empty());
    }

    #[test]
    fn test_where_clause_combined_filters() {
        let filter = DocumentFilter {
            category: Some(DocumentCategory::Books),
            location_id: Some(3),
            twin_city_id: Some(5),
            search: Some("fronteira".to_string()),
        };
        let (sql, values) = document_where_clause(&filter);

        assert!(sql.starts_with(" WHERE "));
        assert!(sql.contains("d.category = ?"));
        assert!(sql.contains("d.location_id = ?"));
        assert!(sql.contains("d.twin_city_id = ?"));
        assert!(sql.contains("t2.name LIKE ?"));
        // category + location + twin city + three search patterns
        assert_eq!(values.len(), 6);
        // three clause separators plus the one inside the EXISTS subquery
        assert_eq!(sql.matches(" AND ").count(), 4);
    }

    #[test]
    fn test_resolve_external_zeroes_file_fields() {
        let (file_url, file_type, file_size, external_url) = resolve_file_fields(
            DocumentKind::External,
            None,
            Some("http://x/doc.pdf"),
            None,
        )
        .unwrap();

        assert_eq!(file_url, "");
        assert_eq!(file_type, "");
        assert_eq!(file_size, 0);
        assert_eq!(external_url, "http://x/doc.pdf");
    }

    #[test]
    fn test_resolve_external_requires_url() {
        let err = resolve_file_fields(DocumentKind::External, None, None, None).unwrap_err();
        assert!(matches!(err, AppError::MissingField { ref field } if field == "external_url"));

        let err =
            resolve_file_fields(DocumentKind::External, None, Some("   "), None).unwrap_err();
        assert!(matches!(err, AppError::MissingField { ref field } if field == "external_url"));
    }

    #[test]
    fn test_resolve_internal_requires_file_on_create() {
        let err = resolve_file_fields(DocumentKind::Internal, None, None, None).unwrap_err();
        assert!(matches!(err, AppError::MissingField { ref field } if field == "file"));
    }

    #[test]
    fn test_resolve_internal_uses_upload() {
        let file = FileMeta {
            url: "documents/abc.pdf".to_string(),
            mime: "application/pdf".to_string(),
            size: 1234,
        };
        let (file_url, file_type, file_size, external_url) =
            resolve_file_fields(DocumentKind::Internal, Some(&file), Some("ignored"), None)
                .unwrap();

        assert_eq!(file_url, "documents/abc.pdf");
        assert_eq!(file_type, "application/pdf");
        assert_eq!(file_size, 1234);
        assert_eq!(external_url, "");
    }

    #[test]
    fn test_resolve_internal_keeps_stored_file_on_update() {
        let existing = Document {
            id: 1,
            title: "t".into(),
            author: "a".into(),
            publication_year: 2020,
            category: "books".into(),
            kind: "internal".into(),
            file_url: Some("documents/old.pdf".into()),
            file_type: Some("application/pdf".into()),
            file_size: Some(99),
            external_url: Some("".into()),
            twin_city_id: 5,
            location_id: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let (file_url, file_type, file_size, external_url) =
            resolve_file_fields(DocumentKind::Internal, None, None, Some(&existing)).unwrap();

        assert_eq!(file_url, "documents/old.pdf");
        assert_eq!(file_type, "application/pdf");
        assert_eq!(file_size, 99);
        assert_eq!(external_url, "");
    }

    #[test]
    fn test_resolve_internal_rejects_switch_without_file() {
        // Previously external: no stored file to fall back to
        let existing = Document {
            id: 1,
            title: "t".into(),
            author: "a".into(),
            publication_year: 2020,
            category: "books".into(),
            kind: "external".into(),
            file_url: Some("".into()),
            file_type: Some("".into()),
            file_size: Some(0),
            external_url: Some("http://x/doc.pdf".into()),
            twin_city_id: 5,
            location_id: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let err = resolve_file_fields(DocumentKind::Internal, None, None, Some(&existing))
            .unwrap_err();
        assert!(matches!(err, AppError::MissingField { ref field } if field == "file"));
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![
            " fronteira ".to_string(),
            "saúde".to_string(),
            "".to_string(),
            "fronteira".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["fronteira", "saúde"]);
    }

    #[test]
    fn test_normalize_tags_empty_is_valid() {
        assert!(normalize_tags(&[]).is_empty());
    }

    #[test]
    fn test_document_record_splits_tags() {
        let row = DocumentRow {
            id: 1,
            title: "Report A".into(),
            author: "Someone".into(),
            publication_year: 2021,
            category: "reports".into(),
            kind: "external".into(),
            file_url: None,
            file_type: None,
            file_size: None,
            external_url: Some("http://x/doc.pdf".into()),
            twin_city_id: 5,
            twin_city_name: "Oiapoque - Saint-Georges".into(),
            location_id: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            tag_names: Some("fronteira,saúde".into()),
        };

        let record = DocumentRecord::from(row);
        assert_eq!(record.tags, vec!["fronteira", "saúde"]);
        assert_eq!(record.file_url, "");
        assert_eq!(record.file_size, 0);
        assert_eq!(record.external_url, "http://x/doc.pdf");
    }

    #[test]
    fn test_document_record_no_tags() {
        let row = DocumentRow {
            id: 1,
            title: "Report A".into(),
            author: "Someone".into(),
            publication_year: 2021,
            category: "reports".into(),
            kind: "internal".into(),
            file_url: Some("documents/a.pdf".into()),
            file_type: Some("application/pdf".into()),
            file_size: Some(10),
            external_url: Some("".into()),
            twin_city_id: 5,
            twin_city_name: "Oiapoque - Saint-Georges".into(),
            location_id: Some(2),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            tag_names: None,
        };

        let record = DocumentRecord::from(row);
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_merge_location_partial() {
        let existing = Location {
            id: 1,
            name: "Oiapoque".into(),
            latitude: 3.84,
            longitude: -51.83,
            country: "Brasil".into(),
            description: None,
            image_url: None,
            created_at: chrono::Utc::now(),
        };

        let merged = merge_location(
            existing,
            UpdateLocation {
                name: Some("Oiapoque Centro".into()),
                ..Default::default()
            },
        );

        assert_eq!(merged.name, ActiveValue::Set("Oiapoque Centro".into()));
        // Unspecified fields stay untouched
        assert!(matches!(merged.country, ActiveValue::Unchanged(_)));
        assert!(matches!(merged.latitude, ActiveValue::Unchanged(_)));
    }

    #[test]
    fn test_merge_collaboration_status() {
        let existing = Collaboration {
            id: 9,
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: None,
            subject: "Fotos".into(),
            message: "Tenho fotos do rio".into(),
            status: "pending".into(),
            created_at: chrono::Utc::now(),
        };

        let merged = merge_collaboration(
            existing,
            UpdateCollaboration {
                status: Some(CollaborationStatus::Approved),
                ..Default::default()
            },
        );

        assert_eq!(merged.status, ActiveValue::Set("approved".into()));
        assert!(matches!(merged.email, ActiveValue::Unchanged(_)));
    }
}
