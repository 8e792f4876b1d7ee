//! Database layer for the Fronteira backend
//!
//! Provides:
//! - SeaORM entity models
//! - Repository pattern for data access
//! - Connection pool management with explicit lifecycle

pub mod models;
mod repository;

pub use repository::{
    CreateCollaboration, CreateGallery, CreateIndicator, CreateLocation, CreateTwinCity,
    DocumentFilter, DocumentRecord, DocumentWrite, FileMeta, GalleryFilter, GalleryItemInput,
    IndicatorFilter, NewCollaborationFile, Pagination, Repository, UpdateCollaboration,
    UpdateGallery, UpdateIndicator, UpdateLocation, UpdateTwinCity,
};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// Database connection pool handle
///
/// Constructed once at startup and carried in application state; never a
/// process global. `close` tears the pool down on shutdown.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(cfg!(debug_assertions));

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e),
            })?;

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Database connection pool established"
        );

        Ok(Self { conn })
    }

    /// Get the underlying connection
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;

        Ok(())
    }

    /// Close the pool, releasing all connections
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        info!("Database connection pool closed");
        Ok(())
    }
}
