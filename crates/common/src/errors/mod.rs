//! Error types for the Fronteira backend
//!
//! Provides:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    MissingField,
    InvalidValue,
    PayloadTooLarge,

    // Resource errors (4xxx)
    NotFound,
    LocationNotFound,
    TwinCityNotFound,
    IndicatorNotFound,
    GalleryNotFound,
    CollaborationNotFound,
    DocumentNotFound,
    FileNotFound,

    // Conflict errors (5xxx)
    Conflict,
    ResourceInUse,

    // Rate limiting (6xxx)
    RateLimited,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
    StorageError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::MissingField => 1002,
            ErrorCode::InvalidValue => 1003,
            ErrorCode::PayloadTooLarge => 1004,

            // Resources (4xxx)
            ErrorCode::NotFound => 4001,
            ErrorCode::LocationNotFound => 4002,
            ErrorCode::TwinCityNotFound => 4003,
            ErrorCode::IndicatorNotFound => 4004,
            ErrorCode::GalleryNotFound => 4005,
            ErrorCode::CollaborationNotFound => 4006,
            ErrorCode::DocumentNotFound => 4007,
            ErrorCode::FileNotFound => 4008,

            // Conflicts (5xxx)
            ErrorCode::Conflict => 5001,
            ErrorCode::ResourceInUse => 5002,

            // Rate limits (6xxx)
            ErrorCode::RateLimited => 6001,

            // Database (7xxx)
            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
            ErrorCode::StorageError => 9004,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Required field missing: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Payload too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Location not found: {id}")]
    LocationNotFound { id: String },

    #[error("Twin city not found: {id}")]
    TwinCityNotFound { id: String },

    #[error("Indicator not found: {id}")]
    IndicatorNotFound { id: String },

    #[error("Gallery not found: {id}")]
    GalleryNotFound { id: String },

    #[error("Collaboration not found: {id}")]
    CollaborationNotFound { id: String },

    #[error("Document not found: {id}")]
    DocumentNotFound { id: String },

    #[error("Stored file not found: {path}")]
    FileNotFound { path: String },

    // Conflict errors
    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("{resource_type} {id} is still referenced by {dependents}")]
    ResourceInUse {
        resource_type: String,
        id: String,
        dependents: String,
    },

    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Upload storage errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::MissingField { .. } => ErrorCode::MissingField,
            AppError::InvalidValue { .. } => ErrorCode::InvalidValue,
            AppError::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::LocationNotFound { .. } => ErrorCode::LocationNotFound,
            AppError::TwinCityNotFound { .. } => ErrorCode::TwinCityNotFound,
            AppError::IndicatorNotFound { .. } => ErrorCode::IndicatorNotFound,
            AppError::GalleryNotFound { .. } => ErrorCode::GalleryNotFound,
            AppError::CollaborationNotFound { .. } => ErrorCode::CollaborationNotFound,
            AppError::DocumentNotFound { .. } => ErrorCode::DocumentNotFound,
            AppError::FileNotFound { .. } => ErrorCode::FileNotFound,
            AppError::Conflict { .. } => ErrorCode::Conflict,
            AppError::ResourceInUse { .. } => ErrorCode::ResourceInUse,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Storage { .. } => ErrorCode::StorageError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } |
            AppError::MissingField { .. } |
            AppError::InvalidValue { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NotFound { .. } |
            AppError::LocationNotFound { .. } |
            AppError::TwinCityNotFound { .. } |
            AppError::IndicatorNotFound { .. } |
            AppError::GalleryNotFound { .. } |
            AppError::CollaborationNotFound { .. } |
            AppError::DocumentNotFound { .. } |
            AppError::FileNotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::Conflict { .. } |
            AppError::ResourceInUse { .. } => StatusCode::CONFLICT,

            // 413 Payload Too Large
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            AppError::Database(_) |
            AppError::DatabaseConnection { .. } |
            AppError::Storage { .. } |
            AppError::Internal { .. } |
            AppError::Configuration { .. } |
            AppError::Serialization(_) |
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log based on severity; infrastructure detail stays server-side
        if self.is_server_error() {
            tracing::error!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        // Internal errors are surfaced with a generic message only
        let message = if self.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let details = match &self {
            AppError::Validation { field: Some(field), .. } => {
                Some(serde_json::json!({ "field": field }))
            }
            AppError::MissingField { field } => {
                Some(serde_json::json!({ "field": field }))
            }
            AppError::InvalidValue { field, value } => {
                Some(serde_json::json!({ "field": field, "value": value }))
            }
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let field = err.field_errors().keys().next().map(|f| f.to_string());
        AppError::Validation {
            message: err.to_string(),
            field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::DocumentNotFound { id: "7".into() };
        assert_eq!(err.code(), ErrorCode::DocumentNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "Invalid title".into(),
            field: Some("title".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_referenced_resource_is_conflict() {
        let err = AppError::ResourceInUse {
            resource_type: "twin_city".into(),
            id: "5".into(),
            dependents: "3 documents".into(),
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code(), ErrorCode::ResourceInUse);
    }

    #[test]
    fn test_server_error() {
        let err = AppError::Internal {
            message: "Something went wrong".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_server_error());
    }

    #[test]
    fn test_invalid_enum_value() {
        let err = AppError::InvalidValue {
            field: "kind".into(),
            value: "remote".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), ErrorCode::InvalidValue);
    }
}
