//! API handlers module

pub mod collaborations;
pub mod documents;
pub mod galleries;
pub mod health;
pub mod indicators;
pub mod locations;
pub mod twin_cities;

use axum::{
    body::Body,
    extract::multipart::{Field, MultipartError},
    http::header,
    response::{IntoResponse, Response},
};
use fronteira_common::{
    errors::{AppError, Result},
    storage::UploadStore,
};
use tokio_util::io::ReaderStream;

/// Unwrap a required field collected from a request body
pub(crate) fn require<T>(field: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| AppError::MissingField {
        field: field.to_string(),
    })
}

/// Require a non-blank string, returning it trimmed
pub(crate) fn non_empty(field: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::MissingField {
            field: field.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Parse a numeric text part, surfacing the offending value on failure
pub(crate) fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| AppError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Map a malformed multipart body to a validation error
pub(crate) fn multipart_error(err: MultipartError) -> AppError {
    AppError::Validation {
        message: format!("Malformed multipart body: {}", err),
        field: None,
    }
}

/// An uploaded file collected from a multipart field
pub(crate) struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Read one binary multipart field, enforcing the configured size limit
pub(crate) async fn read_upload(field: Field<'_>, max_bytes: usize) -> Result<UploadedFile> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| {
            mime_guess::from_path(&file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

    let bytes = field.bytes().await.map_err(multipart_error)?;
    if bytes.len() > max_bytes {
        return Err(AppError::PayloadTooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }

    Ok(UploadedFile {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    })
}

/// Stream a stored file as an attachment with an inferred content type
pub(crate) async fn stream_stored_file(
    uploads: &UploadStore,
    relative: &str,
    download_name: &str,
) -> Result<Response> {
    let path = uploads.resolve(relative)?;

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::FileNotFound {
                path: relative.to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let content_type = mime_guess::from_path(&path).first_or_octet_stream();
    let body = Body::from_stream(ReaderStream::new(file));

    let headers = [
        (header::CONTENT_TYPE, content_type.essence_str().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download_name.replace('"', "")),
        ),
    ];

    Ok((headers, body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_missing() {
        let err = require::<String>("title", None).unwrap_err();
        assert!(matches!(err, AppError::MissingField { ref field } if field == "title"));
    }

    #[test]
    fn test_require_present() {
        assert_eq!(require("title", Some(7)).unwrap(), 7);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("name", "  Oiapoque ".into()).unwrap(), "Oiapoque");
        assert!(non_empty("name", "   ".into()).is_err());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number::<i32>("year", "2021").unwrap(), 2021);
        assert_eq!(parse_number::<f64>("latitude", " 3.84 ").unwrap(), 3.84);

        let err = parse_number::<i32>("year", "soon").unwrap_err();
        assert!(matches!(err, AppError::InvalidValue { ref field, .. } if field == "year"));
    }
}
