//! Upload storage on the local filesystem
//!
//! Files live under a configured root with one subdirectory per entity type.
//! Records reference files by relative path; the store resolves those paths
//! and refuses anything that would escape the root.

use crate::config::UploadConfig;
use crate::errors::{AppError, Result};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Subdirectory for internally stored documents
pub const DOCUMENTS_DIR: &str = "documents";
/// Subdirectory for gallery media
pub const GALLERY_DIR: &str = "gallery";
/// Subdirectory for location images
pub const LOCATIONS_DIR: &str = "locations";
/// Subdirectory for collaboration attachments
pub const COLLABORATIONS_DIR: &str = "collaborations";

const SUBDIRS: &[&str] = &[DOCUMENTS_DIR, GALLERY_DIR, LOCATIONS_DIR, COLLABORATIONS_DIR];

/// A file persisted by the store
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Relative path under the upload root, as stored in records
    pub relative_path: String,
    pub size: i64,
}

/// Filesystem-backed store for uploaded files
#[derive(Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            root: config.root.clone(),
        }
    }

    /// Create the root and the per-entity subdirectories
    pub async fn init(&self) -> Result<()> {
        for subdir in SUBDIRS {
            tokio::fs::create_dir_all(self.root.join(subdir)).await?;
        }
        debug!(root = %self.root.display(), "Upload store initialized");
        Ok(())
    }

    /// Write bytes under the given subdirectory with a generated name that
    /// keeps the original extension. Returns the relative path to store.
    pub async fn save(&self, subdir: &str, original_name: &str, bytes: &[u8]) -> Result<StoredFile> {
        let relative_path = format!("{}/{}{}", subdir, Uuid::new_v4(), extension_of(original_name));
        let absolute = self.root.join(&relative_path);

        if let Some(parent) = absolute.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&absolute, bytes).await?;

        debug!(path = %relative_path, size = bytes.len(), "Stored uploaded file");

        Ok(StoredFile {
            relative_path,
            size: bytes.len() as i64,
        })
    }

    /// Resolve a stored relative path to an absolute one.
    /// Rejects paths that would escape the upload root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let path = Path::new(relative);

        let safe = path
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !safe || relative.is_empty() {
            return Err(AppError::Storage {
                message: format!("Refusing unsafe stored path: {}", relative),
            });
        }

        Ok(self.root.join(path))
    }

    /// Best-effort removal of a stored file. Failures are logged and
    /// reported as `false`, never raised.
    pub async fn delete(&self, relative: &str) -> bool {
        let absolute = match self.resolve(relative) {
            Ok(path) => path,
            Err(e) => {
                warn!(path = relative, error = %e, "Skipping file deletion");
                return false;
            }
        };

        match tokio::fs::remove_file(&absolute).await {
            Ok(()) => true,
            Err(e) => {
                warn!(path = relative, error = %e, "Failed to delete stored file");
                false
            }
        }
    }
}

/// Extension of the original filename, dot included, empty when absent.
/// Anything but plain alphanumerics is dropped.
fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadConfig;

    fn store(dir: &tempfile::TempDir) -> UploadStore {
        UploadStore::new(&UploadConfig {
            root: dir.path().to_path_buf(),
            max_upload_bytes: 1024,
        })
    }

    #[tokio::test]
    async fn test_save_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.init().await.unwrap();

        let stored = store
            .save(DOCUMENTS_DIR, "relatório.PDF", b"content")
            .await
            .unwrap();

        assert!(stored.relative_path.starts_with("documents/"));
        assert!(stored.relative_path.ends_with(".pdf"));
        assert_eq!(stored.size, 7);

        let absolute = store.resolve(&stored.relative_path).unwrap();
        assert_eq!(std::fs::read(absolute).unwrap(), b"content");
    }

    #[tokio::test]
    async fn test_delete_is_best_effort() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.init().await.unwrap();

        let stored = store.save(GALLERY_DIR, "a.png", b"img").await.unwrap();
        assert!(store.delete(&stored.relative_path).await);
        // Second deletion fails quietly
        assert!(!store.delete(&stored.relative_path).await);
    }

    #[tokio::test]
    async fn test_resolve_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("/etc/passwd").is_err());
        assert!(store.resolve("documents/../../etc/passwd").is_err());
        assert!(store.resolve("").is_err());
        assert!(!store.delete("../etc/passwd").await);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("photo.JPG"), ".jpg");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("no_extension"), "");
        assert_eq!(extension_of("weird.p?f"), "");
    }
}
