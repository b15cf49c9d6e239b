use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::modules::storage::{BlobStorage, ResolvedBlob};
use crate::shared::constants::UPLOADS_PUBLIC_PREFIX;

/// Local filesystem backend. Files live flat under the upload root and are
/// addressed as `/uploads/<stored-name>`.
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    /// Open the backend, creating the upload root if it does not exist.
    pub async fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to create upload directory '{}': {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self { root })
    }

    /// Map a recorded location back to a path under the upload root. Only
    /// locations this backend produced are accepted.
    fn path_for(&self, location: &str) -> Result<PathBuf> {
        let name = location
            .strip_prefix(UPLOADS_PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| {
                AppError::Storage(format!("Unrecognized storage location: {}", location))
            })?;

        // Separators are rejected outright, so a bare ".." is the only
        // traversal risk left.
        if name.is_empty() || name.contains('/') || name.contains('\\') || name == ".." {
            return Err(AppError::Storage(format!(
                "Unrecognized storage location: {}",
                location
            )));
        }

        Ok(self.root.join(name))
    }
}

#[async_trait]
impl BlobStorage for DiskStorage {
    async fn put(&self, name: &str, data: Vec<u8>, _content_type: &str) -> Result<String> {
        let path = self.root.join(name);
        fs::write(&path, &data).await.map_err(|e| {
            AppError::Storage(format!("Failed to write '{}': {}", path.display(), e))
        })?;

        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(format!("{}/{}", UPLOADS_PUBLIC_PREFIX, name))
    }

    async fn delete(&self, location: &str) -> Result<()> {
        let path = self.path_for(location)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted {}", path.display());
                Ok(())
            }
            // Bytes already gone; nothing left to release.
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Nothing to delete at {}", path.display());
                Ok(())
            }
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    async fn resolve(&self, location: &str) -> Result<ResolvedBlob> {
        let path = self.path_for(location)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(ResolvedBlob::Bytes(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::BlobMissing(location.to_string()))
            }
            Err(e) => Err(AppError::Storage(format!(
                "Failed to read '{}': {}",
                path.display(),
                e
            ))),
        }
    }
}
