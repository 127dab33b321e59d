use super::{public_url, BlobStorage};
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Writes assets below a directory that the HTTP server exposes at
/// `base_url`.
#[derive(Clone, Debug)]
pub struct LocalBlobStorage {
    base_dir: PathBuf,
    base_url: String,
}

impl LocalBlobStorage {
    pub fn new(base_dir: PathBuf, base_url: String) -> Self {
        Self { base_dir, base_url }
    }

    /// Map a key to a path inside `base_dir`. Keys that would escape the
    /// directory are rejected.
    pub fn resolve_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            return Err(Error::StorageWrite(format!("Invalid storage key: {}", key)));
        }
        Ok(self.base_dir.join(relative))
    }
}

#[async_trait]
impl BlobStorage for LocalBlobStorage {
    async fn put(&self, key: &str, data: &[u8], _content_type: &str) -> Result<String> {
        let path = self.resolve_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::StorageWrite(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        fs::write(&path, data).await.map_err(|e| {
            tracing::error!("Failed to write {}: {}", path.display(), e);
            Error::StorageWrite(format!("Failed to write {}: {}", path.display(), e))
        })?;

        tracing::info!("Stored {} ({} bytes) at {}", key, data.len(), path.display());
        Ok(public_url(&self.base_url, key))
    }
}
