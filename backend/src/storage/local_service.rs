use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use super::{ObjectStore, StorageError, StoredAsset, extension_for};

/// Disk-backed store; files are served back under `/uploads`.
#[derive(Clone)]
pub struct LocalObjectStore {
    base_path: PathBuf,
    base_url: String,
}

impl LocalObjectStore {
    pub async fn new(base_path: impl Into<PathBuf>, base_url: &str) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;
        Ok(Self {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn file_name(content_type: &str) -> String {
        format!(
            "{}-{}.{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            extension_for(content_type)
        )
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, bytes: &[u8], content_type: &str) -> Result<StoredAsset, StorageError> {
        let file_name = Self::file_name(content_type);
        let path = self.base_path.join(&file_name);
        fs::write(&path, bytes).await?;

        log::debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(StoredAsset {
            url: format!("{}/uploads/{}", self.base_url, file_name),
            key: file_name,
        })
    }
}
