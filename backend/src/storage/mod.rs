pub mod local_service;
pub mod s3_service;

use async_trait::async_trait;

pub use local_service::LocalObjectStore;
pub use s3_service::S3ObjectStore;

pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("S3 error: {0}")]
    S3(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid public URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Where an upload ended up. Only `url` leaves the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub key: String,
    pub url: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, bytes: &[u8], content_type: &str) -> Result<StoredAsset, StorageError>;
}

pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

/// Trusts a declared `image/*` type, otherwise sniffs the magic bytes.
pub fn detect_content_type(declared: Option<&str>, bytes: &[u8]) -> String {
    if let Some(declared) = declared.filter(|ct| ct.starts_with("image/")) {
        return declared.to_string();
    }
    image::guess_format(bytes)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| FALLBACK_CONTENT_TYPE.to_string())
}
