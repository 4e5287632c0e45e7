use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use url::Url;
use uuid::Uuid;

use super::{ObjectStore, StorageError, StoredAsset, extension_for};

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket_name: String,
    public_base: Url,
}

impl S3ObjectStore {
    pub fn new(
        client: Client,
        bucket_name: String,
        region: &str,
        public_base_url: Option<&str>,
    ) -> Result<Self, StorageError> {
        let public_base = match public_base_url {
            Some(base) => Url::parse(base)?,
            None => Url::parse(&format!("https://{}.s3.{}.amazonaws.com/", bucket_name, region))?,
        };
        Ok(Self {
            client,
            bucket_name,
            public_base,
        })
    }

    pub fn generate_s3_key(now: DateTime<Utc>, content_type: &str) -> String {
        format!(
            "uploads/{}/{}.{}",
            now.format("%Y/%m/%d"),
            Uuid::new_v4(),
            extension_for(content_type)
        )
    }

    pub fn public_url(&self, s3_key: &str) -> Result<String, StorageError> {
        let mut base = self.public_base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join(s3_key)?.to_string())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, bytes: &[u8], content_type: &str) -> Result<StoredAsset, StorageError> {
        let s3_key = Self::generate_s3_key(Utc::now(), content_type);
        let body = ByteStream::from(bytes.to_vec());

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&s3_key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        log::debug!("Stored {} bytes at s3://{}/{}", bytes.len(), self.bucket_name, s3_key);
        let url = self.public_url(&s3_key)?;
        Ok(StoredAsset { key: s3_key, url })
    }
}
