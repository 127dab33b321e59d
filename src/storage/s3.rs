use super::{public_url, BlobStorage};
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{config::Region, types::ObjectCannedAcl, Client as S3Client};

pub struct S3BlobStorage {
    client: S3Client,
    bucket: String,
    base_url: String,
}

impl S3BlobStorage {
    pub async fn new(
        access_key_id: String,
        secret_access_key: String,
        endpoint: String,
        bucket: String,
        base_url: String,
    ) -> Result<Self> {
        let credentials = aws_sdk_s3::config::Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "band-spotlight",
        );

        // S3-compatible providers generally ignore the region
        let config = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new("us-east-1"))
            .endpoint_url(endpoint)
            .load()
            .await;

        Ok(Self {
            client: S3Client::new(&config),
            bucket,
            base_url,
        })
    }
}

#[async_trait]
impl BlobStorage for S3BlobStorage {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String> {
        let body = ByteStream::from(data.to_vec());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to upload {} to bucket {}: {}", key, self.bucket, e);
                Error::StorageWrite(format!("Failed to upload {}: {}", key, e))
            })?;

        tracing::info!("Uploaded {} ({} bytes) to bucket {}", key, data.len(), self.bucket);
        Ok(public_url(&self.base_url, key))
    }
}
