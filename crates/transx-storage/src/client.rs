//! S3 client implementation.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, ChecksumAlgorithm, ChecksumMode, CreateBucketConfiguration,
};
use aws_sdk_s3::Client;
use aws_types::SdkConfig;
use tracing::{debug, info};

use crate::checksum::file_sha256;
use crate::error::{StorageError, StorageResult};

/// Remote object storage as seen by the pipeline.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file under `key`, overwriting any existing object.
    async fn put_object(&self, bucket: &str, key: &str, path: &Path) -> StorageResult<()>;

    /// Base64 SHA-256 recorded for an object, `None` when the object is
    /// missing or was stored without one.
    async fn object_checksum(&self, bucket: &str, key: &str) -> StorageResult<Option<String>>;

    /// Download an object as bytes.
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>>;

    /// Keys under `prefix`, across all result pages.
    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<String>>;

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Names of all buckets visible to the caller.
    async fn list_buckets(&self) -> StorageResult<Vec<String>>;

    async fn create_bucket(&self, name: &str) -> StorageResult<()>;

    /// Delete an empty bucket.
    async fn delete_bucket(&self, name: &str) -> StorageResult<()>;
}

/// Amazon S3 storage client.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    region: Option<String>,
}

impl S3Store {
    /// Create a client from an already-resolved SDK configuration.
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
            region: sdk_config.region().map(|r| r.as_ref().to_string()),
        }
    }
}

/// us-east-1 rejects an explicit location constraint; every other region needs one.
fn location_constraint(region: Option<&str>) -> Option<&str> {
    region.filter(|r| !r.is_empty() && *r != "us-east-1")
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_object(&self, bucket: &str, key: &str, path: &Path) -> StorageResult<()> {
        debug!("Uploading {} to s3://{}/{}", path.display(), bucket, key);

        let checksum = file_sha256(path).await?;
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .checksum_algorithm(ChecksumAlgorithm::Sha256)
            .checksum_sha256(checksum)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(DisplayErrorContext(&e).to_string()))?;

        info!("Uploaded {} to s3://{}/{}", path.display(), bucket, key);
        Ok(())
    }

    async fn object_checksum(&self, bucket: &str, key: &str) -> StorageResult<Option<String>> {
        let result = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .checksum_mode(ChecksumMode::Enabled)
            .send()
            .await;

        match result {
            Ok(head) => Ok(head.checksum_sha256().map(str::to_string)),
            Err(e) => {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_not_found())
                    .unwrap_or(false);
                if missing {
                    Ok(None)
                } else {
                    Err(StorageError::download_failed(DisplayErrorContext(&e).to_string()))
                }
            }
        }
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        debug!("Downloading s3://{}/{}", bucket, key);

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                if missing {
                    StorageError::not_found(key)
                } else {
                    StorageError::download_failed(DisplayErrorContext(&e).to_string())
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::download_failed(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(bytes)
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket).prefix(prefix);
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StorageError::ListFailed(DisplayErrorContext(&e).to_string()))?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|o| o.key().map(str::to_string)),
            );

            if response.is_truncated().unwrap_or(false) {
                continuation_token = response.next_continuation_token().map(str::to_string);
            }
            if continuation_token.is_none() {
                break;
            }
        }

        debug!("Listed {} objects under s3://{}/{}", keys.len(), bucket, prefix);
        Ok(keys)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(DisplayErrorContext(&e).to_string()))?;

        debug!("Deleted s3://{}/{}", bucket, key);
        Ok(())
    }

    async fn list_buckets(&self) -> StorageResult<Vec<String>> {
        let response = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| StorageError::ListFailed(DisplayErrorContext(&e).to_string()))?;

        Ok(response
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect())
    }

    async fn create_bucket(&self, name: &str) -> StorageResult<()> {
        let mut request = self.client.create_bucket().bucket(name);

        if let Some(region) = location_constraint(self.region.as_deref()) {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                info!("Created bucket {}", name);
                Ok(())
            }
            Err(e) => {
                let owned = e
                    .as_service_error()
                    .map(|se| se.is_bucket_already_owned_by_you())
                    .unwrap_or(false);
                if owned {
                    debug!("Bucket {} already owned by caller", name);
                    Ok(())
                } else {
                    Err(StorageError::CreateBucketFailed(
                        DisplayErrorContext(&e).to_string(),
                    ))
                }
            }
        }
    }

    async fn delete_bucket(&self, name: &str) -> StorageResult<()> {
        self.client
            .delete_bucket()
            .bucket(name)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(DisplayErrorContext(&e).to_string()))?;

        info!("Deleted bucket {}", name);
        Ok(())
    }
}
