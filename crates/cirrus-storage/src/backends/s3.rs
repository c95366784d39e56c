//! S3-compatible object store.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream as S3ByteStream;
use bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::debug;

use cirrus_core::config::S3StorageConfig;
use cirrus_core::traits::{ByteStream, ObjectStore, StorageObjectRef};
use cirrus_core::{AppError, AppResult, ErrorKind};

/// Objects in an S3 bucket, on AWS itself or any S3-compatible endpoint.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Builds a client from the config. A custom endpoint switches the
    /// client to path-style addressing, which MinIO and similar stores
    /// expect.
    pub async fn new(config: &S3StorageConfig) -> AppResult<Self> {
        if config.bucket.is_empty() {
            return Err(AppError::configuration("S3 bucket name is not set"));
        }

        let region = aws_config::Region::new(config.region.clone());
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "cirrus-config",
            ));
        }

        let sdk_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if config.endpoint.is_some() {
            builder = builder.force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn driver_name(&self) -> &str {
        "s3"
    }

    fn bucket_name(&self) -> Option<&str> {
        Some(&self.bucket)
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> AppResult<StorageObjectRef> {
        let size = data.len() as u64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(S3ByteStream::from(data))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::StorageWrite,
                    format!("Failed to store object {key}"),
                    e,
                )
            })?;

        debug!(key, bytes = size, bucket = %self.bucket, "Stored object");

        Ok(StorageObjectRef {
            key: key.to_string(),
            size,
        })
    }

    async fn get(&self, key: &str) -> AppResult<ByteStream> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    AppError::not_found(format!("Object not found: {key}"))
                } else {
                    AppError::with_source(
                        ErrorKind::StorageRead,
                        format!("Failed to fetch object {key}"),
                        service_error,
                    )
                }
            })?;

        let reader = response.body.into_async_read();
        Ok(Box::pin(ReaderStream::new(reader)))
    }

    async fn get_bytes(&self, key: &str) -> AppResult<Bytes> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    AppError::not_found(format!("Object not found: {key}"))
                } else {
                    AppError::with_source(
                        ErrorKind::StorageRead,
                        format!("Failed to fetch object {key}"),
                        service_error,
                    )
                }
            })?;

        let aggregated = response.body.collect().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageRead,
                format!("Failed to read object {key}"),
                e,
            )
        })?;

        Ok(aggregated.into_bytes())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        // DeleteObject succeeds for absent keys, which matches the
        // idempotent delete contract.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::StorageWrite,
                    format!("Failed to delete object {key}"),
                    e,
                )
            })?;

        debug!(key, bucket = %self.bucket, "Deleted object");
        Ok(())
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> AppResult<String> {
        let presigning = PresigningConfig::expires_in(ttl).map_err(|e| {
            AppError::with_source(
                ErrorKind::InvalidOperation,
                format!("Invalid signed URL lifetime {}s", ttl.as_secs()),
                e,
            )
        })?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::StorageRead,
                    format!("Failed to presign object {key}"),
                    e,
                )
            })?;

        Ok(request.uri().to_string())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok())
    }
}
