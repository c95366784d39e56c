//! Startup-time backend selection.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use cirrus_core::config::StorageConfig;
use cirrus_core::traits::{ByteStream, ObjectStore, StorageObjectRef};
use cirrus_core::{AppError, AppResult};

#[cfg(feature = "local")]
use crate::backends::local::LocalObjectStore;
#[cfg(feature = "s3")]
use crate::backends::s3::S3ObjectStore;

/// Routes every storage call to the one backend chosen from configuration
/// at startup. There is no per-request driver switching.
#[derive(Debug, Clone)]
pub struct StorageRouter {
    store: Arc<dyn ObjectStore>,
}

impl StorageRouter {
    /// Builds the backend named by `config.driver`.
    pub async fn from_config(config: &StorageConfig) -> AppResult<Self> {
        let store: Arc<dyn ObjectStore> = match config.driver.as_str() {
            #[cfg(feature = "local")]
            "local" => Arc::new(LocalObjectStore::new(&config.local.root_path).await?),
            #[cfg(feature = "s3")]
            "s3" => Arc::new(S3ObjectStore::new(&config.s3).await?),
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown or disabled storage driver: {other}"
                )));
            }
        };

        Ok(Self { store })
    }

    /// Wraps an already-built backend. Used by tests and custom wiring.
    pub fn with_store(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn driver_name(&self) -> &str {
        self.store.driver_name()
    }

    /// `None` for backends without a bucket, i.e. local disk.
    pub fn bucket_name(&self) -> Option<&str> {
        self.store.bucket_name()
    }

    pub async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> AppResult<StorageObjectRef> {
        self.store.put(key, data, content_type).await
    }

    pub async fn get(&self, key: &str) -> AppResult<ByteStream> {
        self.store.get(key).await
    }

    pub async fn get_bytes(&self, key: &str) -> AppResult<Bytes> {
        self.store.get_bytes(key).await
    }

    pub async fn delete(&self, key: &str) -> AppResult<()> {
        self.store.delete(key).await
    }

    pub async fn signed_url(&self, key: &str, ttl: Duration) -> AppResult<String> {
        self.store.signed_url(key, ttl).await
    }

    pub async fn health_check(&self) -> AppResult<bool> {
        self.store.health_check().await
    }
}
