use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// Chunked object content, as produced by storage backends.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Receipt for a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageObjectRef {
    /// Backend key the object was stored under.
    pub key: String,
    /// Number of bytes written.
    pub size: u64,
}

/// Contract implemented by every storage backend.
///
/// Object keys are namespace-qualified paths such as
/// `"42/6f9b1c.../report.pdf"`. Backends create missing namespaces on write
/// and treat deletion of an absent key as success.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Short identifier such as `"local"` or `"s3"`.
    fn driver_name(&self) -> &str;

    /// Bucket backing this store, when the backend has one.
    fn bucket_name(&self) -> Option<&str>;

    /// Stores `data` under `key`, replacing any previous object.
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> AppResult<StorageObjectRef>;

    /// Opens the object for streaming reads.
    async fn get(&self, key: &str) -> AppResult<ByteStream>;

    /// Reads the whole object into memory.
    async fn get_bytes(&self, key: &str) -> AppResult<Bytes>;

    /// Removes the object. Deleting an absent key is logged and reported as
    /// success.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Produces a time-limited URL for fetching the object directly.
    async fn signed_url(&self, key: &str, ttl: Duration) -> AppResult<String>;

    /// Verifies the backend is reachable and usable.
    async fn health_check(&self) -> AppResult<bool>;
}
