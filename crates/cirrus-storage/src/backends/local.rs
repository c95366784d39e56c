//! Filesystem-backed object store.

use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::debug;

use cirrus_core::traits::{ByteStream, ObjectStore, StorageObjectRef};
use cirrus_core::{AppError, AppResult, ErrorKind};

/// Objects stored as plain files under a root directory.
///
/// Keys map onto relative paths; the namespace directories they imply are
/// created on first write.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Creates the root directory if needed and returns the store.
    pub async fn new(root_path: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root_path.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageWrite,
                format!("Failed to create storage root {}", root.display()),
                e,
            )
        })?;

        Ok(Self { root })
    }

    /// Maps a key onto a path under the root. Only normal components are
    /// kept, so leading slashes and `..` segments cannot escape the root.
    fn resolve(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        for component in Path::new(key).components() {
            if let Component::Normal(part) = component {
                path.push(part);
            }
        }
        path
    }

    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::StorageWrite,
                    format!("Failed to create directory {}", parent.display()),
                    e,
                )
            })?;
        }

        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn driver_name(&self) -> &str {
        "local"
    }

    fn bucket_name(&self) -> Option<&str> {
        None
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> AppResult<StorageObjectRef> {
        let path = self.resolve(key);
        self.ensure_parent(&path).await?;

        fs::write(&path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageWrite,
                format!("Failed to write object {key}"),
                e,
            )
        })?;

        debug!(key, bytes = data.len(), content_type, "Stored object");

        Ok(StorageObjectRef {
            key: key.to_string(),
            size: data.len() as u64,
        })
    }

    async fn get(&self, key: &str) -> AppResult<ByteStream> {
        let path = self.resolve(key);

        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Object not found: {key}"))
            } else {
                AppError::with_source(
                    ErrorKind::StorageRead,
                    format!("Failed to open object {key}"),
                    e,
                )
            }
        })?;

        Ok(Box::pin(ReaderStream::new(file)))
    }

    async fn get_bytes(&self, key: &str) -> AppResult<Bytes> {
        let path = self.resolve(key);

        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::not_found(format!("Object not found: {key}")))
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::StorageRead,
                format!("Failed to read object {key}"),
                e,
            )),
        }
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.resolve(key);

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, "Deleted object");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(key, "Delete of absent object ignored");
                Ok(())
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::StorageWrite,
                format!("Failed to delete object {key}"),
                e,
            )),
        }
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> AppResult<String> {
        // Local disk has no external endpoint to sign for. The reference is
        // opaque to callers and resolved by the application's own download
        // path.
        let expires = unix_now() + ttl.as_secs();
        Ok(format!("internal://objects/{key}?expires={expires}"))
    }

    async fn health_check(&self) -> AppResult<bool> {
        let probe_key = ".cirrus-health-probe";
        let payload = Bytes::from_static(b"probe");

        self.put(probe_key, payload.clone(), None).await?;
        let read_back = self.get_bytes(probe_key).await?;
        self.delete(probe_key).await?;

        Ok(read_back == payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    async fn store() -> (tempfile::TempDir, LocalObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn put_creates_namespaces_and_get_streams_back() {
        let (_dir, store) = store().await;

        let data = Bytes::from_static(b"hello world");
        let stored = store
            .put("7/abc/report.txt", data.clone(), Some("text/plain"))
            .await
            .unwrap();
        assert_eq!(stored.size, 11);

        let mut stream = store.get("7/abc/report.txt").await.unwrap();
        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, data);

        assert_eq!(store.get_bytes("7/abc/report.txt").await.unwrap(), data);
    }

    #[tokio::test]
    async fn missing_object_reads_as_not_found() {
        let (_dir, store) = store().await;

        let err = store.get_bytes("7/missing/file.bin").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let err = store.get("7/missing/file.bin").await.err().unwrap();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_dir, store) = store().await;

        store
            .put("x/one.bin", Bytes::from_static(b"1"), None)
            .await
            .unwrap();
        store.delete("x/one.bin").await.unwrap();
        // Second delete of the same key is still a success.
        store.delete("x/one.bin").await.unwrap();

        assert_eq!(
            store.get_bytes("x/one.bin").await.unwrap_err().kind,
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn keys_cannot_escape_the_root() {
        let (dir, store) = store().await;

        let resolved = store.resolve("../../etc/passwd");
        assert!(resolved.starts_with(dir.path()));

        let resolved = store.resolve("/absolute/key");
        assert!(resolved.starts_with(dir.path()));
    }

    #[tokio::test]
    async fn signed_url_is_internal_and_time_limited() {
        let (_dir, store) = store().await;

        let url = store
            .signed_url("7/abc/report.txt", Duration::from_secs(600))
            .await
            .unwrap();

        assert!(url.starts_with("internal://objects/7/abc/report.txt?expires="));
        let expires: u64 = url.rsplit('=').next().unwrap().parse().unwrap();
        assert!(expires >= unix_now() + 590);
    }

    #[tokio::test]
    async fn health_probe_round_trips() {
        let (_dir, store) = store().await;
        assert!(store.health_check().await.unwrap());
    }
}
