//! Filesystem-based object storage.
//!
//! Stores objects as files under a base directory, with partition keys
//! mapped directly to relative paths:
//! ```text
//! {base_path}/t1/purchases/year=2024/month=03/day=15/p-1.json
//! ```
//!
//! ETags are the SHA-256 of the content, and conditional puts run under an
//! internal lock so check-and-rename is atomic within the process.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use super::{ObjectStore, ObjectStoreError, Precondition, Result, StoredObject};

/// Compute the content ETag for a stored object.
pub fn content_etag(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Filesystem-backed object store.
pub struct FilesystemObjectStore {
    base_path: PathBuf,
    cas_lock: Mutex<()>,
}

impl FilesystemObjectStore {
    /// Create a new filesystem object store.
    ///
    /// Creates the base directory if it doesn't exist.
    pub async fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).await?;
        Ok(Self {
            base_path,
            cas_lock: Mutex::new(()),
        })
    }

    fn path_for_key(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    /// Write atomically using temp file + rename.
    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, bytes).await?;
        fs::rename(&temp_path, path).await?;
        Ok(())
    }

    async fn current_etag(&self, path: &Path) -> Result<Option<String>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(content_etag(&bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for_key(key);
        self.write_file(&path, bytes).await?;

        debug!(key, size = bytes.len(), "stored object");
        Ok(())
    }

    async fn put_conditional(
        &self,
        key: &str,
        bytes: &[u8],
        precondition: Precondition,
    ) -> Result<()> {
        let path = self.path_for_key(key);

        let _guard = self.cas_lock.lock().await;

        let current = self.current_etag(&path).await?;
        match (&precondition, current) {
            (Precondition::IfAbsent, None) => {}
            (Precondition::IfMatch(expected), Some(actual)) if *expected == actual => {}
            _ => return Err(ObjectStoreError::PreconditionFailed(key.to_string())),
        }

        self.write_file(&path, bytes).await?;

        debug!(key, size = bytes.len(), "stored object conditionally");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>> {
        let path = self.path_for_key(key);

        match fs::read(&path).await {
            Ok(bytes) => {
                let etag = content_etag(&bytes);
                Ok(Some(StoredObject { bytes, etag }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
