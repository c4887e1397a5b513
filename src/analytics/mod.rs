//! Date-partitioned analytics projection.
//!
//! Purchases fan out into two objects per tenant: an event record per
//! purchase under a `year=/month=/day=` partition, and one mutable daily
//! rollup per tenant/date. Both live in an object store behind the
//! [`ObjectStore`] trait.
//!
//! ## Storage Backends
//!
//! - [`FilesystemObjectStore`] - local filesystem storage
//! - `S3ObjectStore` (feature: s3) - Amazon S3
//!
//! ## Conditional Writes
//!
//! The rollup document is shared across concurrent pipeline invocations, so
//! backends expose compare-and-swap puts keyed on an ETag. Readers get the
//! ETag with the bytes and pass it back to detect a conflicting writer.

mod config;
mod filesystem;
mod partition;
#[cfg(feature = "s3")]
mod s3;
mod summary;
mod writer;

pub use config::{AnalyticsConfig, FilesystemStoreConfig, ObjectStoreType};
#[cfg(feature = "s3")]
pub use config::S3StoreConfig;
pub use filesystem::FilesystemObjectStore;
pub use partition::{daily_summary_key, date_label, partition_prefix, purchase_object_key};
#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;
pub use summary::DailySummaryAggregator;
pub use writer::AnalyticsEventWriter;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during object store operations.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("failed to store object at {key}: {reason}")]
    PutFailed { key: String, reason: String },

    #[error("failed to read object at {key}: {reason}")]
    GetFailed { key: String, reason: String },

    #[error("write precondition failed for {0}")]
    PreconditionFailed(String),

    #[error("object serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for object store operations.
pub type Result<T> = std::result::Result<T, ObjectStoreError>;

/// Object bytes plus the ETag of the version read.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub etag: String,
}

/// Guard applied to a conditional put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The key must not exist yet.
    IfAbsent,
    /// The current version's ETag must match.
    IfMatch(String),
}

/// Object storage backend for analytics records.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object unconditionally, replacing any prior version.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Store an object only if the precondition holds.
    ///
    /// A conflicting concurrent write surfaces as
    /// [`ObjectStoreError::PreconditionFailed`] so the caller can re-read
    /// and retry.
    async fn put_conditional(&self, key: &str, bytes: &[u8], precondition: Precondition)
        -> Result<()>;

    /// Retrieve an object and its ETag, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<StoredObject>>;
}

/// Initialize an object store based on configuration.
///
/// # Errors
///
/// Returns error if the configured store type requires an unavailable
/// feature or the backend cannot be initialized.
pub async fn init_object_store(
    config: &AnalyticsConfig,
) -> std::result::Result<Arc<dyn ObjectStore>, Box<dyn std::error::Error>> {
    use tracing::info;

    match config.store_type {
        ObjectStoreType::Filesystem => {
            info!(
                path = %config.filesystem.base_path.display(),
                "analytics store: filesystem"
            );
            let store = FilesystemObjectStore::new(&config.filesystem.base_path).await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "s3")]
        ObjectStoreType::S3 => {
            info!(
                bucket = %config.s3.bucket,
                prefix = ?config.s3.prefix,
                region = ?config.s3.region,
                endpoint = ?config.s3.endpoint,
                "analytics store: s3"
            );
            let store = match &config.s3.endpoint {
                Some(endpoint) => {
                    S3ObjectStore::with_endpoint(
                        &config.s3.bucket,
                        config.s3.prefix.clone(),
                        endpoint,
                        config.s3.region.as_deref(),
                    )
                    .await?
                }
                None => S3ObjectStore::new(&config.s3.bucket, config.s3.prefix.clone()).await?,
            };
            Ok(Arc::new(store))
        }
    }
}
