//! Analytics object store configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Object store type discriminator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStoreType {
    /// Filesystem-based storage (local or mounted).
    #[default]
    Filesystem,
    /// Amazon S3 (requires `s3` feature).
    #[cfg(feature = "s3")]
    S3,
}

/// Configuration for the analytics projection's object store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Object store type.
    #[serde(rename = "type")]
    pub store_type: ObjectStoreType,

    /// Filesystem store configuration.
    pub filesystem: FilesystemStoreConfig,

    /// S3 store configuration (requires `s3` feature).
    #[cfg(feature = "s3")]
    pub s3: S3StoreConfig,
}

/// Filesystem object store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesystemStoreConfig {
    /// Base directory; partition keys become paths beneath it.
    pub base_path: PathBuf,
}

impl Default for FilesystemStoreConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("/var/shelfstream/analytics"),
        }
    }
}

/// S3 object store configuration.
#[cfg(feature = "s3")]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct S3StoreConfig {
    /// S3 bucket name.
    pub bucket: String,
    /// Optional key prefix within the bucket.
    pub prefix: Option<String>,
    /// AWS region.
    pub region: Option<String>,
    /// Custom endpoint URL (for S3-compatible services like MinIO).
    pub endpoint: Option<String>,
}

#[cfg(feature = "s3")]
impl Default for S3StoreConfig {
    fn default() -> Self {
        Self {
            bucket: "bookstore-analytics-dev".to_string(),
            prefix: None,
            region: None,
            endpoint: None,
        }
    }
}
