//! Amazon S3 object storage.
//!
//! Stores analytics objects in an S3 bucket:
//! ```text
//! s3://{bucket}/{prefix}/{tenant}/purchases/year=YYYY/month=MM/day=DD/{id}.json
//! ```
//!
//! Conditional puts map to S3's `If-Match`/`If-None-Match` guards, so the
//! compare-and-swap on the rollup document is enforced server side.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::debug;

use super::{ObjectStore, ObjectStoreError, Precondition, Result, StoredObject};

/// S3-backed object store.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    prefix: Option<String>,
}

impl S3ObjectStore {
    /// Create a new S3 object store.
    ///
    /// Uses default credentials from the environment (AWS_ACCESS_KEY_ID,
    /// AWS_SECRET_ACCESS_KEY, or IAM role).
    pub async fn new(bucket: impl Into<String>, prefix: Option<String>) -> Result<Self> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);

        Ok(Self {
            client,
            bucket: bucket.into(),
            prefix,
        })
    }

    /// Create with custom endpoint (for S3-compatible services like MinIO).
    pub async fn with_endpoint(
        bucket: impl Into<String>,
        prefix: Option<String>,
        endpoint: &str,
        region: Option<&str>,
    ) -> Result<Self> {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region.to_string()));
        }

        let config = config_loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .endpoint_url(endpoint)
            .force_path_style(true) // Required for MinIO and most S3-compatible services
            .build();

        let client = Client::from_conf(s3_config);

        Ok(Self {
            client,
            bucket: bucket.into(),
            prefix,
        })
    }

    /// Create with explicit client (for testing).
    pub fn with_client(client: Client, bucket: impl Into<String>, prefix: Option<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix,
        }
    }

    fn object_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix, key),
            None => key.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let object_key = self.object_key(key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .content_type("application/json")
            .body(ByteStream::from(bytes.to_vec()))
            .send()
            .await
            .map_err(|e| ObjectStoreError::PutFailed {
                key: key.to_string(),
                reason: format!("S3 upload failed: {}", e),
            })?;

        debug!(key, size = bytes.len(), bucket = %self.bucket, "stored object in S3");
        Ok(())
    }

    async fn put_conditional(
        &self,
        key: &str,
        bytes: &[u8],
        precondition: Precondition,
    ) -> Result<()> {
        let object_key = self.object_key(key);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .content_type("application/json")
            .body(ByteStream::from(bytes.to_vec()));

        request = match &precondition {
            Precondition::IfAbsent => request.if_none_match("*"),
            Precondition::IfMatch(etag) => request.if_match(etag),
        };

        request.send().await.map_err(|e| {
            let detail = format!("{:?}", e);
            if detail.contains("PreconditionFailed") || detail.contains("412") {
                ObjectStoreError::PreconditionFailed(key.to_string())
            } else {
                ObjectStoreError::PutFailed {
                    key: key.to_string(),
                    reason: format!("S3 conditional upload failed: {}", e),
                }
            }
        })?;

        debug!(key, size = bytes.len(), bucket = %self.bucket, "stored object in S3 conditionally");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>> {
        let object_key = self.object_key(key);

        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let detail = format!("{:?}", e);
                if detail.contains("NoSuchKey") || detail.contains("404") {
                    return Ok(None);
                }
                return Err(ObjectStoreError::GetFailed {
                    key: key.to_string(),
                    reason: format!("S3 download failed: {}", e),
                });
            }
        };

        let etag = response.e_tag().unwrap_or_default().to_string();
        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| ObjectStoreError::GetFailed {
                key: key.to_string(),
                reason: format!("S3 body read failed: {}", e),
            })?
            .into_bytes()
            .to_vec();

        Ok(Some(StoredObject { bytes, etag }))
    }
}
