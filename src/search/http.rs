//! HTTP search backend over the Elasticsearch-compatible REST API.
//!
//! One `reqwest::Client` is built at construction and reused for every call;
//! callers share the backend through an `Arc` instead of reaching for
//! process-global state.

use async_trait::async_trait;
use backon::Retryable;
use reqwest::{Response, StatusCode};
use tracing::warn;

use crate::utils::retry::transient_backoff;

use super::{DeleteOutcome, Result, SearchBackend, SearchConfig, SearchError};

/// Search backend talking to a real cluster.
pub struct HttpSearchBackend {
    client: reqwest::Client,
    endpoint: String,
    max_retries: usize,
}

impl HttpSearchBackend {
    /// Build a backend from configuration.
    ///
    /// The connection timeout applies per request; transient transport
    /// failures (connect errors, timeouts) are retried with backoff up to
    /// the configured attempt count.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
        })
    }

    fn index_url(&self, index: &str) -> String {
        format!("{}/{}", self.endpoint, index)
    }

    fn document_url(&self, index: &str, id: &str) -> String {
        format!("{}/{}/_doc/{}", self.endpoint, index, id)
    }

    /// Send a request, retrying transient transport failures.
    async fn send_with_retry<F>(&self, context: &str, send: F) -> Result<Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let response = (|| async { send().send().await })
            .retry(transient_backoff(self.max_retries))
            .when(|e: &reqwest::Error| e.is_connect() || e.is_timeout())
            .notify(|err, dur| {
                warn!(error = %err, retry_in = ?dur, context, "transient search backend failure");
            })
            .await?;
        Ok(response)
    }

    async fn backend_error(context: &str, response: Response) -> SearchError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        SearchError::Backend {
            status,
            context: context.to_string(),
            body,
        }
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        let url = self.index_url(index);
        let response = self
            .send_with_retry("index existence check", || self.client.head(&url))
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status == StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            Err(Self::backend_error("index existence check", response).await)
        }
    }

    async fn create_index(&self, index: &str, body: &serde_json::Value) -> Result<()> {
        let url = self.index_url(index);
        let response = self
            .send_with_retry("index creation", || self.client.put(&url).json(body))
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        // A concurrent writer may have created the index between the
        // existence check and this call; the desired state holds either way.
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        if text.contains("resource_already_exists_exception") {
            return Ok(());
        }

        Err(SearchError::Backend {
            status,
            context: "index creation".to_string(),
            body: text,
        })
    }

    async fn put_document(&self, index: &str, id: &str, doc: &serde_json::Value) -> Result<()> {
        let url = self.document_url(index, id);
        let response = self
            .send_with_retry("document index", || self.client.put(&url).json(doc))
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::backend_error("document index", response).await)
        }
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<DeleteOutcome> {
        let url = self.document_url(index, id);
        let response = self
            .send_with_retry("document delete", || self.client.delete(&url))
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(DeleteOutcome::Deleted)
        } else if status == StatusCode::NOT_FOUND {
            Ok(DeleteOutcome::NotFound)
        } else {
            Err(Self::backend_error("document delete", response).await)
        }
    }
}
