//! Search index projection.
//!
//! The search backend is an Elasticsearch-compatible HTTP API, one index per
//! tenant. Components talk to it through the [`SearchBackend`] trait so the
//! projection logic is testable against the in-memory [`MockSearchBackend`].
//!
//! ## Components
//!
//! - [`HttpSearchBackend`] - reqwest client with retry on transient failures
//! - [`IndexLifecycle`] - ensures a tenant's index exists with its mapping
//! - [`SearchProjector`] - applies book upserts/removals to the index

mod config;
mod http;
mod lifecycle;
mod mock;
mod projector;

pub use config::SearchConfig;
pub use http::HttpSearchBackend;
pub use lifecycle::{books_index_body, index_name, IndexLifecycle};
pub use mock::MockSearchBackend;
pub use projector::{SearchDocument, SearchProjector};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from search backend operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search backend returned {status} for {context}: {body}")]
    Backend {
        status: u16,
        context: String,
        body: String,
    },

    #[error("failed to serialize search document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Outcome of a delete-by-id call.
///
/// Absence is not an error: if the document was never indexed the desired
/// end state already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Low-level search index operations.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Whether the index exists.
    async fn index_exists(&self, index: &str) -> Result<bool>;

    /// Create the index with the given settings/mappings body.
    ///
    /// Losing a creation race to a concurrent writer is success.
    async fn create_index(&self, index: &str, body: &serde_json::Value) -> Result<()>;

    /// Index a document under an explicit id, replacing any prior version.
    async fn put_document(&self, index: &str, id: &str, doc: &serde_json::Value) -> Result<()>;

    /// Delete a document by id.
    async fn delete_document(&self, index: &str, id: &str) -> Result<DeleteOutcome>;
}
