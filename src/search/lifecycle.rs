//! Per-tenant index lifecycle.
//!
//! Every document write is preceded by an `ensure` call so the index and its
//! mapping exist before the first document lands. The existence check runs
//! every time; an index dropped out of band is recreated on the next write.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use super::{Result, SearchBackend};

/// Index name for a tenant's books.
pub fn index_name(tenant_id: &str) -> String {
    format!("books_{tenant_id}")
}

/// Settings and mappings for a tenant's books index.
///
/// Identifiers and category are keywords, descriptive text gets the
/// configured language analyzer, and the completion field feeds typeahead
/// from title, author and category.
pub fn books_index_body(analyzer: &str) -> Value {
    let mut body = json!({
        "settings": {
            "analysis": {
                "analyzer": {}
            }
        },
        "mappings": {
            "properties": {
                "book_id": {"type": "keyword"},
                "tenant_id": {"type": "keyword"},
                "isbn": {"type": "keyword"},
                "category": {"type": "keyword"},
                "title": {"type": "text", "analyzer": analyzer},
                "author": {"type": "text", "analyzer": analyzer},
                "description": {"type": "text", "analyzer": analyzer},
                "price": {"type": "double"},
                "rating": {"type": "double"},
                "publication_year": {"type": "integer"},
                "stock_quantity": {"type": "integer"},
                "pages": {"type": "integer"},
                "suggest": {"type": "completion", "analyzer": "simple"},
            }
        }
    });
    body["settings"]["analysis"]["analyzer"][analyzer] = json!({"type": analyzer});
    body
}

/// Ensures a tenant's index exists before writes.
pub struct IndexLifecycle {
    backend: Arc<dyn SearchBackend>,
    analyzer: String,
}

impl IndexLifecycle {
    pub fn new(backend: Arc<dyn SearchBackend>, analyzer: impl Into<String>) -> Self {
        Self {
            backend,
            analyzer: analyzer.into(),
        }
    }

    /// Check-then-create the tenant's index. Idempotent.
    ///
    /// Returns the index name for the subsequent write.
    pub async fn ensure(&self, tenant_id: &str) -> Result<String> {
        let index = index_name(tenant_id);

        if !self.backend.index_exists(&index).await? {
            self.backend
                .create_index(&index, &books_index_body(&self.analyzer))
                .await?;
            info!(index, "search index created");
        }

        Ok(index)
    }
}
