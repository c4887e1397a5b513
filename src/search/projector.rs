//! Book projection into the per-tenant search index.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::domain::BookSnapshot;

use super::{index_name, DeleteOutcome, IndexLifecycle, Result, SearchBackend};

/// Completion input for typeahead queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestInput {
    pub input: Vec<String>,
}

/// Document stored in the books index, one per book, id = book_id.
///
/// Money fields serialize as JSON numbers to match the index's double
/// mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchDocument {
    pub book_id: String,
    pub tenant_id: String,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub editorial: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub description: String,
    pub cover_image_url: String,
    pub stock_quantity: u32,
    pub publication_year: i32,
    pub language: String,
    pub pages: u32,
    pub rating: f64,
    pub created_at: String,
    pub updated_at: String,
    pub is_active: bool,
    pub suggest: SuggestInput,
}

impl From<&BookSnapshot> for SearchDocument {
    fn from(book: &BookSnapshot) -> Self {
        Self {
            book_id: book.book_id.clone(),
            tenant_id: book.tenant_id.clone(),
            isbn: book.isbn.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            editorial: book.editorial.clone(),
            category: book.category.clone(),
            price: book.price,
            description: book.description.clone(),
            cover_image_url: book.cover_image_url.clone(),
            stock_quantity: book.stock_quantity,
            publication_year: book.publication_year,
            language: book.language.clone(),
            pages: book.pages,
            rating: book.rating,
            created_at: book.created_at.clone(),
            updated_at: book.updated_at.clone(),
            is_active: book.is_active,
            suggest: SuggestInput {
                input: vec![
                    book.title.clone(),
                    book.author.clone(),
                    book.category.clone(),
                ],
            },
        }
    }
}

/// Applies book change events to the search index.
pub struct SearchProjector {
    backend: Arc<dyn SearchBackend>,
    lifecycle: IndexLifecycle,
}

impl SearchProjector {
    pub fn new(backend: Arc<dyn SearchBackend>, analyzer: impl Into<String>) -> Self {
        let lifecycle = IndexLifecycle::new(backend.clone(), analyzer);
        Self { backend, lifecycle }
    }

    /// Index the full document under id = book_id, replacing any prior
    /// version. Applying the same snapshot twice stores the same document.
    pub async fn upsert(&self, book: &BookSnapshot) -> Result<()> {
        let index = self.lifecycle.ensure(&book.tenant_id).await?;
        let doc = serde_json::to_value(SearchDocument::from(book))?;
        self.backend.put_document(&index, &book.book_id, &doc).await?;

        debug!(
            book_id = %book.book_id,
            index,
            "book indexed"
        );
        Ok(())
    }

    /// Delete the document by id. Absence already satisfies the desired end
    /// state, so a not-found outcome is success; the index is not created.
    pub async fn remove(&self, tenant_id: &str, book_id: &str) -> Result<()> {
        let index = index_name(tenant_id);

        match self.backend.delete_document(&index, book_id).await? {
            DeleteOutcome::Deleted => debug!(book_id, index, "book removed from index"),
            DeleteOutcome::NotFound => {
                debug!(book_id, index, "book already absent from index");
            }
        }
        Ok(())
    }
}
