//! In-memory search backend for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{DeleteOutcome, Result, SearchBackend, SearchError};

#[derive(Default)]
struct MockState {
    /// Index name to creation body.
    indices: HashMap<String, Value>,
    /// Index name to documents by id.
    documents: HashMap<String, BTreeMap<String, Value>>,
}

/// Search backend that keeps indices and documents in memory.
///
/// Useful for testing projection behavior without a cluster. Write failures
/// can be injected to exercise error paths.
#[derive(Default)]
pub struct MockSearchBackend {
    state: RwLock<MockState>,
    fail_writes: AtomicBool,
    create_calls: AtomicUsize,
}

impl MockSearchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail with a backend error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Get a stored document.
    pub async fn document(&self, index: &str, id: &str) -> Option<Value> {
        self.state
            .read()
            .await
            .documents
            .get(index)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Number of documents in an index.
    pub async fn document_count(&self, index: &str) -> usize {
        self.state
            .read()
            .await
            .documents
            .get(index)
            .map_or(0, BTreeMap::len)
    }

    /// Names of indices created so far, sorted.
    pub async fn created_indices(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().await.indices.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of create_index calls received.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn write_error(&self, context: &str) -> Option<SearchError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Some(SearchError::Backend {
                status: 500,
                context: context.to_string(),
                body: "injected failure".to_string(),
            })
        } else {
            None
        }
    }
}

#[async_trait]
impl SearchBackend for MockSearchBackend {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        Ok(self.state.read().await.indices.contains_key(index))
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.write_error("index creation") {
            return Err(err);
        }
        self.state
            .write()
            .await
            .indices
            .insert(index.to_string(), body.clone());
        Ok(())
    }

    async fn put_document(&self, index: &str, id: &str, doc: &Value) -> Result<()> {
        if let Some(err) = self.write_error("document index") {
            return Err(err);
        }
        self.state
            .write()
            .await
            .documents
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), doc.clone());
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<DeleteOutcome> {
        if let Some(err) = self.write_error("document delete") {
            return Err(err);
        }
        let mut state = self.state.write().await;
        match state.documents.get_mut(index) {
            Some(docs) if docs.contains_key(id) => {
                docs.remove(id);
                Ok(DeleteOutcome::Deleted)
            }
            _ => Ok(DeleteOutcome::NotFound),
        }
    }
}
