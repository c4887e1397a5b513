//! Immutable-intent purchase event records.

use std::sync::Arc;

use tracing::debug;

use crate::domain::PurchaseSnapshot;

use super::{purchase_object_key, ObjectStore, Result};

/// Persists one event record per processed purchase at its partition key.
pub struct AnalyticsEventWriter {
    store: Arc<dyn ObjectStore>,
}

impl AnalyticsEventWriter {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Serialize the full snapshot, line items included, to its partition
    /// path. A MODIFY for the same purchase lands on the same key and
    /// replaces the prior record (store-latest-state).
    pub async fn write_event(&self, purchase: &PurchaseSnapshot) -> Result<String> {
        let key = purchase_object_key(
            &purchase.tenant_id,
            &purchase.purchase_id,
            &purchase.created_at,
        );
        let bytes = serde_json::to_vec(purchase)?;
        self.store.put(&key, &bytes).await?;

        debug!(
            purchase_id = %purchase.purchase_id,
            key,
            "purchase event exported"
        );
        Ok(key)
    }
}
