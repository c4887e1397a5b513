//! Daily rollup maintenance.
//!
//! The rollup document is the one resource mutated by multiple concurrent
//! pipeline invocations. A blind read-modify-write here loses updates: two
//! writers read the same base state and the second write erases the first's
//! increment. Every write is therefore conditional on the version read, and
//! a conflict re-runs the whole read-merge-write with backoff.

use std::sync::Arc;

use backon::Retryable;
use tracing::{debug, warn};

use crate::domain::{DailySummary, PurchaseSnapshot};
use crate::utils::retry::conflict_backoff;

use super::{daily_summary_key, date_label, ObjectStore, ObjectStoreError, Precondition, Result};

/// Merges purchase contributions into per-tenant daily summaries.
pub struct DailySummaryAggregator {
    store: Arc<dyn ObjectStore>,
}

impl DailySummaryAggregator {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Fold one purchase into its tenant/date summary.
    ///
    /// Returns the summary as written. Counters only grow; contributions
    /// from concurrent invocations are never silently discarded.
    pub async fn contribute(&self, purchase: &PurchaseSnapshot) -> Result<DailySummary> {
        let key = daily_summary_key(&purchase.tenant_id, &purchase.created_at);

        (|| async { self.try_contribute(&key, purchase).await })
            .retry(conflict_backoff())
            .when(|e: &ObjectStoreError| matches!(e, ObjectStoreError::PreconditionFailed(_)))
            .notify(|_err, dur| {
                warn!(retry_in = ?dur, "summary write conflict, re-reading");
            })
            .await
    }

    async fn try_contribute(&self, key: &str, purchase: &PurchaseSnapshot) -> Result<DailySummary> {
        let (mut summary, precondition) = match self.store.get(key).await? {
            Some(current) => (
                serde_json::from_slice(&current.bytes)?,
                Precondition::IfMatch(current.etag),
            ),
            None => (
                DailySummary::empty(purchase.tenant_id.as_str(), date_label(&purchase.created_at)),
                Precondition::IfAbsent,
            ),
        };

        summary.absorb(purchase);

        let bytes = serde_json::to_vec(&summary)?;
        self.store.put_conditional(key, &bytes, precondition).await?;

        debug!(
            key,
            total_purchases = summary.total_purchases,
            "daily summary updated"
        );
        Ok(summary)
    }
}
