//! Partition key derivation.
//!
//! Keys are a pure function of tenant id and the entity's own event-time
//! timestamp. The processing clock is never consulted here.

use chrono::{DateTime, Datelike, Utc};

/// Date partition segments, `year=YYYY/month=MM/day=DD`.
pub fn partition_prefix(timestamp: &DateTime<Utc>) -> String {
    format!(
        "year={:04}/month={:02}/day={:02}",
        timestamp.year(),
        timestamp.month(),
        timestamp.day()
    )
}

/// Calendar date label, `YYYY-MM-DD`.
pub fn date_label(timestamp: &DateTime<Utc>) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        timestamp.year(),
        timestamp.month(),
        timestamp.day()
    )
}

/// Key of a purchase event record.
pub fn purchase_object_key(
    tenant_id: &str,
    purchase_id: &str,
    created_at: &DateTime<Utc>,
) -> String {
    format!(
        "{}/purchases/{}/{}.json",
        tenant_id,
        partition_prefix(created_at),
        purchase_id
    )
}

/// Key of a tenant's daily rollup document.
pub fn daily_summary_key(tenant_id: &str, created_at: &DateTime<Utc>) -> String {
    format!(
        "{}/daily_summary/{}/summary.json",
        tenant_id,
        partition_prefix(created_at)
    )
}
