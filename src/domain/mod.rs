//! Domain snapshots carried by change records, and the daily rollup document.
//!
//! Snapshots are full attribute images of a primary-store entity at the time
//! a change record was emitted. The pipeline never merges partial updates:
//! a MODIFY replaces the previous snapshot wholesale.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Full image of a book entity, identity `(tenant_id, book_id)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSnapshot {
    pub book_id: String,
    pub tenant_id: String,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub editorial: String,
    pub category: String,
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
}

/// One line of a purchase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseLineItem {
    pub book_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub title: String,
    pub author: String,
}

/// Full image of a purchase entity, identity `(tenant_id, purchase_id)`.
///
/// `created_at` is event time and drives analytics partitioning, so it must
/// parse at decode time. `updated_at` is carried verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseSnapshot {
    pub purchase_id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub total_amount: Decimal,
    pub status: String,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: String,
    pub items: Vec<PurchaseLineItem>,
}

impl PurchaseSnapshot {
    /// Total units across all line items.
    pub fn items_sold(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

/// Mutable rollup document, one per `(tenant_id, date)`.
///
/// Counters only ever increase under this pipeline. Merging a purchase is a
/// pure operation; persistence and conflict handling live in the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    /// Calendar date label, `YYYY-MM-DD`.
    pub date: String,
    pub tenant_id: String,
    pub total_purchases: u64,
    pub total_revenue: Decimal,
    pub total_items_sold: u64,
    pub payment_methods: BTreeMap<String, u64>,
}

impl DailySummary {
    /// Zero-valued summary for a tenant and date.
    pub fn empty(tenant_id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            tenant_id: tenant_id.into(),
            total_purchases: 0,
            total_revenue: Decimal::ZERO,
            total_items_sold: 0,
            payment_methods: BTreeMap::new(),
        }
    }

    /// Merge one purchase's contribution into the totals.
    pub fn absorb(&mut self, purchase: &PurchaseSnapshot) {
        self.total_purchases += 1;
        self.total_revenue += purchase.total_amount;
        self.total_items_sold += purchase.items_sold();
        *self
            .payment_methods
            .entry(purchase.payment_method.clone())
            .or_insert(0) += 1;
    }
}
