//! Shelfstream - CDC fan-out pipeline
//!
//! Consumes change records emitted by a multi-tenant bookstore's primary
//! record store and maintains two derived projections: a per-tenant
//! full-text/autocomplete search index and a date-partitioned analytics
//! store with daily rollups.
//!
//! Data flows one way: change batch -> dispatcher -> decoder -> projectors.
//! Nothing here reads the projections back to serve queries.

pub mod analytics;
pub mod change;
pub mod config;
pub mod domain;
pub mod pipeline;
pub mod search;
pub mod utils;
