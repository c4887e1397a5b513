//! Retry utilities: backoff builders for the pipeline's network calls.
//!
//! Uses `backon` for exponential backoff with jitter. Provides standard
//! backoff configurations for transient backend failures and rollup write
//! conflicts.

use std::time::Duration;

use backon::ExponentialBuilder;

/// Backoff for transient search backend failures (connect errors, timeouts).
///
/// - Min delay: 100ms
/// - Max delay: 5s
/// - Max attempts: caller-configured
/// - Jitter enabled
pub fn transient_backoff(max_retries: usize) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(5))
        .with_max_times(max_retries)
        .with_jitter()
}

/// Backoff for daily summary write conflicts (concurrent contributors).
///
/// - Min delay: 10ms
/// - Max delay: 2s
/// - Max attempts: 10
/// - Jitter enabled
pub fn conflict_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(10))
        .with_max_delay(Duration::from_secs(2))
        .with_max_times(10)
        .with_jitter()
}
