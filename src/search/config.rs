//! Search backend configuration.

use serde::Deserialize;
use std::time::Duration;

/// Connection settings for the search backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL of the search backend.
    pub endpoint: String,

    /// Language analyzer applied to text fields of new indices.
    pub analyzer: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Retry attempts for transient transport failures.
    pub max_retries: usize,
}

impl SearchConfig {
    /// Get the request timeout duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9200".to_string(),
            analyzer: "spanish".to_string(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}
