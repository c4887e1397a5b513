//! shelfstream-pipeline: change batch processor
//!
//! Reads one batch of change records (JSON) from a file argument or stdin,
//! projects it into the search index and the analytics store, and prints the
//! completion summary as JSON.
//!
//! ## Architecture
//! ```text
//! [Change Batch] -> [Dispatcher] -> [Decoder] -> [Search Projector]
//!                                            \-> [Event Writer] -> [Daily Summary]
//! ```
//!
//! ## Configuration
//! - SHELFSTREAM_CONFIG: path to a YAML config file
//! - SHELFSTREAM__SEARCH__ENDPOINT: search backend base URL
//! - SHELFSTREAM__ANALYTICS__TYPE: `filesystem` or `s3`
//! - SHELFSTREAM_LOG: tracing filter (default: info)

use std::io::Read;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelfstream::analytics::{init_object_store, AnalyticsEventWriter, DailySummaryAggregator};
use shelfstream::change::ChangeBatch;
use shelfstream::config::{Config, LOG_ENV_VAR};
use shelfstream::pipeline::Dispatcher;
use shelfstream::search::{HttpSearchBackend, SearchBackend, SearchProjector};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(None).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Starting shelfstream pipeline");

    let store = init_object_store(&config.analytics).await?;
    let backend: Arc<dyn SearchBackend> = Arc::new(HttpSearchBackend::new(&config.search)?);

    let dispatcher = Dispatcher::new(
        SearchProjector::new(backend, config.search.analyzer.clone()),
        AnalyticsEventWriter::new(store.clone()),
        DailySummaryAggregator::new(store),
    );

    // A batch that cannot be parsed at all is the only top-level failure;
    // the upstream delivery mechanism redelivers it.
    let input = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let batch: ChangeBatch = serde_json::from_str(&input)?;

    let report = dispatcher.dispatch(&batch.records).await;

    println!("{}", serde_json::to_string(&report.into_result())?);
    Ok(())
}
