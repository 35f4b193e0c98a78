//! Scoring API server.

use std::sync::Arc;

use scoring_api::config::Settings;
use scoring_api::logging::init_tracing;
use scoring_api::store::{MemoryStore, RetryingStore};
use scoring_api::telemetry::TracingSink;
use scoring_api::web::{self, AppState};
use scoring_api::Dispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings)?;

    let store = RetryingStore::new(MemoryStore::new(), settings.retry());
    let dispatcher = Dispatcher::new(
        Arc::new(store),
        settings.authenticator(),
        settings.cache_ttl(),
    );

    tracing::info!(
        port = settings.port,
        cache_ttl_secs = settings.cache_ttl_secs,
        store_retries = settings.store_retries,
        "starting scoring api"
    );
    web::serve(&settings, AppState::new(dispatcher, Arc::new(TracingSink))).await
}
