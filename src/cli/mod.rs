mod add;
mod args;
mod history;
mod index;
mod search;
mod stats;

pub use add::run_add;
pub use args::{Args, Command};
pub use history::run_history;
pub use index::{run_clear, run_index};
pub use search::{run_search, run_suggest, SearchArgs};
pub use stats::run_stats;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::catalog::JsonCatalog;
use crate::config::Config;
use crate::extract::PlainTextExtractor;
use crate::search::{create_embedder, Embedder, EngineComponents, RetrievalEngine};

pub fn open_catalog(config: &Config) -> Result<Arc<JsonCatalog>> {
    let path = config.storage.catalog_path();
    Ok(Arc::new(JsonCatalog::open(path)?))
}

/// Build the engine over the on-disk catalog. With `require_provider`, an unreachable
/// embedding provider is an error.
pub async fn open_engine(config: &Config, require_provider: bool) -> Result<RetrievalEngine> {
    let catalog = open_catalog(config)?;
    let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&config.embedding)?);

    let components = EngineComponents {
        documents: catalog.clone(),
        query_log: catalog,
        embedder,
        extractor: Arc::new(PlainTextExtractor::new()),
        store: None,
    };

    if require_provider {
        RetrievalEngine::start(components, config)
            .await
            .with_context(|| format!("Embedding provider '{}' is not ready", config.embedding.provider))
    } else {
        Ok(RetrievalEngine::new(components, config))
    }
}
