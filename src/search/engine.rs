use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::catalog::{DocumentStore, QueryLog};
use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::extract::TextExtractor;
use crate::types::{CollectionStats, IndexReport, QueryLogEntry, SearchMode, SearchReport};

use super::embedder::Embedder;
use super::hybrid::{HybridRanker, HybridWeights};
use super::indexer::Indexer;
use super::keyword::KeywordMatcher;
use super::searcher::Searcher;
use super::store::{FileIndexStore, IndexStats, VectorStore};

/// Hits returned as grounding context for a question.
pub const CONTEXT_TOP_K: usize = 3;
/// Minimum similarity for a chunk to count as grounding context.
pub const CONTEXT_MIN_SIMILARITY: f32 = 0.3;

/// Collaborators the engine is assembled from.
pub struct EngineComponents {
    pub documents: Arc<dyn DocumentStore>,
    pub query_log: Arc<dyn QueryLog>,
    pub embedder: Arc<dyn Embedder>,
    pub extractor: Arc<dyn TextExtractor>,
    /// Defaults to a [`FileIndexStore`] under the configured data dir.
    pub store: Option<Arc<dyn VectorStore>>,
}

/// One search call. Built with [`RetrievalEngine::request`] so unset
/// options take the configured defaults.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub collection_id: String,
    pub query: String,
    pub mode: String,
    pub top_k: usize,
    pub min_similarity: f32,
    pub actor_id: Option<String>,
}

impl SearchRequest {
    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    pub fn actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }
}

/// Retrieval façade: indexing, search in three modes, stats and history.
///
/// Construct once and share behind an `Arc`; every operation takes `&self`.
/// Indexing and search report failures in their returned reports rather
/// than as `Err`.
pub struct RetrievalEngine {
    documents: Arc<dyn DocumentStore>,
    query_log: Arc<dyn QueryLog>,
    store: Arc<dyn VectorStore>,
    indexer: Indexer,
    searcher: Searcher,
    config: Config,
}

impl RetrievalEngine {
    /// Assemble the engine after confirming the embedding provider answers.
    pub async fn start(components: EngineComponents, config: &Config) -> Result<Self> {
        let embedder = &components.embedder;
        embedder
            .health_check()
            .await
            .map_err(|e| EngineError::ProviderUnavailable(format!("{:#}", e)))?;
        info!(
            model = embedder.model_name(),
            dimension = embedder.dimensions(),
            "embedding provider ready"
        );

        Ok(Self::new(components, config))
    }

    /// Assemble the engine without probing the provider.
    pub fn new(components: EngineComponents, config: &Config) -> Self {
        let EngineComponents {
            documents,
            query_log,
            embedder,
            extractor,
            store,
        } = components;

        let store = store.unwrap_or_else(|| {
            Arc::new(FileIndexStore::new(
                config.storage.index_dir(),
                embedder.dimensions(),
                embedder.model_name(),
            ))
        });

        let indexer = Indexer::new(
            documents.clone(),
            store.clone(),
            embedder.clone(),
            extractor,
            &config.chunking,
            config.embedding.batch_size,
        );

        let search = &config.search;
        let searcher = Searcher::new(
            documents.clone(),
            store.clone(),
            embedder,
            KeywordMatcher::new(search.preview_window),
            HybridRanker::new(HybridWeights {
                vector: search.vector_weight,
                keyword: search.keyword_weight,
                keyword_saturation: search.keyword_saturation,
            }),
        );

        Self {
            documents,
            query_log,
            store,
            indexer,
            searcher,
            config: config.clone(),
        }
    }

    /// A search request for `collection_id` with configured defaults.
    pub fn request(&self, collection_id: &str, query: &str) -> SearchRequest {
        SearchRequest {
            collection_id: collection_id.to_string(),
            query: query.to_string(),
            mode: SearchMode::Vector.to_string(),
            top_k: self.config.search.top_k,
            min_similarity: self.config.search.min_similarity,
            actor_id: None,
        }
    }

    /// Extract, chunk, embed and index the collection's pending documents.
    pub async fn index_collection(&self, collection_id: &str, force_reindex: bool) -> IndexReport {
        let started = Instant::now();
        match self.indexer.index_collection(collection_id, force_reindex).await {
            Ok(report) => report,
            Err(e) => {
                error!(collection = collection_id, "indexing failed: {}", e);
                IndexReport {
                    processing_time: started.elapsed().as_secs_f64(),
                    ..IndexReport::failed(format!("Indexing failed: {}", e))
                }
            }
        }
    }

    /// Discard the collection index and rebuild it from every document.
    pub async fn rebuild_collection(&self, collection_id: &str) -> IndexReport {
        self.index_collection(collection_id, true).await
    }

    pub async fn search(&self, request: &SearchRequest) -> SearchReport {
        let started = Instant::now();
        let query = request.query.trim();

        let outcome = match Self::validate(query, &request.mode) {
            Ok(mode) => self
                .searcher
                .search(
                    &request.collection_id,
                    query,
                    mode,
                    request.top_k,
                    request.min_similarity,
                )
                .await
                .map(|results| (mode, results)),
            Err(e) => Err(e),
        };

        let search_time = started.elapsed().as_secs_f64();
        match outcome {
            Ok((mode, results)) => {
                info!(
                    collection = %request.collection_id,
                    mode = mode.as_str(),
                    results = results.len(),
                    "search completed"
                );
                if let Some(actor) = &request.actor_id {
                    self.record_query(actor, &request.collection_id, query, mode, results.len())
                        .await;
                }
                SearchReport {
                    success: true,
                    query: query.to_string(),
                    mode: mode.to_string(),
                    result_count: results.len(),
                    results,
                    search_time,
                    error: None,
                }
            }
            Err(e) => {
                warn!(collection = %request.collection_id, "search rejected: {}", e);
                SearchReport {
                    success: false,
                    query: request.query.clone(),
                    mode: request.mode.clone(),
                    results: Vec::new(),
                    result_count: 0,
                    search_time,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn validate(query: &str, mode: &str) -> Result<SearchMode> {
        if query.is_empty() {
            return Err(EngineError::EmptyQuery);
        }
        mode.parse()
    }

    async fn record_query(
        &self,
        actor: &str,
        collection_id: &str,
        query: &str,
        mode: SearchMode,
        result_count: usize,
    ) {
        let entry = QueryLogEntry::new(actor, collection_id, query, mode, result_count);
        if let Err(e) = self.query_log.log_query(entry).await {
            warn!(user = actor, "failed to record query: {:#}", e);
        }
    }

    /// Document counts plus index statistics. Never fails; unreadable
    /// sources report zeros.
    pub async fn collection_stats(&self, collection_id: &str) -> CollectionStats {
        let documents = match self.documents.get_documents(collection_id).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(collection = collection_id, "failed to read documents: {:#}", e);
                Vec::new()
            }
        };
        let vector_stats = self.store.stats(collection_id).await.unwrap_or_else(|e| {
            warn!(collection = collection_id, "failed to read index stats: {}", e);
            IndexStats::empty(collection_id)
        });

        let total = documents.len();
        let processed = documents.iter().filter(|d| d.is_processed).count();
        let vectorized = documents.iter().filter(|d| d.is_vectorized).count();
        let rate = |n: usize| {
            if total == 0 {
                0.0
            } else {
                n as f64 / total as f64 * 100.0
            }
        };

        CollectionStats {
            total_documents: total,
            processed_documents: processed,
            vectorized_documents: vectorized,
            vector_stats,
            processing_rate: rate(processed),
            vectorization_rate: rate(vectorized),
        }
    }

    /// Remove the collection's index artifacts. Returns whether any existed.
    pub async fn delete_collection(&self, collection_id: &str) -> Result<bool> {
        self.store.delete(collection_id).await
    }

    pub async fn suggest(&self, collection_id: &str, query: &str, limit: usize) -> Vec<String> {
        self.searcher
            .suggest(collection_id, query, limit)
            .await
            .unwrap_or_else(|e| {
                warn!(collection = collection_id, "suggestions unavailable: {}", e);
                Vec::new()
            })
    }

    /// Most recent queries of `user_id`, newest first.
    pub async fn search_history(&self, user_id: &str, limit: usize) -> Vec<QueryLogEntry> {
        self.query_log
            .history(user_id, limit)
            .await
            .unwrap_or_else(|e| {
                warn!(user = user_id, "failed to read history: {:#}", e);
                Vec::new()
            })
    }

    /// Chunk texts most similar to `question`, for grounding a chat answer.
    pub async fn retrieve_context(&self, collection_id: &str, question: &str) -> Vec<String> {
        let request = self
            .request(collection_id, question)
            .top_k(CONTEXT_TOP_K)
            .min_similarity(CONTEXT_MIN_SIMILARITY);

        let report = self.search(&request).await;
        report.results.into_iter().map(|hit| hit.content).collect()
    }
}
