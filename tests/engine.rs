use std::fs;
use std::path::Path;
use std::sync::Arc;

use coursedex::catalog::{DocumentStore, MemoryCatalog};
use coursedex::extract::PlainTextExtractor;
use coursedex::search::HashingEmbedder;
use coursedex::{Config, DocumentRecord, EngineComponents, RetrievalEngine, SearchMode};
use tempfile::TempDir;

const ML_NOTES: &str = "Machine learning is a field of study in computer science. \
Supervised machine learning uses labelled examples. \
Unsupervised machine learning finds structure in unlabelled data.";

const BIOLOGY_NOTES: &str = "Photosynthesis converts light energy into chemical energy. \
It takes place inside the chloroplasts of plant cells.";

struct Harness {
    dir: TempDir,
    catalog: Arc<MemoryCatalog>,
    engine: RetrievalEngine,
}

fn config(data_dir: &Path) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = data_dir.to_path_buf();
    config.embedding.provider = "hashing".to_string();
    config.embedding.dimensions = 64;
    config
}

async fn engine_over(catalog: Arc<MemoryCatalog>, data_dir: &Path) -> RetrievalEngine {
    let components = EngineComponents {
        documents: catalog.clone(),
        query_log: catalog,
        embedder: Arc::new(HashingEmbedder::new(64)),
        extractor: Arc::new(PlainTextExtractor::new()),
        store: None,
    };
    RetrievalEngine::start(components, &config(data_dir)).await.unwrap()
}

async fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(MemoryCatalog::new());
    let engine = engine_over(catalog.clone(), dir.path()).await;
    Harness {
        dir,
        catalog,
        engine,
    }
}

impl Harness {
    async fn upload(&self, collection: &str, name: &str, body: &str) -> String {
        let path = self.dir.path().join(name);
        fs::write(&path, body).unwrap();
        let doc = DocumentRecord::new(collection, path.to_str().unwrap(), "Dr. Rivera");
        let id = doc.id.clone();
        self.catalog.add_document(doc).await.unwrap();
        id
    }

    async fn course(&self) -> (String, String) {
        let ml = self.upload("cs101", "ml.txt", ML_NOTES).await;
        let bio = self.upload("cs101", "bio.md", BIOLOGY_NOTES).await;
        let report = self.engine.index_collection("cs101", false).await;
        assert!(report.success, "{}", report.message);
        (ml, bio)
    }
}

#[tokio::test]
async fn test_keyword_search_counts_occurrences() {
    let h = harness().await;
    let (ml, _) = h.course().await;

    let request = h
        .engine
        .request("cs101", "machine learning")
        .mode("keyword")
        .top_k(5);
    let report = h.engine.search(&request).await;

    assert!(report.success);
    assert_eq!(report.result_count, 1);
    assert_eq!(report.results[0].document_id, ml);
    assert_eq!(report.results[0].keyword_count, Some(3));
    assert_eq!(report.results[0].uploader, "Dr. Rivera");
}

#[tokio::test]
async fn test_empty_collection_has_nothing_to_index() {
    let h = harness().await;
    let report = h.engine.index_collection("empty", false).await;

    assert!(!report.success);
    assert_eq!(report.processed_count, 0);
    assert_eq!(report.total_count, 0);
}

#[tokio::test]
async fn test_vector_search_on_unindexed_collection_is_empty() {
    let h = harness().await;
    let report = h.engine.search(&h.engine.request("never", "anything")).await;

    assert!(report.success);
    assert_eq!(report.result_count, 0);
    assert!(report.results.is_empty());
}

#[tokio::test]
async fn test_exact_chunk_text_scores_one() {
    let h = harness().await;
    let (ml, _) = h.course().await;

    let chunks = h.catalog.chunks(&ml).await.unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].vector_position, Some(0));

    let report = h
        .engine
        .search(&h.engine.request("cs101", &chunks[0].content))
        .await;
    assert!(report.success);
    let top = &report.results[0];
    assert_eq!(top.document_id, ml);
    assert_eq!(top.mode, SearchMode::Vector);
    assert_eq!(top.chunk_index, Some(0));
    assert!((top.similarity.unwrap() - 1.0).abs() < 1e-4);
    assert_eq!(top.content, chunks[0].content);
}

#[tokio::test]
async fn test_hybrid_combines_both_signals() {
    let h = harness().await;
    let (ml, _) = h.course().await;

    let request = h
        .engine
        .request("cs101", "machine learning")
        .mode("hybrid")
        .min_similarity(0.0);
    let report = h.engine.search(&request).await;

    assert!(report.success);
    assert_eq!(report.mode, "hybrid");
    let top = &report.results[0];
    assert_eq!(top.document_id, ml);
    assert_eq!(top.keyword_count, Some(3));
    let expected = top.similarity.unwrap() * 0.7 + 0.3 * 0.3;
    assert!((top.hybrid_score.unwrap() - expected).abs() < 1e-5);

    let ids: Vec<&str> = report.results.iter().map(|r| r.document_id.as_str()).collect();
    let mut unique = ids.clone();
    unique.dedup();
    assert_eq!(ids.len(), unique.len());
}

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let h = harness().await;
    h.course().await;
    let indexed = h.engine.collection_stats("cs101").await.vector_stats.vector_count;

    let first = h.engine.rebuild_collection("cs101").await;
    let second = h.engine.rebuild_collection("cs101").await;

    assert!(first.success && second.success);
    assert_eq!(first.chunk_count, second.chunk_count);
    let stats = h.engine.collection_stats("cs101").await;
    assert_eq!(stats.vector_stats.vector_count, indexed);
    assert_eq!(stats.vector_stats.vector_count, second.chunk_count);
}

#[tokio::test]
async fn test_incremental_index_only_adds_new_documents() {
    let h = harness().await;
    h.course().await;
    let before = h.engine.collection_stats("cs101").await.vector_stats.vector_count;

    h.upload("cs101", "more.txt", &ML_NOTES.replace("Machine", "Deep")).await;
    let report = h.engine.index_collection("cs101", false).await;

    assert_eq!(report.processed_count, 1);
    assert_eq!(report.total_count, 3);
    let stats = h.engine.collection_stats("cs101").await;
    assert_eq!(stats.vector_stats.vector_count, before + report.chunk_count);
    assert_eq!(stats.vectorized_documents, 3);
    assert_eq!(stats.vectorization_rate, 100.0);
}

#[tokio::test]
async fn test_invalid_mode_and_empty_query_are_rejected() {
    let h = harness().await;
    h.course().await;

    let invalid = h
        .engine
        .search(&h.engine.request("cs101", "energy").mode("semantic").actor("s1"))
        .await;
    assert!(!invalid.success);
    assert!(invalid.error.unwrap().contains("semantic"));

    let empty = h.engine.search(&h.engine.request("cs101", "").actor("s1")).await;
    assert!(!empty.success);
    assert!(empty.results.is_empty());

    assert!(h.engine.search_history("s1", 10).await.is_empty());
}

#[tokio::test]
async fn test_history_records_searches_newest_first() {
    let h = harness().await;
    h.course().await;

    for query in ["energy", "chloroplasts"] {
        let report = h
            .engine
            .search(&h.engine.request("cs101", query).mode("keyword").actor("s1"))
            .await;
        assert!(report.success);
    }

    let history = h.engine.search_history("s1", 10).await;
    let queries: Vec<&str> = history.iter().map(|e| e.query.as_str()).collect();
    assert_eq!(queries, vec!["chloroplasts", "energy"]);
    assert_eq!(history[1].result_count, 1);
    assert!(h.engine.search_history("someone-else", 10).await.is_empty());
}

#[tokio::test]
async fn test_retrieve_context_returns_chunk_text() {
    let h = harness().await;
    let (ml, _) = h.course().await;
    let chunk = h.catalog.chunks(&ml).await.unwrap().remove(0);

    let context = h.engine.retrieve_context("cs101", &chunk.content).await;
    assert!(!context.is_empty());
    assert!(context.len() <= 3);
    assert_eq!(context[0], chunk.content);
}

#[tokio::test]
async fn test_suggest_from_document_text() {
    let h = harness().await;
    h.course().await;

    let words = h.engine.suggest("cs101", "label", 10).await;
    assert_eq!(words, vec!["labelled", "unlabelled"]);
}

#[tokio::test]
async fn test_index_survives_restart() {
    let h = harness().await;
    let (ml, _) = h.course().await;

    let reopened = engine_over(h.catalog.clone(), h.dir.path()).await;
    let chunk = h.catalog.chunks(&ml).await.unwrap().remove(0);
    let report = reopened.search(&reopened.request("cs101", &chunk.content)).await;

    assert!(report.success);
    assert_eq!(report.results[0].document_id, ml);
}

#[tokio::test]
async fn test_delete_collection_clears_index() {
    let h = harness().await;
    h.course().await;

    assert!(h.engine.delete_collection("cs101").await.unwrap());
    assert!(!h.engine.delete_collection("cs101").await.unwrap());

    let stats = h.engine.collection_stats("cs101").await;
    assert_eq!(stats.vector_stats.vector_count, 0);
    assert_eq!(stats.total_documents, 2);
}
