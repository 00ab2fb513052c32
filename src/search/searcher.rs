use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::catalog::DocumentStore;
use crate::error::{EngineError, Result};
use crate::types::{DocumentRecord, SearchHit, SearchMode};

use super::embedder::Embedder;
use super::hybrid::HybridRanker;
use super::keyword::KeywordMatcher;
use super::store::VectorStore;

/// Read path: answers a query in one of the three modes.
pub struct Searcher {
    documents: Arc<dyn DocumentStore>,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    keyword: KeywordMatcher,
    ranker: HybridRanker,
}

impl Searcher {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        keyword: KeywordMatcher,
        ranker: HybridRanker,
    ) -> Self {
        Self {
            documents,
            store,
            embedder,
            keyword,
            ranker,
        }
    }

    pub async fn search(
        &self,
        collection_id: &str,
        query: &str,
        mode: SearchMode,
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<SearchHit>> {
        match mode {
            SearchMode::Vector => self.vector_search(collection_id, query, top_k, min_similarity).await,
            SearchMode::Keyword => self.keyword_search(collection_id, query, top_k).await,
            SearchMode::Hybrid => self.hybrid_search(collection_id, query, top_k, min_similarity).await,
        }
    }

    /// Nearest chunks joined back to their documents.
    /// Hits whose document is no longer in the catalog are dropped.
    pub async fn vector_search(
        &self,
        collection_id: &str,
        query: &str,
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<SearchHit>> {
        let query_vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| EngineError::Embedding(format!("{:#}", e)))?;

        let hits = self
            .store
            .search(collection_id, &query_vector, top_k, min_similarity)
            .await?;
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let documents = self.documents_by_id(collection_id).await?;
        let mut results = Vec::with_capacity(hits.len());

        for hit in hits {
            let Some(doc) = documents.get(&hit.descriptor.document_id) else {
                debug!(document = %hit.descriptor.document_id, "indexed document missing from catalog");
                continue;
            };

            let content = self
                .chunk_text(&doc.id, hit.descriptor.chunk_index)
                .await
                .unwrap_or_else(|| hit.descriptor.preview.clone());

            results.push(SearchHit {
                document_id: doc.id.clone(),
                filename: doc.filename.clone(),
                file_type: doc.file_type.clone(),
                uploaded_at: doc.uploaded_at,
                uploader: doc.uploader_name.clone(),
                similarity: Some(hit.score),
                keyword_count: None,
                hybrid_score: None,
                chunk_index: Some(hit.descriptor.chunk_index),
                preview_text: hit.descriptor.preview,
                content,
                mode: SearchMode::Vector,
            });
        }

        Ok(results)
    }

    pub async fn keyword_search(
        &self,
        collection_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let documents = self
            .documents
            .get_documents(collection_id)
            .await
            .map_err(EngineError::catalog)?;
        let by_id: HashMap<&str, &DocumentRecord> =
            documents.iter().map(|d| (d.id.as_str(), d)).collect();

        let results = self
            .keyword
            .search(&documents, query, top_k)
            .into_iter()
            .filter_map(|hit| {
                let doc = by_id.get(hit.document_id.as_str())?;
                Some(SearchHit {
                    document_id: hit.document_id,
                    filename: doc.filename.clone(),
                    file_type: doc.file_type.clone(),
                    uploaded_at: doc.uploaded_at,
                    uploader: doc.uploader_name.clone(),
                    similarity: None,
                    keyword_count: Some(hit.keyword_count),
                    hybrid_score: None,
                    chunk_index: None,
                    preview_text: hit.preview.clone(),
                    content: hit.preview,
                    mode: SearchMode::Keyword,
                })
            })
            .collect();

        Ok(results)
    }

    pub async fn hybrid_search(
        &self,
        collection_id: &str,
        query: &str,
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<SearchHit>> {
        let vector_results = self
            .vector_search(collection_id, query, top_k, min_similarity)
            .await?;
        let keyword_results = self.keyword_search(collection_id, query, top_k).await?;
        Ok(self.ranker.merge(vector_results, keyword_results, top_k))
    }

    /// Words longer than two characters that contain `query`, in document order.
    pub async fn suggest(&self, collection_id: &str, query: &str, limit: usize) -> Result<Vec<String>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let documents = self
            .documents
            .get_documents(collection_id)
            .await
            .map_err(EngineError::catalog)?;

        let mut suggestions: Vec<String> = Vec::new();
        for text in documents.iter().filter_map(DocumentRecord::content) {
            for word in text.split_whitespace() {
                let word = word.to_lowercase();
                if word.chars().count() > 2
                    && word.contains(&needle)
                    && word != needle
                    && !suggestions.contains(&word)
                {
                    suggestions.push(word);
                    if suggestions.len() >= limit {
                        return Ok(suggestions);
                    }
                }
            }
        }

        Ok(suggestions)
    }

    async fn documents_by_id(&self, collection_id: &str) -> Result<HashMap<String, DocumentRecord>> {
        let documents = self
            .documents
            .get_documents(collection_id)
            .await
            .map_err(EngineError::catalog)?;
        Ok(documents.into_iter().map(|d| (d.id.clone(), d)).collect())
    }

    async fn chunk_text(&self, document_id: &str, chunk_index: usize) -> Option<String> {
        let chunks = self.documents.chunks(document_id).await.ok()?;
        chunks
            .into_iter()
            .find(|c| c.chunk_index == chunk_index)
            .map(|c| c.content)
    }
}
