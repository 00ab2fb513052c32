mod json;
mod memory;

pub use json::JsonCatalog;
pub use memory::MemoryCatalog;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{Chunk, DocumentRecord, QueryLogEntry};

/// Where course documents and their chunks live.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents of a collection, most recently uploaded first.
    async fn get_documents(&self, collection_id: &str) -> Result<Vec<DocumentRecord>>;
    async fn add_document(&self, document: DocumentRecord) -> Result<()>;
    /// Store extracted text and flag the document as processed.
    async fn update_content(&self, document_id: &str, text: &str) -> Result<()>;
    async fn mark_vectorized(&self, document_id: &str) -> Result<()>;
    /// Replace every chunk previously stored for the document.
    async fn replace_chunks(&self, document_id: &str, chunks: Vec<Chunk>) -> Result<()>;
    async fn chunks(&self, document_id: &str) -> Result<Vec<Chunk>>;
}

/// Append-only record of searches.
#[async_trait]
pub trait QueryLog: Send + Sync {
    async fn log_query(&self, entry: QueryLogEntry) -> Result<()>;
    /// Most recent entries for `user_id`, newest first.
    async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<QueryLogEntry>>;
}

/// Shared state behind both catalog implementations.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogData {
    documents: Vec<DocumentRecord>,
    #[serde(default)]
    chunks: HashMap<String, Vec<Chunk>>,
    #[serde(default)]
    queries: Vec<QueryLogEntry>,
}

impl CatalogData {
    fn documents_of(&self, collection_id: &str) -> Vec<DocumentRecord> {
        let mut docs: Vec<DocumentRecord> = self
            .documents
            .iter()
            .filter(|d| d.collection_id == collection_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        docs
    }

    fn add(&mut self, document: DocumentRecord) -> Result<()> {
        if self.documents.iter().any(|d| d.id == document.id) {
            return Err(anyhow!("Document {} already exists", document.id));
        }
        self.documents.push(document);
        Ok(())
    }

    fn document_mut(&mut self, document_id: &str) -> Result<&mut DocumentRecord> {
        self.documents
            .iter_mut()
            .find(|d| d.id == document_id)
            .ok_or_else(|| anyhow!("Unknown document: {}", document_id))
    }

    fn update_content(&mut self, document_id: &str, text: &str) -> Result<()> {
        let doc = self.document_mut(document_id)?;
        doc.text = Some(text.to_string());
        doc.is_processed = true;
        Ok(())
    }

    fn mark_vectorized(&mut self, document_id: &str) -> Result<()> {
        self.document_mut(document_id)?.is_vectorized = true;
        Ok(())
    }

    fn replace_chunks(&mut self, document_id: &str, chunks: Vec<Chunk>) -> Result<()> {
        self.document_mut(document_id)?;
        self.chunks.insert(document_id.to_string(), chunks);
        Ok(())
    }

    fn chunks_of(&self, document_id: &str) -> Vec<Chunk> {
        self.chunks.get(document_id).cloned().unwrap_or_default()
    }

    fn history(&self, user_id: &str, limit: usize) -> Vec<QueryLogEntry> {
        self.queries
            .iter()
            .rev()
            .filter(|q| q.user_id == user_id)
            .take(limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SearchMode;
    use chrono::{Duration, Utc};

    fn doc(collection: &str, id: &str, age_minutes: i64) -> DocumentRecord {
        let mut doc = DocumentRecord::new(collection, &format!("{}.txt", id), "prof");
        doc.id = id.to_string();
        doc.uploaded_at = Utc::now() - Duration::minutes(age_minutes);
        doc
    }

    #[test]
    fn test_documents_newest_first_per_collection() {
        let mut data = CatalogData::default();
        data.add(doc("c1", "old", 30)).unwrap();
        data.add(doc("c1", "new", 1)).unwrap();
        data.add(doc("c2", "other", 5)).unwrap();

        let ids: Vec<String> = data.documents_of("c1").into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut data = CatalogData::default();
        data.add(doc("c1", "a", 0)).unwrap();
        assert!(data.add(doc("c1", "a", 0)).is_err());
    }

    #[test]
    fn test_update_content_marks_processed() {
        let mut data = CatalogData::default();
        data.add(doc("c1", "a", 0)).unwrap();
        data.update_content("a", "hello").unwrap();
        data.mark_vectorized("a").unwrap();

        let stored = &data.documents_of("c1")[0];
        assert_eq!(stored.text.as_deref(), Some("hello"));
        assert!(stored.is_processed);
        assert!(stored.is_vectorized);
        assert!(data.mark_vectorized("missing").is_err());
    }

    #[test]
    fn test_replace_chunks_discards_previous() {
        let mut data = CatalogData::default();
        data.add(doc("c1", "a", 0)).unwrap();
        let chunk = |i: usize| Chunk {
            document_id: "a".to_string(),
            chunk_index: i,
            content: format!("chunk {}", i),
            size: 7,
            vector_position: Some(i),
        };

        data.replace_chunks("a", vec![chunk(0), chunk(1)]).unwrap();
        data.replace_chunks("a", vec![chunk(0)]).unwrap();
        assert_eq!(data.chunks_of("a").len(), 1);
        assert!(data.chunks_of("unknown").is_empty());
    }

    #[test]
    fn test_history_newest_first_with_limit() {
        let mut data = CatalogData::default();
        for q in ["first", "second", "third"] {
            data.queries
                .push(QueryLogEntry::new("u1", "c1", q, SearchMode::Keyword, 0));
        }
        data.queries
            .push(QueryLogEntry::new("u2", "c1", "other", SearchMode::Vector, 1));

        let queries: Vec<String> = data.history("u1", 2).into_iter().map(|q| q.query).collect();
        assert_eq!(queries, vec!["third", "second"]);
    }
}
