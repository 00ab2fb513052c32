use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::types::{Chunk, DocumentRecord, QueryLogEntry};

use super::{CatalogData, DocumentStore, QueryLog};

/// Catalog persisted as one JSON file, rewritten after every change.
pub struct JsonCatalog {
    path: PathBuf,
    data: RwLock<CatalogData>,
}

impl JsonCatalog {
    /// Open the catalog at `path`; a missing file starts an empty catalog.
    pub fn open(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let content = fs::read(&path)
                .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
            serde_json::from_slice(&content)
                .with_context(|| format!("Failed to parse catalog: {}", path.display()))?
        } else {
            CatalogData::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn atomic_write(&self, data: &CatalogData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("tmp");
        let json = serde_json::to_vec_pretty(data)?;
        fs::write(&temp_path, json)?;
        fs::rename(temp_path, &self.path)?;

        Ok(())
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut CatalogData) -> Result<T>) -> Result<T> {
        let mut data = self.data.write().map_err(|e| anyhow::anyhow!("{}", e))?;
        let value = f(&mut *data)?;
        self.atomic_write(&data)?;
        Ok(value)
    }
}

#[async_trait]
impl DocumentStore for JsonCatalog {
    async fn get_documents(&self, collection_id: &str) -> Result<Vec<DocumentRecord>> {
        let data = self.data.read().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(data.documents_of(collection_id))
    }

    async fn add_document(&self, document: DocumentRecord) -> Result<()> {
        self.mutate(|data| data.add(document))
    }

    async fn update_content(&self, document_id: &str, text: &str) -> Result<()> {
        self.mutate(|data| data.update_content(document_id, text))
    }

    async fn mark_vectorized(&self, document_id: &str) -> Result<()> {
        self.mutate(|data| data.mark_vectorized(document_id))
    }

    async fn replace_chunks(&self, document_id: &str, chunks: Vec<Chunk>) -> Result<()> {
        self.mutate(|data| data.replace_chunks(document_id, chunks))
    }

    async fn chunks(&self, document_id: &str) -> Result<Vec<Chunk>> {
        let data = self.data.read().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(data.chunks_of(document_id))
    }
}

#[async_trait]
impl QueryLog for JsonCatalog {
    async fn log_query(&self, entry: QueryLogEntry) -> Result<()> {
        self.mutate(|data| {
            data.queries.push(entry);
            Ok(())
        })
    }

    async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<QueryLogEntry>> {
        let data = self.data.read().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(data.history(user_id, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SearchMode;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_changes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");

        let mut doc = DocumentRecord::new("cs101", "notes/week1.txt", "lee");
        doc.id = "doc-1".to_string();
        {
            let catalog = JsonCatalog::open(path.clone()).unwrap();
            catalog.add_document(doc).await.unwrap();
            catalog.update_content("doc-1", "Week one covers tensors").await.unwrap();
            catalog.mark_vectorized("doc-1").await.unwrap();
            catalog
                .log_query(QueryLogEntry::new("u1", "cs101", "tensors", SearchMode::Hybrid, 1))
                .await
                .unwrap();
        }

        let reopened = JsonCatalog::open(path).unwrap();
        let docs = reopened.get_documents("cs101").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].is_processed && docs[0].is_vectorized);
        assert_eq!(docs[0].text.as_deref(), Some("Week one covers tensors"));

        let history = reopened.history("u1", 10).await.unwrap();
        assert_eq!(history[0].query, "tensors");
        assert_eq!(history[0].mode, SearchMode::Hybrid);
    }

    #[tokio::test]
    async fn test_failed_mutation_not_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        let catalog = JsonCatalog::open(path.clone()).unwrap();

        assert!(catalog.mark_vectorized("ghost").await.is_err());
        assert!(!path.exists());
    }
}
