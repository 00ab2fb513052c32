use anyhow::Result;
use async_trait::async_trait;
use std::sync::RwLock;

use crate::types::{Chunk, DocumentRecord, QueryLogEntry};

use super::{CatalogData, DocumentStore, QueryLog};

/// Process-local catalog, used by tests and embedding callers that keep
/// their own persistence.
#[derive(Default)]
pub struct MemoryCatalog {
    data: RwLock<CatalogData>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<DocumentRecord>) -> Result<Self> {
        let catalog = Self::new();
        {
            let mut data = catalog.data.write().map_err(|e| anyhow::anyhow!("{}", e))?;
            for doc in documents {
                data.add(doc)?;
            }
        }
        Ok(catalog)
    }
}

#[async_trait]
impl DocumentStore for MemoryCatalog {
    async fn get_documents(&self, collection_id: &str) -> Result<Vec<DocumentRecord>> {
        let data = self.data.read().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(data.documents_of(collection_id))
    }

    async fn add_document(&self, document: DocumentRecord) -> Result<()> {
        let mut data = self.data.write().map_err(|e| anyhow::anyhow!("{}", e))?;
        data.add(document)
    }

    async fn update_content(&self, document_id: &str, text: &str) -> Result<()> {
        let mut data = self.data.write().map_err(|e| anyhow::anyhow!("{}", e))?;
        data.update_content(document_id, text)
    }

    async fn mark_vectorized(&self, document_id: &str) -> Result<()> {
        let mut data = self.data.write().map_err(|e| anyhow::anyhow!("{}", e))?;
        data.mark_vectorized(document_id)
    }

    async fn replace_chunks(&self, document_id: &str, chunks: Vec<Chunk>) -> Result<()> {
        let mut data = self.data.write().map_err(|e| anyhow::anyhow!("{}", e))?;
        data.replace_chunks(document_id, chunks)
    }

    async fn chunks(&self, document_id: &str) -> Result<Vec<Chunk>> {
        let data = self.data.read().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(data.chunks_of(document_id))
    }
}

#[async_trait]
impl QueryLog for MemoryCatalog {
    async fn log_query(&self, entry: QueryLogEntry) -> Result<()> {
        let mut data = self.data.write().map_err(|e| anyhow::anyhow!("{}", e))?;
        data.queries.push(entry);
        Ok(())
    }

    async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<QueryLogEntry>> {
        let data = self.data.read().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(data.history(user_id, limit))
    }
}
