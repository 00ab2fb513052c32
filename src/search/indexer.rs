use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Mutex as PassLock;
use tracing::{debug, error, info, warn};

use crate::catalog::DocumentStore;
use crate::config::ChunkingConfig;
use crate::error::{EngineError, Result};
use crate::extract::TextExtractor;
use crate::types::{Chunk, DocumentRecord, IndexReport};

use super::chunker::Chunker;
use super::embedder::Embedder;
use super::store::{ChunkDescriptor, DocumentMetadata, IndexEntry, VectorStore};

/// Extracted text ready for chunking, with the metadata copied into the registry.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl PreparedDocument {
    pub fn from_record(doc: &DocumentRecord, text: String, page_count: usize, word_count: usize) -> Self {
        Self {
            id: doc.id.clone(),
            text,
            metadata: DocumentMetadata {
                filename: doc.filename.clone(),
                file_type: doc.file_type.clone(),
                uploaded_at: Some(doc.uploaded_at),
                uploader: doc.uploader_name.clone(),
                page_count,
                word_count,
            },
        }
    }
}

/// Write path: extract, chunk, embed and append to the collection index.
pub struct Indexer {
    documents: Arc<dyn DocumentStore>,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    extractor: Arc<dyn TextExtractor>,
    chunker: Chunker,
    preview_chars: usize,
    batch_size: usize,
    passes: Mutex<HashMap<String, Arc<PassLock<()>>>>,
}

impl Indexer {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        extractor: Arc<dyn TextExtractor>,
        config: &ChunkingConfig,
        batch_size: usize,
    ) -> Self {
        Self {
            documents,
            store,
            embedder,
            extractor,
            chunker: Chunker::from_config(config),
            preview_chars: config.preview_chars,
            batch_size: batch_size.max(1),
            passes: Mutex::new(HashMap::new()),
        }
    }

    fn pass_lock(&self, collection_id: &str) -> Arc<PassLock<()>> {
        let mut passes = self.passes.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(passes.entry(collection_id.to_string()).or_default())
    }

    /// Index every pending document of a collection in one batch.
    ///
    /// Extraction failures are counted and skipped. With `force`, every
    /// document is re-extracted and the collection index is rebuilt from the
    /// batch instead of appended to. Passes over the same collection run one
    /// at a time; a queued pass sees the documents the previous one vectorized.
    pub async fn index_collection(&self, collection_id: &str, force: bool) -> Result<IndexReport> {
        let lock = self.pass_lock(collection_id);
        let _pass = lock.lock().await;
        debug!(collection = collection_id, "indexing pass started");
        self.run_pass(collection_id, force).await
    }

    async fn run_pass(&self, collection_id: &str, force: bool) -> Result<IndexReport> {
        let started = Instant::now();
        let documents = self
            .documents
            .get_documents(collection_id)
            .await
            .map_err(EngineError::catalog)?;

        if documents.is_empty() {
            info!(collection = collection_id, "nothing to index");
            return Ok(IndexReport::failed("No documents to index"));
        }

        if !force {
            // Surfaces a dimension mismatch before any document is extracted.
            self.store.open_or_create(collection_id).await?;
        }

        let mut batch: Vec<PreparedDocument> = Vec::new();
        let mut retained: Vec<PreparedDocument> = Vec::new();
        let mut error_count = 0;

        for doc in &documents {
            if doc.is_vectorized && !force {
                debug!(document = %doc.id, "already vectorized, skipping");
                continue;
            }

            let path = Path::new(&doc.file_path);
            if !self.extractor.is_supported(path) {
                let err = EngineError::UnsupportedFormat(doc.file_path.clone());
                warn!(document = %doc.id, "{}", err);
                continue;
            }

            let extraction = self.extractor.extract(path).await;
            if extraction.success && !extraction.text.trim().is_empty() {
                if let Err(e) = self.documents.update_content(&doc.id, &extraction.text).await {
                    error_count += 1;
                    error!(document = %doc.id, "failed to store extracted text: {:#}", e);
                    continue;
                }
                batch.push(PreparedDocument::from_record(
                    doc,
                    extraction.text,
                    extraction.page_count,
                    extraction.word_count,
                ));
                continue;
            }

            error_count += 1;
            let err = EngineError::Extraction {
                path: doc.file_path.clone(),
                reason: extraction
                    .error
                    .unwrap_or_else(|| "no text extracted".to_string()),
            };
            error!(document = %doc.id, "{}", err);

            // A forced rebuild must not orphan documents the index already covers.
            if force && doc.is_vectorized {
                if let Some(text) = doc.content() {
                    retained.push(PreparedDocument::from_record(doc, text.to_string(), 0, 0));
                }
            }
        }

        let processed_count = batch.len();
        let chunk_count = if force {
            let mut all = batch.clone();
            all.extend(retained);
            self.rebuild(collection_id, &all).await?
        } else if batch.is_empty() {
            0
        } else {
            self.add_documents(collection_id, &batch).await?
        };

        for doc in &batch {
            self.documents
                .mark_vectorized(&doc.id)
                .await
                .map_err(EngineError::catalog)?;
        }

        info!(
            collection = collection_id,
            processed = processed_count,
            errors = error_count,
            chunks = chunk_count,
            "indexing finished"
        );

        Ok(IndexReport {
            success: true,
            message: format!(
                "Indexed {} of {} documents ({} chunks)",
                processed_count,
                documents.len(),
                chunk_count
            ),
            processed_count,
            total_count: documents.len(),
            error_count,
            processing_time: started.elapsed().as_secs_f64(),
            chunk_count,
        })
    }

    /// Chunk, embed and append `docs` to the collection index.
    /// Returns the number of chunks added.
    pub async fn add_documents(&self, collection_id: &str, docs: &[PreparedDocument]) -> Result<usize> {
        let (entries, chunks) = self.prepare_entries(docs).await?;
        if entries.is_empty() {
            warn!(collection = collection_id, "documents produced no chunks");
            return Ok(0);
        }

        let positions = self.store.add(collection_id, entries).await?;
        self.save_chunks(chunks, &positions).await;
        Ok(positions.len())
    }

    /// Replace the collection index with one built from `docs` alone.
    pub async fn rebuild(&self, collection_id: &str, docs: &[PreparedDocument]) -> Result<usize> {
        let (entries, chunks) = self.prepare_entries(docs).await?;
        let positions = self.store.rebuild(collection_id, entries).await?;
        self.save_chunks(chunks, &positions).await;
        Ok(positions.len())
    }

    async fn prepare_entries(
        &self,
        docs: &[PreparedDocument],
    ) -> Result<(Vec<IndexEntry>, Vec<(String, Vec<Chunk>)>)> {
        let mut descriptors = Vec::new();
        let mut texts = Vec::new();
        let mut chunks_by_document = Vec::with_capacity(docs.len());

        for doc in docs {
            let chunks = self.chunker.split(&doc.text, &doc.id);
            for chunk in &chunks {
                descriptors.push(ChunkDescriptor {
                    document_id: doc.id.clone(),
                    chunk_index: chunk.chunk_index,
                    preview: preview(&chunk.content, self.preview_chars),
                    metadata: doc.metadata.clone(),
                });
                texts.push(chunk.content.clone());
            }
            chunks_by_document.push((doc.id.clone(), chunks));
        }

        let vectors = self.embed_texts(&texts).await?;
        let entries = descriptors
            .into_iter()
            .zip(vectors)
            .map(|(descriptor, vector)| IndexEntry { descriptor, vector })
            .collect();

        Ok((entries, chunks_by_document))
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let embeddings = self
                .embedder
                .embed_batch(batch)
                .await
                .map_err(|e| EngineError::Embedding(format!("{:#}", e)))?;
            if embeddings.len() != batch.len() {
                return Err(EngineError::Embedding(format!(
                    "provider returned {} vectors for {} texts",
                    embeddings.len(),
                    batch.len()
                )));
            }
            vectors.extend(embeddings);
        }

        Ok(vectors)
    }

    /// Record each chunk's vector position and store the chunks per document.
    async fn save_chunks(&self, chunks_by_document: Vec<(String, Vec<Chunk>)>, positions: &[usize]) {
        let mut positions = positions.iter().copied();

        for (document_id, mut chunks) in chunks_by_document {
            for chunk in &mut chunks {
                chunk.vector_position = positions.next();
            }
            if let Err(e) = self.documents.replace_chunks(&document_id, chunks).await {
                warn!(document = %document_id, "failed to store chunks: {:#}", e);
            }
        }
    }
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}
