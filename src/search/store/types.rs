use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document fields copied into the registry when a chunk is indexed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    pub filename: String,
    pub file_type: String,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub uploader: String,
    #[serde(default)]
    pub page_count: usize,
    #[serde(default)]
    pub word_count: usize,
}

/// Registry record describing the vector stored at the same position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkDescriptor {
    pub document_id: String,
    pub chunk_index: usize,
    pub preview: String,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

/// A descriptor paired with its (not yet normalized) vector, ready to append.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub descriptor: ChunkDescriptor,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorHit {
    /// 1-based rank in the result list.
    pub rank: usize,
    /// Position of the vector in the collection index.
    pub position: usize,
    pub score: f32,
    pub descriptor: ChunkDescriptor,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IndexStats {
    pub collection_id: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub vector_count: usize,
    pub document_count: usize,
    pub index_size_bytes: u64,
    pub metadata_size_bytes: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl IndexStats {
    pub fn empty(collection_id: &str) -> Self {
        Self {
            collection_id: collection_id.to_string(),
            ..Default::default()
        }
    }

    pub fn storage_size(&self) -> u64 {
        self.index_size_bytes + self.metadata_size_bytes
    }
}

/// Sidecar written next to every index file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub collection_id: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub vector_count: usize,
    pub document_count: usize,
    pub updated_at: DateTime<Utc>,
    pub chunk_registry: Vec<ChunkDescriptor>,
}
