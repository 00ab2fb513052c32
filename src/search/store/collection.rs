use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::{EngineError, Result};

use super::types::{ChunkDescriptor, IndexEntry, IndexMetadata, VectorHit};
use super::normalize;

/// In-memory form of one collection's index: a flat row-major matrix of unit
/// vectors plus the registry describing each row.
#[derive(Debug, Clone)]
pub struct CollectionIndex {
    pub collection_id: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub updated_at: DateTime<Utc>,
    vectors: Vec<f32>,
    registry: Vec<ChunkDescriptor>,
}

impl CollectionIndex {
    pub fn new(collection_id: &str, embedding_model: &str, dimension: usize) -> Self {
        Self {
            collection_id: collection_id.to_string(),
            embedding_model: embedding_model.to_string(),
            dimension,
            updated_at: Utc::now(),
            vectors: Vec::new(),
            registry: Vec::new(),
        }
    }

    /// Reassemble from persisted parts. Rejects parts that disagree in length.
    pub fn from_parts(metadata: IndexMetadata, vectors: Vec<f32>) -> Result<Self> {
        let collection = metadata.collection_id.clone();
        if metadata.dimension == 0 {
            return Err(EngineError::corrupt(&collection, "dimension is zero"));
        }
        if metadata.chunk_registry.len() != metadata.vector_count {
            return Err(EngineError::corrupt(
                &collection,
                format!(
                    "registry holds {} entries but metadata records {} vectors",
                    metadata.chunk_registry.len(),
                    metadata.vector_count
                ),
            ));
        }
        if vectors.len() != metadata.vector_count * metadata.dimension {
            return Err(EngineError::corrupt(
                &collection,
                format!(
                    "index holds {} floats, expected {} x {}",
                    vectors.len(),
                    metadata.vector_count,
                    metadata.dimension
                ),
            ));
        }

        Ok(Self {
            collection_id: metadata.collection_id,
            embedding_model: metadata.embedding_model,
            dimension: metadata.dimension,
            updated_at: metadata.updated_at,
            vectors,
            registry: metadata.chunk_registry,
        })
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn vectors(&self) -> &[f32] {
        &self.vectors
    }

    pub fn document_count(&self) -> usize {
        self.registry
            .iter()
            .map(|d| d.document_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn metadata(&self) -> IndexMetadata {
        IndexMetadata {
            collection_id: self.collection_id.clone(),
            embedding_model: self.embedding_model.clone(),
            dimension: self.dimension,
            vector_count: self.len(),
            document_count: self.document_count(),
            updated_at: self.updated_at,
            chunk_registry: self.registry.clone(),
        }
    }

    /// Normalize and append `entries` in order, returning their positions.
    ///
    /// All vectors are checked before any is appended, so a bad batch leaves
    /// the index untouched.
    pub fn append(&mut self, entries: Vec<IndexEntry>) -> Result<Vec<usize>> {
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != self.dimension) {
            return Err(EngineError::DimensionMismatch {
                expected: self.dimension,
                found: bad.vector.len(),
            });
        }

        let start = self.registry.len();
        self.vectors.reserve(entries.len() * self.dimension);
        self.registry.reserve(entries.len());

        for entry in entries {
            let mut vector = entry.vector;
            normalize(&mut vector);
            self.vectors.extend_from_slice(&vector);
            self.registry.push(entry.descriptor);
        }

        self.updated_at = Utc::now();
        Ok((start..self.registry.len()).collect())
    }

    /// Inner product against every stored unit vector.
    ///
    /// Hits scoring below `min_similarity` are dropped; the rest are ordered by
    /// descending score with ties going to the lower registry position.
    pub fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<VectorHit>> {
        if query_vector.len() != self.dimension {
            return Err(EngineError::DimensionMismatch {
                expected: self.dimension,
                found: query_vector.len(),
            });
        }
        if self.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let mut query = query_vector.to_vec();
        normalize(&mut query);

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, row)| {
                let score: f32 = row.iter().zip(&query).map(|(a, b)| a * b).sum();
                (position, score)
            })
            .filter(|(_, score)| *score >= min_similarity)
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(i, (position, score))| VectorHit {
                rank: i + 1,
                position,
                score,
                descriptor: self.registry[position].clone(),
            })
            .collect())
    }
}
