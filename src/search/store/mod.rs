mod collection;
mod file;
mod types;

pub use collection::CollectionIndex;
pub use file::FileIndexStore;
pub use types::{ChunkDescriptor, DocumentMetadata, IndexEntry, IndexMetadata, IndexStats, VectorHit};

use async_trait::async_trait;

use crate::error::Result;

/// Per-collection similarity index with a parallel chunk registry.
///
/// Vectors are append-only between rebuilds, and the registry always holds
/// exactly one descriptor per stored vector. An absent index reads as empty.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Load the collection's index, creating an empty one if none exists.
    async fn open_or_create(&self, collection_id: &str) -> Result<IndexStats>;
    /// Append entries and persist; returns the positions they were stored at.
    async fn add(&self, collection_id: &str, entries: Vec<IndexEntry>) -> Result<Vec<usize>>;
    async fn search(
        &self,
        collection_id: &str,
        query_vector: &[f32],
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<VectorHit>>;
    async fn stats(&self, collection_id: &str) -> Result<IndexStats>;
    /// Discard the collection's index and replace it with `entries`.
    async fn rebuild(&self, collection_id: &str, entries: Vec<IndexEntry>) -> Result<Vec<usize>>;
    /// Remove the collection's index. Returns whether anything existed.
    async fn delete(&self, collection_id: &str) -> Result<bool>;
}

/// Scale `vector` to unit L2 norm in place. Zero vectors are left as is.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector_untouched() {
        let mut v = vec![0.0, 0.0];
        normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }

    #[test]
    fn test_inner_product_of_normalized_equals_cosine() {
        let mut a: Vec<f32> = vec![0.3, -1.2, 2.5];
        let mut b: Vec<f32> = vec![1.1, 0.4, 0.9];
        let norm = |v: &[f32]| v.iter().map(|x| x * x).sum::<f32>().sqrt();
        let raw_dot: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        let expected = raw_dot / (norm(&a) * norm(&b));
        normalize(&mut a);
        normalize(&mut b);
        let dot: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        assert!((dot - expected).abs() < 1e-6);
    }
}
