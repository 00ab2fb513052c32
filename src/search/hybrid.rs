use std::cmp::Ordering;
use std::collections::HashMap;

use crate::types::{SearchHit, SearchMode};

/// Share of the hybrid score taken by vector similarity.
pub const VECTOR_WEIGHT: f32 = 0.7;
/// Share of the hybrid score taken by keyword frequency.
pub const KEYWORD_WEIGHT: f32 = 0.3;
/// Occurrence count at which the keyword signal saturates at 1.0.
pub const KEYWORD_SATURATION: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridWeights {
    pub vector: f32,
    pub keyword: f32,
    pub keyword_saturation: f32,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            vector: VECTOR_WEIGHT,
            keyword: KEYWORD_WEIGHT,
            keyword_saturation: KEYWORD_SATURATION,
        }
    }
}

impl HybridWeights {
    pub fn vector_contribution(&self, similarity: f32) -> f32 {
        similarity * self.vector
    }

    pub fn keyword_contribution(&self, keyword_count: usize) -> f32 {
        (keyword_count as f32 / self.keyword_saturation).min(1.0) * self.keyword
    }
}

/// Fixed-weight fusion of vector and keyword hits, one entry per document.
pub struct HybridRanker {
    weights: HybridWeights,
}

impl Default for HybridRanker {
    fn default() -> Self {
        Self::new(HybridWeights::default())
    }
}

impl HybridRanker {
    pub fn new(weights: HybridWeights) -> Self {
        Self { weights }
    }

    /// Merge both result sets by document id.
    ///
    /// A document keeps the slot of its first vector hit, but a later hit for
    /// the same document replaces that hit's score and content. Keyword-only
    /// documents fall back to the keyword preview. Documents in both sets sum
    /// their contributions. Equal scores keep first-seen order, vector hits
    /// before keyword-only ones.
    pub fn merge(
        &self,
        vector_results: Vec<SearchHit>,
        keyword_results: Vec<SearchHit>,
        top_k: usize,
    ) -> Vec<SearchHit> {
        let mut merged: Vec<SearchHit> = Vec::new();
        let mut by_document: HashMap<String, usize> = HashMap::new();

        for mut hit in vector_results {
            let similarity = hit.similarity.unwrap_or(0.0);
            hit.hybrid_score = Some(self.weights.vector_contribution(similarity));
            hit.mode = SearchMode::Hybrid;
            match by_document.get(&hit.document_id) {
                Some(&slot) => merged[slot] = hit,
                None => {
                    by_document.insert(hit.document_id.clone(), merged.len());
                    merged.push(hit);
                }
            }
        }

        for mut hit in keyword_results {
            let count = hit.keyword_count.unwrap_or(0);
            let contribution = self.weights.keyword_contribution(count);

            match by_document.get(&hit.document_id) {
                Some(&slot) => {
                    let existing = &mut merged[slot];
                    existing.hybrid_score = Some(existing.hybrid_score.unwrap_or(0.0) + contribution);
                    existing.keyword_count = Some(count);
                }
                None => {
                    if hit.content.is_empty() {
                        hit.content = hit.preview_text.clone();
                    }
                    hit.hybrid_score = Some(contribution);
                    hit.mode = SearchMode::Hybrid;
                    by_document.insert(hit.document_id.clone(), merged.len());
                    merged.push(hit);
                }
            }
        }

        merged.sort_by(|a, b| {
            b.hybrid_score
                .unwrap_or(0.0)
                .partial_cmp(&a.hybrid_score.unwrap_or(0.0))
                .unwrap_or(Ordering::Equal)
        });
        merged.truncate(top_k);
        merged
    }
}
