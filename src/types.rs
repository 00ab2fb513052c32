use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::EngineError;
use crate::search::store::IndexStats;

/// A course document as held by the document store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRecord {
    pub id: String,
    pub collection_id: String,
    pub filename: String,
    pub file_path: String,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploader_name: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub is_processed: bool,
    #[serde(default)]
    pub is_vectorized: bool,
}

impl DocumentRecord {
    pub fn new(collection_id: &str, file_path: &str, uploader_name: &str) -> Self {
        let path = std::path::Path::new(file_path);
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string());
        let file_type = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            id: Uuid::new_v4().to_string(),
            collection_id: collection_id.to_string(),
            filename,
            file_path: file_path.to_string(),
            file_type,
            uploaded_at: Utc::now(),
            uploader_name: uploader_name.to_string(),
            text: None,
            is_processed: false,
            is_vectorized: false,
        }
    }

    /// Extracted text, if any non-blank text has been stored.
    pub fn content(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// A persisted slice of a document, the unit of embedding and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub document_id: String,
    pub chunk_index: usize,
    pub content: String,
    pub size: usize,
    /// Position of this chunk's vector in the collection index.
    #[serde(default)]
    pub vector_position: Option<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Vector,
    Keyword,
    Hybrid,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Vector => "vector",
            SearchMode::Keyword => "keyword",
            SearchMode::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vector" => Ok(SearchMode::Vector),
            "keyword" => Ok(SearchMode::Keyword),
            "hybrid" => Ok(SearchMode::Hybrid),
            other => Err(EngineError::InvalidMode(other.to_string())),
        }
    }
}

/// One search hit, enriched with document metadata at query time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub document_id: String,
    pub filename: String,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploader: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hybrid_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
    pub preview_text: String,
    pub content: String,
    pub mode: SearchMode,
}

impl SearchHit {
    /// The score that ranked this hit in its mode.
    pub fn score(&self) -> f32 {
        match self.mode {
            SearchMode::Vector => self.similarity.unwrap_or(0.0),
            SearchMode::Keyword => self.keyword_count.unwrap_or(0) as f32,
            SearchMode::Hybrid => self.hybrid_score.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IndexReport {
    pub success: bool,
    pub message: String,
    pub processed_count: usize,
    pub total_count: usize,
    pub error_count: usize,
    /// Seconds spent on the whole pass.
    pub processing_time: f64,
    pub chunk_count: usize,
}

impl IndexReport {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchReport {
    pub success: bool,
    pub query: String,
    pub mode: String,
    pub results: Vec<SearchHit>,
    pub result_count: usize,
    /// Seconds spent answering the query.
    pub search_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CollectionStats {
    pub total_documents: usize,
    pub processed_documents: usize,
    pub vectorized_documents: usize,
    pub vector_stats: IndexStats,
    /// Percentage of documents with extracted text.
    pub processing_rate: f64,
    /// Percentage of documents present in the vector index.
    pub vectorization_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryLogEntry {
    pub id: String,
    pub user_id: String,
    pub collection_id: String,
    pub query: String,
    pub mode: SearchMode,
    pub result_count: usize,
    pub created_at: DateTime<Utc>,
}

impl QueryLogEntry {
    pub fn new(
        user_id: &str,
        collection_id: &str,
        query: &str,
        mode: SearchMode,
        result_count: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            collection_id: collection_id.to_string(),
            query: query.to_string(),
            mode,
            result_count,
            created_at: Utc::now(),
        }
    }
}
