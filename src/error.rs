use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures raised inside the indexing and retrieval engine.
///
/// Per-document failures (`UnsupportedFormat`, `Extraction`) are folded into
/// batch counts by the orchestrator; the rest surface as failed reports.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("text extraction failed for {path}: {reason}")]
    Extraction { path: String, reason: String },

    #[error("vector dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("search query is empty")]
    EmptyQuery,

    #[error("unsupported search mode '{0}' (expected vector, keyword or hybrid)")]
    InvalidMode(String),

    #[error("index for collection '{collection}' is corrupt: {reason}")]
    CorruptIndex { collection: String, reason: String },

    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("document store error: {0}")]
    Catalog(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn corrupt(collection: &str, reason: impl Into<String>) -> Self {
        Self::CorruptIndex {
            collection: collection.to_string(),
            reason: reason.into(),
        }
    }

    pub fn catalog(err: anyhow::Error) -> Self {
        Self::Catalog(format!("{:#}", err))
    }
}
