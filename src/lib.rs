//! Per-course document indexing and retrieval.
//!
//! Documents are split into sentence-packed chunks, embedded, and stored in
//! one flat vector index per collection. Queries run as vector, keyword or
//! hybrid searches through [`RetrievalEngine`].

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod search;
pub mod types;

pub use config::Config;
pub use error::{EngineError, Result};
pub use search::{EngineComponents, RetrievalEngine, SearchRequest};
pub use types::{
    Chunk, CollectionStats, DocumentRecord, IndexReport, QueryLogEntry, SearchHit, SearchMode,
    SearchReport,
};
