pub mod chunker;
pub mod embedder;
pub mod engine;
pub mod hybrid;
pub mod indexer;
pub mod keyword;
pub mod searcher;
pub mod store;

pub use chunker::Chunker;
pub use embedder::{create_embedder, Embedder, HashingEmbedder, OllamaEmbedder};
pub use engine::{EngineComponents, RetrievalEngine, SearchRequest};
pub use hybrid::{HybridRanker, HybridWeights, KEYWORD_SATURATION, KEYWORD_WEIGHT, VECTOR_WEIGHT};
pub use indexer::{Indexer, PreparedDocument};
pub use keyword::{KeywordHit, KeywordMatcher};
pub use searcher::Searcher;
pub use store::{FileIndexStore, IndexStats, VectorStore};
