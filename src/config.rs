use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::search::hybrid::{KEYWORD_SATURATION, KEYWORD_WEIGHT, VECTOR_WEIGHT};

pub const DEFAULT_CONFIG_FILE: &str = "coursedex.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkingConfig,
    pub search: SearchOptionsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .map(|d| d.join("coursedex"))
            .unwrap_or_else(|| PathBuf::from(".coursedex"));
        Self { data_dir }
    }
}

impl StorageConfig {
    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("indexes")
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("catalog.json")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub endpoint: Option<String>,
    pub dimensions: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            endpoint: None,
            dimensions: 768,
            batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    /// Chunks at or below this many characters are dropped.
    pub min_chunk_chars: usize,
    pub chunk_overlap: usize,
    /// Characters of chunk text kept in the index registry.
    pub preview_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            min_chunk_chars: 50,
            chunk_overlap: 0,
            preview_chars: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchOptionsConfig {
    pub top_k: usize,
    pub min_similarity: f32,
    pub vector_weight: f32,
    pub keyword_weight: f32,
    pub keyword_saturation: f32,
    /// Characters shown on each side of a keyword match.
    pub preview_window: usize,
}

impl Default for SearchOptionsConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_similarity: 0.5,
            vector_weight: VECTOR_WEIGHT,
            keyword_weight: KEYWORD_WEIGHT,
            keyword_saturation: KEYWORD_SATURATION,
            preview_window: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            anyhow::bail!("chunking.chunk_size must be greater than 0");
        }
        if self.embedding.dimensions == 0 {
            anyhow::bail!("embedding.dimensions must be greater than 0");
        }
        if self.embedding.batch_size == 0 {
            anyhow::bail!("embedding.batch_size must be greater than 0");
        }
        if self.search.keyword_saturation <= 0.0 {
            anyhow::bail!("search.keyword_saturation must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_constants() {
        let config = Config::default();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.min_chunk_chars, 50);
        assert_eq!(config.search.vector_weight, 0.7);
        assert_eq!(config.search.keyword_weight, 0.3);
        assert_eq!(config.search.keyword_saturation, 10.0);
        assert_eq!(config.embedding.provider, "ollama");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse(
            r#"
            [storage]
            data_dir = "/tmp/cdx"

            [embedding]
            provider = "hashing"
            dimensions = 64
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/cdx"));
        assert_eq!(config.embedding.provider, "hashing");
        assert_eq!(config.embedding.dimensions, 64);
        assert_eq!(config.embedding.batch_size, 32);
        assert_eq!(config.search.top_k, 5);
        assert_eq!(
            config.storage.catalog_path(),
            PathBuf::from("/tmp/cdx/catalog.json")
        );
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = Config::parse("[chunking]\nchunk_size = 0\n").unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.search.min_similarity, 0.5);
    }
}
