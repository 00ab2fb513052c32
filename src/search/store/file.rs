use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};

use super::collection::CollectionIndex;
use super::types::{IndexEntry, IndexMetadata, IndexStats, VectorHit};
use super::VectorStore;

const INDEX_MAGIC: &[u8; 4] = b"CDXI";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

#[derive(Default)]
struct Slot {
    loaded: bool,
    index: Option<CollectionIndex>,
}

/// File-backed index store: one binary vector file and one JSON registry
/// sidecar per collection.
///
/// Each collection has its own `RwLock`; writers hold it across the whole
/// append-and-persist step so readers only ever see complete snapshots.
pub struct FileIndexStore {
    dir: PathBuf,
    dimension: usize,
    embedding_model: String,
    slots: Mutex<HashMap<String, Arc<RwLock<Slot>>>>,
}

impl FileIndexStore {
    pub fn new(dir: PathBuf, dimension: usize, embedding_model: &str) -> Self {
        Self {
            dir,
            dimension,
            embedding_model: embedding_model.to_string(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn index_path(&self, collection_id: &str) -> PathBuf {
        self.dir
            .join(format!("collection_{}.idx", collection_key(collection_id)))
    }

    pub fn metadata_path(&self, collection_id: &str) -> PathBuf {
        self.dir
            .join(format!("collection_{}.meta.json", collection_key(collection_id)))
    }

    fn slot(&self, collection_id: &str) -> Arc<RwLock<Slot>> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(slots.entry(collection_id.to_string()).or_default())
    }

    fn ensure_loaded(&self, collection_id: &str, slot: &mut Slot) -> Result<()> {
        if slot.loaded {
            return Ok(());
        }

        let index = self.load_from_disk(collection_id)?;
        if let Some(index) = &index {
            if index.dimension != self.dimension {
                return Err(EngineError::DimensionMismatch {
                    expected: self.dimension,
                    found: index.dimension,
                });
            }
            if index.embedding_model != self.embedding_model {
                warn!(
                    collection = collection_id,
                    stored = %index.embedding_model,
                    current = %self.embedding_model,
                    "index was built with a different embedding model"
                );
            }
            debug!(collection = collection_id, vectors = index.len(), "index loaded");
        }

        slot.index = index;
        slot.loaded = true;
        Ok(())
    }

    fn load_from_disk(&self, collection_id: &str) -> Result<Option<CollectionIndex>> {
        let index_path = self.index_path(collection_id);
        let metadata_path = self.metadata_path(collection_id);

        match (index_path.exists(), metadata_path.exists()) {
            (false, false) => return Ok(None),
            (true, false) => {
                return Err(EngineError::corrupt(collection_id, "registry file is missing"))
            }
            (false, true) => {
                return Err(EngineError::corrupt(collection_id, "vector file is missing"))
            }
            (true, true) => {}
        }

        let metadata: IndexMetadata = serde_json::from_slice(&fs::read(&metadata_path)?)?;
        let (dimension, count, vectors) = decode_vectors(collection_id, &fs::read(&index_path)?)?;

        if dimension != metadata.dimension || count != metadata.vector_count {
            return Err(EngineError::corrupt(
                collection_id,
                format!(
                    "vector file holds {} x {}, registry describes {} x {}",
                    count, dimension, metadata.vector_count, metadata.dimension
                ),
            ));
        }

        CollectionIndex::from_parts(metadata, vectors).map(Some)
    }

    /// Write both artifacts to temp siblings, then rename them into place.
    ///
    /// The vector file is renamed first and the sidecar last. A crash between
    /// the two renames leaves a new vector file beside the previous sidecar;
    /// their vector counts disagree, so the next load reports `CorruptIndex`.
    fn persist(&self, index: &CollectionIndex) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let index_path = self.index_path(&index.collection_id);
        let metadata_path = self.metadata_path(&index.collection_id);
        let index_tmp = tmp_path(&index_path);
        let metadata_tmp = tmp_path(&metadata_path);

        fs::write(
            &index_tmp,
            encode_vectors(index.dimension, index.len(), index.vectors()),
        )?;
        fs::write(&metadata_tmp, serde_json::to_vec(&index.metadata())?)?;

        fs::rename(&index_tmp, &index_path)?;
        fs::rename(&metadata_tmp, &metadata_path)?;

        debug!(
            collection = %index.collection_id,
            vectors = index.len(),
            "index persisted"
        );
        Ok(())
    }

    fn remove_files(&self, collection_id: &str) -> Result<bool> {
        let mut removed = false;
        for path in [self.index_path(collection_id), self.metadata_path(collection_id)] {
            if path.exists() {
                fs::remove_file(&path)?;
                removed = true;
            }
        }
        Ok(removed)
    }

    fn stats_for(&self, collection_id: &str, index: Option<&CollectionIndex>) -> Result<IndexStats> {
        let Some(index) = index else {
            return Ok(IndexStats::empty(collection_id));
        };

        Ok(IndexStats {
            collection_id: collection_id.to_string(),
            embedding_model: index.embedding_model.clone(),
            dimension: index.dimension,
            vector_count: index.len(),
            document_count: index.document_count(),
            index_size_bytes: file_size(&self.index_path(collection_id))?,
            metadata_size_bytes: file_size(&self.metadata_path(collection_id))?,
            updated_at: Some(index.updated_at),
        })
    }

    fn new_index(&self, collection_id: &str) -> CollectionIndex {
        CollectionIndex::new(collection_id, &self.embedding_model, self.dimension)
    }
}

#[async_trait]
impl VectorStore for FileIndexStore {
    async fn open_or_create(&self, collection_id: &str) -> Result<IndexStats> {
        let slot = self.slot(collection_id);
        let mut guard = slot.write().await;
        self.ensure_loaded(collection_id, &mut guard)?;

        if guard.index.is_none() {
            let index = self.new_index(collection_id);
            self.persist(&index)?;
            info!(collection = collection_id, dimension = self.dimension, "created empty index");
            guard.index = Some(index);
        }

        self.stats_for(collection_id, guard.index.as_ref())
    }

    async fn add(&self, collection_id: &str, entries: Vec<IndexEntry>) -> Result<Vec<usize>> {
        let slot = self.slot(collection_id);
        let mut guard = slot.write().await;
        self.ensure_loaded(collection_id, &mut guard)?;

        if entries.is_empty() {
            warn!(collection = collection_id, "no chunks to add");
            return Ok(Vec::new());
        }

        // The cached snapshot changes only after a successful persist.
        let mut index = guard
            .index
            .clone()
            .unwrap_or_else(|| self.new_index(collection_id));
        let positions = index.append(entries)?;
        self.persist(&index)?;

        info!(
            collection = collection_id,
            added = positions.len(),
            total = index.len(),
            "vectors added"
        );
        guard.index = Some(index);
        Ok(positions)
    }

    async fn search(
        &self,
        collection_id: &str,
        query_vector: &[f32],
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<VectorHit>> {
        let slot = self.slot(collection_id);
        {
            let guard = slot.read().await;
            if guard.loaded {
                return match &guard.index {
                    Some(index) => index.search(query_vector, top_k, min_similarity),
                    None => Ok(Vec::new()),
                };
            }
        }

        let mut guard = slot.write().await;
        self.ensure_loaded(collection_id, &mut guard)?;
        let guard = guard.downgrade();
        match &guard.index {
            Some(index) => index.search(query_vector, top_k, min_similarity),
            None => {
                debug!(collection = collection_id, "no index; returning empty result");
                Ok(Vec::new())
            }
        }
    }

    async fn stats(&self, collection_id: &str) -> Result<IndexStats> {
        let slot = self.slot(collection_id);
        {
            let guard = slot.read().await;
            if guard.loaded {
                return self.stats_for(collection_id, guard.index.as_ref());
            }
        }

        let mut guard = slot.write().await;
        self.ensure_loaded(collection_id, &mut guard)?;
        self.stats_for(collection_id, guard.index.as_ref())
    }

    async fn rebuild(&self, collection_id: &str, entries: Vec<IndexEntry>) -> Result<Vec<usize>> {
        let slot = self.slot(collection_id);
        let mut guard = slot.write().await;

        let mut index = self.new_index(collection_id);
        let positions = index.append(entries)?;

        self.remove_files(collection_id)?;
        guard.index = None;
        guard.loaded = true;

        self.persist(&index)?;
        info!(
            collection = collection_id,
            vectors = index.len(),
            "index rebuilt"
        );
        guard.index = Some(index);
        Ok(positions)
    }

    async fn delete(&self, collection_id: &str) -> Result<bool> {
        let slot = self.slot(collection_id);
        let mut guard = slot.write().await;

        let removed = self.remove_files(collection_id)?;
        guard.index = None;
        guard.loaded = true;

        if removed {
            info!(collection = collection_id, "index deleted");
        }
        Ok(removed)
    }
}

/// File-name-safe key for a collection id. Plain ids are used verbatim,
/// anything else is replaced by a stable hash.
fn collection_key(collection_id: &str) -> String {
    let plain = !collection_id.is_empty()
        && collection_id.len() <= 64
        && collection_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if plain {
        collection_id.to_string()
    } else {
        let digest = Sha256::digest(collection_id.as_bytes());
        format!("{:x}", digest)[..16].to_string()
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn file_size(path: &Path) -> Result<u64> {
    if path.exists() {
        Ok(fs::metadata(path)?.len())
    } else {
        Ok(0)
    }
}

fn encode_vectors(dimension: usize, count: usize, vectors: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + vectors.len() * 4);
    bytes.extend_from_slice(INDEX_MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(dimension as u32).to_le_bytes());
    bytes.extend_from_slice(&(count as u64).to_le_bytes());
    for value in vectors {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn decode_vectors(collection_id: &str, bytes: &[u8]) -> Result<(usize, usize, Vec<f32>)> {
    if bytes.len() < HEADER_LEN || &bytes[..4] != INDEX_MAGIC {
        return Err(EngineError::corrupt(collection_id, "not a coursedex index file"));
    }

    let read_u32 = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
    let version = read_u32(4);
    if version != FORMAT_VERSION {
        return Err(EngineError::corrupt(
            collection_id,
            format!("unsupported index format version {}", version),
        ));
    }

    let dimension = read_u32(8) as usize;
    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&bytes[12..20]);
    let count = usize::try_from(u64::from_le_bytes(count_bytes))
        .map_err(|_| EngineError::corrupt(collection_id, "vector count does not fit in memory"))?;
    let expected_len = count
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| {
            EngineError::corrupt(
                collection_id,
                format!("header promises an impossible {} x {} vectors", count, dimension),
            )
        })?;

    let body = &bytes[HEADER_LEN..];
    if body.len() != expected_len {
        return Err(EngineError::corrupt(
            collection_id,
            format!(
                "vector file is {} bytes, header promises {} x {}",
                body.len(),
                count,
                dimension
            ),
        ));
    }

    let vectors = body
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    Ok((dimension, count, vectors))
}
