//! On-disk layout of persisted generations.
//!
//! ```text
//! <storage.dir>/CURRENT                       id of the current generation
//! <storage.dir>/generations/<id>/generation.json
//! <storage.dir>/generations/<id>/chunks.json
//! <storage.dir>/generations/<id>/embeddings.json
//! <storage.dir>/generations/<id>/embeddings.index
//! <storage.dir>/generations/<id>/embeddings_meta.json
//! <storage.dir>/generations/<id>/remote_sync.json   written once the remote store holds this generation
//! ```
//!
//! Every file is written to a temporary sibling and renamed into place, so
//! a reader never observes a half-written file. `CURRENT` is only
//! repointed after a generation's files are complete.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use docrecall_core::models::{chunk_label, IndexEntry};
use docrecall_core::{Result, RetrievalError};

pub const CURRENT_FILE: &str = "CURRENT";
pub const GENERATIONS_DIR: &str = "generations";
pub const GENERATION_FILE: &str = "generation.json";
pub const CHUNKS_FILE: &str = "chunks.json";
pub const EMBEDDINGS_FILE: &str = "embeddings.json";
pub const FLAT_INDEX_FILE: &str = "embeddings.index";
pub const FLAT_META_FILE: &str = "embeddings_meta.json";
pub const REMOTE_SYNC_FILE: &str = "remote_sync.json";

/// Directory holding all generations under `storage_dir`.
pub fn generations_root(storage_dir: &Path) -> PathBuf {
    storage_dir.join(GENERATIONS_DIR)
}

/// Directory of generation `id`.
pub fn generation_dir(storage_dir: &Path, id: &str) -> PathBuf {
    generations_root(storage_dir).join(id)
}

/// The persisted embeddings record: one per generation, entries in chunk
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsRecord {
    pub created_at: DateTime<Utc>,
    pub dimension: usize,
    pub items: Vec<EmbeddingItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingItem {
    /// `chunk_<n>`.
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl EmbeddingsRecord {
    pub fn from_entries(created_at: DateTime<Utc>, dimension: usize, entries: &[IndexEntry]) -> Self {
        Self {
            created_at,
            dimension,
            items: entries
                .iter()
                .map(|e| EmbeddingItem {
                    id: chunk_label(e.chunk_id),
                    text: e.text.clone(),
                    embedding: e.vector.clone(),
                })
                .collect(),
        }
    }

    /// Convert back into index entries, validating ids and dimensions.
    pub fn into_entries(self) -> Result<Vec<IndexEntry>> {
        let dimension = self.dimension;
        self.items
            .into_iter()
            .map(|item| {
                if item.embedding.len() != dimension {
                    return Err(RetrievalError::DimensionMismatch {
                        expected: dimension,
                        actual: item.embedding.len(),
                    });
                }
                Ok(IndexEntry {
                    chunk_id: parse_chunk_label(&item.id)?,
                    text: item.text,
                    vector: item.embedding,
                })
            })
            .collect()
    }
}

/// Parse `chunk_<n>` back into `n`.
pub fn parse_chunk_label(label: &str) -> Result<usize> {
    label
        .strip_prefix("chunk_")
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| RetrievalError::Storage(format!("malformed chunk id: {}", label)))
}

/// Marker recording that a generation was upserted to a remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSyncMarker {
    pub url: String,
    pub namespace: String,
    pub entries: usize,
    pub synced_at: DateTime<Utc>,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Write `bytes` to `path` via a temporary file and rename.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    write_atomic(path, &bytes).await
}

pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        RetrievalError::BackendUnavailable(format!("{}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Id of the current generation, if one has been committed.
pub async fn read_current(storage_dir: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(storage_dir.join(CURRENT_FILE)).await {
        Ok(s) => {
            let id = s.trim().to_string();
            Ok((!id.is_empty()).then_some(id))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub async fn write_current(storage_dir: &Path, id: &str) -> Result<()> {
    write_atomic(&storage_dir.join(CURRENT_FILE), id.as_bytes()).await
}

pub async fn remove_current(storage_dir: &Path) -> Result<()> {
    match tokio::fs::remove_file(storage_dir.join(CURRENT_FILE)).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Ids of every generation directory present on disk.
pub async fn list_generations(storage_dir: &Path) -> Result<Vec<String>> {
    let root = generations_root(storage_dir);
    let mut ids = Vec::new();
    let mut entries = match tokio::fs::read_dir(&root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            ids.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(ids)
}
