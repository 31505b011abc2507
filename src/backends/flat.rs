//! Exact flat index over unit-normalized vectors.
//!
//! Every stored vector is scaled to unit length at build time, so the inner
//! product with a normalized query equals cosine similarity. Queries scan
//! all rows; there is no approximation.
//!
//! # Artifact format
//!
//! `embeddings.index` (little-endian):
//!
//! ```text
//! 0..4    magic "DRFI"
//! 4..8    format version (u32)
//! 8..12   dimension (u32)
//! 12..16  row count (u32)
//! 16..    count × dimension f32 values, row-major
//! ```
//!
//! `embeddings_meta.json` maps row positions to chunk ids and text and
//! records the SHA-256 of the blob. The backend is available only when both
//! files exist and agree.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

use docrecall_core::index::{rank, BuildOutcome, VectorIndex};
use docrecall_core::models::{chunk_label, BackendKind, BuildGeneration, IndexEntry, ScoredEntry};
use docrecall_core::similarity::{blob_to_vec, dot, normalize_l2, vec_to_blob};
use docrecall_core::{Result, RetrievalError};

use crate::storage::{self, parse_chunk_label, sha256_hex, FLAT_INDEX_FILE, FLAT_META_FILE};

const MAGIC: &[u8; 4] = b"DRFI";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    dimension: usize,
    count: usize,
}

impl Header {
    fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(MAGIC);
        out[4..8].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        out[8..12].copy_from_slice(&(self.dimension as u32).to_le_bytes());
        out[12..16].copy_from_slice(&(self.count as u32).to_le_bytes());
        out
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN || &bytes[0..4] != MAGIC {
            return Err(corrupt("bad magic"));
        }
        let word = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        if word(4) != FORMAT_VERSION {
            return Err(corrupt("unsupported format version"));
        }
        Ok(Self {
            dimension: word(8) as usize,
            count: word(12) as usize,
        })
    }

    fn blob_len(&self) -> usize {
        HEADER_LEN + self.count * self.dimension * 4
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FlatMeta {
    dimension: usize,
    count: usize,
    blob_sha256: String,
    items: Vec<FlatMetaItem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FlatMetaItem {
    id: String,
    text: String,
}

/// Rows and texts held in memory after the first query.
struct Loaded {
    dimension: usize,
    rows: Vec<f32>,
    chunk_ids: Vec<usize>,
    texts: Vec<String>,
}

pub struct FlatIndexBackend {
    index_path: PathBuf,
    meta_path: PathBuf,
    loaded: OnceCell<Loaded>,
}

impl FlatIndexBackend {
    /// A flat index persisted inside generation directory `dir`.
    pub fn new(dir: &Path) -> Self {
        Self {
            index_path: dir.join(FLAT_INDEX_FILE),
            meta_path: dir.join(FLAT_META_FILE),
            loaded: OnceCell::new(),
        }
    }

    fn read_header(&self) -> Result<(Header, u64)> {
        let mut file = std::fs::File::open(&self.index_path)?;
        let len = file.metadata()?.len();
        let mut buf = [0u8; HEADER_LEN];
        file.read_exact(&mut buf)?;
        Ok((Header::decode(&buf)?, len))
    }

    fn check_artifacts(&self) -> Result<()> {
        let (header, len) = self.read_header()?;
        if len != header.blob_len() as u64 {
            return Err(corrupt("blob length does not match header"));
        }
        let meta: FlatMeta = serde_json::from_slice(&std::fs::read(&self.meta_path)?)?;
        if meta.dimension != header.dimension
            || meta.count != header.count
            || meta.items.len() != header.count
        {
            return Err(corrupt("metadata disagrees with blob header"));
        }
        Ok(())
    }

    async fn load(&self) -> Result<&Loaded> {
        self.loaded
            .get_or_try_init(|| async {
                let blob = tokio::fs::read(&self.index_path)
                    .await
                    .map_err(|e| RetrievalError::BackendUnavailable(e.to_string()))?;
                let meta: FlatMeta = storage::read_json(&self.meta_path).await?;

                if sha256_hex(&blob) != meta.blob_sha256 {
                    return Err(corrupt("blob checksum mismatch"));
                }
                let header = Header::decode(&blob)?;
                if blob.len() != header.blob_len() || meta.items.len() != header.count {
                    return Err(corrupt("blob and metadata disagree"));
                }

                let chunk_ids = meta
                    .items
                    .iter()
                    .map(|item| parse_chunk_label(&item.id))
                    .collect::<Result<Vec<_>>>()?;
                Ok::<_, RetrievalError>(Loaded {
                    dimension: header.dimension,
                    rows: blob_to_vec(&blob[HEADER_LEN..]),
                    chunk_ids,
                    texts: meta.items.into_iter().map(|item| item.text).collect(),
                })
            })
            .await
    }
}

#[async_trait]
impl VectorIndex for FlatIndexBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Flat
    }

    fn is_available(&self) -> bool {
        self.loaded.initialized() || self.check_artifacts().is_ok()
    }

    async fn build(
        &self,
        entries: &[IndexEntry],
        generation: &BuildGeneration,
    ) -> Result<BuildOutcome> {
        if entries.is_empty() {
            return Err(RetrievalError::BackendUnavailable(
                "no entries to index".into(),
            ));
        }
        let header = Header {
            dimension: generation.dimension,
            count: entries.len(),
        };

        let mut blob = Vec::with_capacity(header.blob_len());
        blob.extend_from_slice(&header.encode());
        for entry in entries {
            if entry.vector.len() != header.dimension {
                return Err(RetrievalError::DimensionMismatch {
                    expected: header.dimension,
                    actual: entry.vector.len(),
                });
            }
            let mut unit = entry.vector.clone();
            normalize_l2(&mut unit);
            blob.extend_from_slice(&vec_to_blob(&unit));
        }

        let meta = FlatMeta {
            dimension: header.dimension,
            count: header.count,
            blob_sha256: sha256_hex(&blob),
            items: entries
                .iter()
                .map(|e| FlatMetaItem {
                    id: chunk_label(e.chunk_id),
                    text: e.text.clone(),
                })
                .collect(),
        };

        storage::write_atomic(&self.index_path, &blob).await?;
        storage::write_json(&self.meta_path, &meta).await?;

        Ok(BuildOutcome {
            kind: BackendKind::Flat,
            indexed: entries.len(),
        })
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredEntry>> {
        let loaded = self.load().await?;
        if vector.len() != loaded.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: loaded.dimension,
                actual: vector.len(),
            });
        }

        let mut query = vector.to_vec();
        normalize_l2(&mut query);

        let hits = loaded
            .rows
            .chunks_exact(loaded.dimension.max(1))
            .zip(loaded.chunk_ids.iter().zip(loaded.texts.iter()))
            .map(|(row, (chunk_id, text))| ScoredEntry {
                score: dot(row, &query),
                chunk_id: *chunk_id,
                text: text.clone(),
            })
            .collect();

        Ok(rank(hits, k))
    }
}

fn corrupt(detail: &str) -> RetrievalError {
    RetrievalError::BackendUnavailable(format!("flat index corrupt: {}", detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn generation(dimension: usize, entry_count: usize) -> BuildGeneration {
        BuildGeneration {
            id: "g".into(),
            created_at: Utc::now(),
            dimension,
            entry_count,
            chunk_count: entry_count,
            chunk_size: 800,
            overlap: 200,
            model: "test".into(),
            text_sha256: String::new(),
        }
    }

    fn entries() -> Vec<IndexEntry> {
        vec![
            IndexEntry {
                chunk_id: 0,
                text: "east".into(),
                vector: vec![10.0, 0.0],
            },
            IndexEntry {
                chunk_id: 1,
                text: "north".into(),
                vector: vec![0.0, 3.0],
            },
            IndexEntry {
                chunk_id: 2,
                text: "north-east".into(),
                vector: vec![1.0, 1.0],
            },
        ]
    }

    #[tokio::test]
    async fn test_build_then_query_ranks_by_cosine() {
        let tmp = TempDir::new().unwrap();
        let index = FlatIndexBackend::new(tmp.path());
        assert!(!index.is_available());

        let outcome = index.build(&entries(), &generation(2, 3)).await.unwrap();
        assert_eq!(outcome.indexed, 3);
        assert!(index.is_available());

        let hits = index.query(&[0.0, 5.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "north");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert_eq!(hits[1].chunk_id, 2);
        assert!((hits[1].score - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_missing_meta_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let index = FlatIndexBackend::new(tmp.path());
        index.build(&entries(), &generation(2, 3)).await.unwrap();
        std::fs::remove_file(tmp.path().join(FLAT_META_FILE)).unwrap();

        let fresh = FlatIndexBackend::new(tmp.path());
        assert!(!fresh.is_available());
        assert!(fresh.query(&[1.0, 0.0], 1).await.is_err());
    }

    #[tokio::test]
    async fn test_truncated_blob_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        FlatIndexBackend::new(tmp.path())
            .build(&entries(), &generation(2, 3))
            .await
            .unwrap();
        let path = tmp.path().join(FLAT_INDEX_FILE);
        let blob = std::fs::read(&path).unwrap();
        std::fs::write(&path, &blob[..blob.len() - 4]).unwrap();

        assert!(!FlatIndexBackend::new(tmp.path()).is_available());
    }

    #[tokio::test]
    async fn test_tampered_blob_fails_checksum() {
        let tmp = TempDir::new().unwrap();
        FlatIndexBackend::new(tmp.path())
            .build(&entries(), &generation(2, 3))
            .await
            .unwrap();
        let path = tmp.path().join(FLAT_INDEX_FILE);
        let mut blob = std::fs::read(&path).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xFF;
        std::fs::write(&path, &blob).unwrap();

        let index = FlatIndexBackend::new(tmp.path());
        // header and lengths still agree, so only the load catches it
        assert!(index.is_available());
        assert!(matches!(
            index.query(&[1.0, 0.0], 1).await,
            Err(RetrievalError::BackendUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch() {
        let tmp = TempDir::new().unwrap();
        let index = FlatIndexBackend::new(tmp.path());
        index.build(&entries(), &generation(2, 3)).await.unwrap();
        let err = index.query(&[1.0, 0.0, 0.0], 1).await.unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_build_rejects_empty_entries() {
        let tmp = TempDir::new().unwrap();
        let index = FlatIndexBackend::new(tmp.path());
        assert!(index.build(&[], &generation(2, 0)).await.is_err());
        assert!(!index.is_available());
    }
}
