//! Linear-scan fallback over the plain embeddings record.
//!
//! This backend owns `embeddings.json`: building it persists the record,
//! querying it loads every vector and scores each one with cosine
//! similarity in a single pass. It serves queries whenever embeddings exist
//! but the flat index artifact is missing or unreadable.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

use docrecall_core::index::{rank, BuildOutcome, VectorIndex};
use docrecall_core::models::{BackendKind, BuildGeneration, IndexEntry, ScoredEntry};
use docrecall_core::similarity::cosine_similarity;
use docrecall_core::{Result, RetrievalError};

use crate::storage::{self, EmbeddingsRecord, EMBEDDINGS_FILE};

pub struct LinearScanFallback {
    path: PathBuf,
    loaded: OnceCell<(usize, Vec<IndexEntry>)>,
}

impl LinearScanFallback {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(EMBEDDINGS_FILE),
            loaded: OnceCell::new(),
        }
    }

    async fn load(&self) -> Result<&(usize, Vec<IndexEntry>)> {
        self.loaded
            .get_or_try_init(|| async {
                let record: EmbeddingsRecord = storage::read_json(&self.path).await?;
                let dimension = record.dimension;
                Ok::<_, RetrievalError>((dimension, record.into_entries()?))
            })
            .await
    }
}

#[async_trait]
impl VectorIndex for LinearScanFallback {
    fn kind(&self) -> BackendKind {
        BackendKind::LinearScan
    }

    fn is_available(&self) -> bool {
        self.loaded.initialized()
            || std::fs::metadata(&self.path)
                .map(|m| m.is_file() && m.len() > 0)
                .unwrap_or(false)
    }

    async fn build(
        &self,
        entries: &[IndexEntry],
        generation: &BuildGeneration,
    ) -> Result<BuildOutcome> {
        let record =
            EmbeddingsRecord::from_entries(generation.created_at, generation.dimension, entries);
        storage::write_json(&self.path, &record).await?;
        Ok(BuildOutcome {
            kind: BackendKind::LinearScan,
            indexed: entries.len(),
        })
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredEntry>> {
        let (dimension, entries) = self.load().await?;
        if vector.len() != *dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: *dimension,
                actual: vector.len(),
            });
        }

        let hits = entries
            .iter()
            .map(|e| ScoredEntry {
                score: cosine_similarity(vector, &e.vector),
                chunk_id: e.chunk_id,
                text: e.text.clone(),
            })
            .collect();

        Ok(rank(hits, k))
    }
}
