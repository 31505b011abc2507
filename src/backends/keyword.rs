//! Keyword fallback over the persisted chunk list.
//!
//! Needs no embeddings, so it is the only backend a keyword-only generation
//! has, and the last resort when every vector backend fails.

use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

use docrecall_core::keyword::keyword_search;
use docrecall_core::models::{BackendKind, Chunk, ScoredEntry};
use docrecall_core::Result;

use crate::storage::{self, CHUNKS_FILE};

pub struct KeywordFallback {
    path: PathBuf,
    chunks: OnceCell<Vec<Chunk>>,
}

impl KeywordFallback {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(CHUNKS_FILE),
            chunks: OnceCell::new(),
        }
    }

    pub fn kind(&self) -> BackendKind {
        BackendKind::Keyword
    }

    pub async fn persist(&self, chunks: &[Chunk]) -> Result<()> {
        storage::write_json(&self.path, &chunks).await
    }

    pub fn is_available(&self) -> bool {
        self.chunks.initialized() || self.path.is_file()
    }

    pub async fn chunks(&self) -> Result<&[Chunk]> {
        let chunks = self
            .chunks
            .get_or_try_init(|| storage::read_json::<Vec<Chunk>>(&self.path))
            .await?;
        Ok(chunks)
    }

    pub async fn query(&self, query: &str, k: usize) -> Result<Vec<ScoredEntry>> {
        Ok(keyword_search(self.chunks().await?, query, k))
    }
}
