//! Vector index abstraction.
//!
//! The [`VectorIndex`] trait is implemented by every vector-based backend
//! (flat index, remote store, linear scan). The coordinator holds backends
//! as trait objects and walks them in priority order at query time,
//! consulting [`VectorIndex::is_available`] before each attempt so that
//! unavailable backends cost nothing.

use async_trait::async_trait;
use std::cmp::Ordering;

use crate::error::Result;
use crate::models::{BackendKind, BuildGeneration, IndexEntry, ScoredEntry};

/// Result of a successful [`VectorIndex::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub kind: BackendKind,
    /// Number of entries the backend indexed.
    pub indexed: usize,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Which backend this is, for result tagging and logs.
    fn kind(&self) -> BackendKind;

    /// Cheap health check. Must not perform a full load or a network call.
    fn is_available(&self) -> bool;

    /// Index `entries`, which all belong to `generation`.
    async fn build(
        &self,
        entries: &[IndexEntry],
        generation: &BuildGeneration,
    ) -> Result<BuildOutcome>;

    /// Return up to `k` entries, ordered by descending score.
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredEntry>>;
}

/// Order hits by descending score and keep the first `k`.
///
/// The sort is stable, so hits with equal scores keep their incoming
/// order. Callers pass hits in chunk insertion order to get the chunk-order
/// tie-break. NaN scores compare equal to everything.
pub fn rank(mut hits: Vec<ScoredEntry>, k: usize) -> Vec<ScoredEntry> {
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    hits.truncate(k);
    hits
}
