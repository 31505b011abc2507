//! Data types that flow through chunking, indexing, and querying.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A contiguous slice of the source document.
///
/// Offsets count characters (Unicode scalar values) and are half-open:
/// the chunk covers `[start_offset, end_offset)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Ordinal position in the chunk sequence, starting at 0.
    pub id: usize,
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Chunk {
    /// Stable external identifier used in persisted records.
    pub fn label(&self) -> String {
        chunk_label(self.id)
    }
}

/// Format a chunk ordinal as its persisted identifier (`chunk_<n>`).
pub fn chunk_label(id: usize) -> String {
    format!("chunk_{}", id)
}

/// One embedded chunk as held by an index backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk_id: usize,
    pub text: String,
    pub vector: Vec<f32>,
}

/// An entry paired with its similarity to a query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry {
    pub score: f32,
    pub chunk_id: usize,
    pub text: String,
}

/// Metadata describing one complete index build.
///
/// All entries of a generation share `dimension`. A keyword-only generation
/// (no embedding provider) has `entry_count == 0` and `dimension == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildGeneration {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub dimension: usize,
    pub entry_count: usize,
    pub chunk_count: usize,
    pub chunk_size: usize,
    pub overlap: usize,
    pub model: String,
    /// SHA-256 of the document text this generation was built from.
    pub text_sha256: String,
}

impl BuildGeneration {
    pub fn has_embeddings(&self) -> bool {
        self.entry_count > 0
    }
}

/// Which backend served a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Flat,
    RemoteStore,
    LinearScan,
    Keyword,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Flat => "flat",
            BackendKind::RemoteStore => "remote_store",
            BackendKind::LinearScan => "linear_scan",
            BackendKind::Keyword => "keyword",
        };
        f.write_str(name)
    }
}

/// A single ranked hit returned to the request layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub score: f32,
    pub text: String,
    pub source: BackendKind,
}

/// Outcome classification attached to every search response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Ok,
    EmptyQuery,
    NoDocument,
    NoMatches,
}

/// Full answer to a `search(query, k)` call.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    /// Backend that served `results`; `None` when nothing was served.
    pub source: Option<BackendKind>,
    pub status: SearchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SearchResponse {
    pub fn served(source: BackendKind, results: Vec<SearchResult>) -> Self {
        Self {
            results,
            source: Some(source),
            status: SearchStatus::Ok,
            message: None,
        }
    }

    pub fn empty(status: SearchStatus, message: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            source: None,
            status,
            message: Some(message.into()),
        }
    }
}
