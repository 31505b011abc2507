//! Typed request schemas for the two public operations.
//!
//! Both requests are validated before any work starts. An empty query is
//! not a validation failure: it produces an empty response with status
//! `empty_query`.

use serde::{Deserialize, Serialize};

use crate::chunk::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use crate::error::{Result, RetrievalError};

/// Parameters for a whole-document (re)build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRequest {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for IndexRequest {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl IndexRequest {
    /// `chunk_size` must be at least 1. Any overlap is accepted; the
    /// chunker clamps its step so large overlaps still terminate.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RetrievalError::InvalidRequest(
                "chunk_size must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// A top-k query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub k: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, k: usize) -> Self {
        Self {
            query: query.into(),
            k,
        }
    }

    /// `k` must lie in `1..=max_k`.
    pub fn validate(&self, max_k: usize) -> Result<()> {
        if self.k == 0 || self.k > max_k {
            return Err(RetrievalError::InvalidRequest(format!(
                "k must be in 1..={}, got {}",
                max_k, self.k
            )));
        }
        Ok(())
    }

    /// The query with surrounding whitespace removed.
    pub fn trimmed_query(&self) -> &str {
        self.query.trim()
    }
}
