//! Plain-text keyword scoring, the last link of the fallback chain.
//!
//! A chunk matches when it contains the query as a case-insensitive
//! substring. Its score is the number of non-overlapping occurrences divided
//! by the chunk's whitespace-separated word count, so short chunks that
//! mention the query often rank first.

use crate::index::rank;
use crate::models::{Chunk, ScoredEntry};

/// Score a single chunk against an already-lowercased query.
///
/// Returns `None` when the query does not occur in the chunk.
pub fn keyword_score(chunk_text: &str, query_lower: &str) -> Option<f32> {
    if query_lower.is_empty() {
        return None;
    }
    let text_lower = chunk_text.to_lowercase();
    let occurrences = text_lower.matches(query_lower).count();
    if occurrences == 0 {
        return None;
    }
    let words = chunk_text.split_whitespace().count().max(1);
    Some(occurrences as f32 / words as f32)
}

/// Return the top `k` chunks containing `query`, best first.
pub fn keyword_search(chunks: &[Chunk], query: &str, k: usize) -> Vec<ScoredEntry> {
    let query_lower = query.trim().to_lowercase();
    let hits = chunks
        .iter()
        .filter_map(|c| {
            keyword_score(&c.text, &query_lower).map(|score| ScoredEntry {
                score,
                chunk_id: c.id,
                text: c.text.clone(),
            })
        })
        .collect();
    rank(hits, k)
}
