//! Sliding-window text chunker.
//!
//! Splits document text into overlapping [`Chunk`]s of a fixed character
//! width. The chunker is a pure function of its inputs: the same text, size,
//! and overlap always produce the same chunks.
//!
//! # Algorithm
//!
//! 1. Index the char boundaries of the text so windows never split a
//!    multi-byte character.
//! 2. Emit the window `[start, min(start + size, len))`.
//! 3. Advance `start` by `size - overlap`, clamped to at least 1 so the walk
//!    terminates even when `overlap >= size`.
//! 4. Stop once `start` reaches the text length.
//!
//! The final chunk may be shorter than `size`. Empty input yields no chunks.
//!
//! # Example
//!
//! ```rust
//! use docrecall_core::chunk::chunk_text;
//!
//! let text = "x".repeat(1000);
//! let chunks = chunk_text(&text, 800, 200);
//! assert_eq!(chunks.len(), 2);
//! assert_eq!((chunks[0].start_offset, chunks[0].end_offset), (0, 800));
//! assert_eq!((chunks[1].start_offset, chunks[1].end_offset), (600, 1000));
//! ```

use crate::models::Chunk;

/// Default window width in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;

/// Default overlap between consecutive windows, in characters.
pub const DEFAULT_OVERLAP: usize = 200;

/// Distance between consecutive window starts. Never zero.
pub fn step_for(size: usize, overlap: usize) -> usize {
    size.max(1).saturating_sub(overlap).max(1)
}

/// Split `text` into overlapping windows of `size` characters.
///
/// # Guarantees
///
/// - Chunk ids are contiguous: `0, 1, …, N-1`.
/// - The first chunk starts at 0 and the last ends at the text length.
/// - Consecutive starts differ by [`step_for`]`(size, overlap)`.
/// - A `size` of 0 is treated as 1.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<Chunk> {
    let size = size.max(1);
    let step = step_for(size, overlap);

    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = boundaries.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < char_len {
        let end = start.saturating_add(size).min(char_len);
        chunks.push(Chunk {
            id: chunks.len(),
            text: text[boundaries[start]..boundaries[end]].to_string(),
            start_offset: start,
            end_offset: end,
        });
        start = start.saturating_add(step);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", 800, 200).is_empty());
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_text("Hello, world!", 800, 0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, 0);
        assert_eq!(chunks[0].text, "Hello, world!");
        assert_eq!(chunks[0].end_offset, 13);
    }

    #[test]
    fn test_thousand_chars_two_windows() {
        let text: String = (0..1000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunk_text(&text, 800, 200);
        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].start_offset, chunks[0].end_offset), (0, 800));
        assert_eq!((chunks[1].start_offset, chunks[1].end_offset), (600, 1000));
        assert_eq!(chunks[0].text, &text[..800]);
        assert_eq!(chunks[1].text, &text[600..]);
    }

    #[test]
    fn test_overlap_not_smaller_than_size_terminates() {
        let text = "abcdefghij";
        for overlap in [5, 6, 50] {
            let chunks = chunk_text(text, 5, overlap);
            // step is clamped to 1, so every char position starts a window
            assert_eq!(chunks.len(), 10, "overlap {}", overlap);
            assert_eq!(chunks[9].text, "j");
        }
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let chunks = chunk_text("abc", 0, 0);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.text.chars().count() == 1));
    }

    #[test]
    fn test_offsets_cover_text_with_overlap() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let len = text.chars().count();
        let (size, overlap) = (120, 30);
        let chunks = chunk_text(&text, size, overlap);

        assert_eq!(chunks.first().map(|c| c.start_offset), Some(0));
        assert_eq!(chunks.last().map(|c| c.end_offset), Some(len));
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].start_offset - pair[0].start_offset, size - overlap);
            if pair[0].end_offset - pair[0].start_offset == size {
                assert_eq!(pair[0].end_offset - pair[1].start_offset, overlap);
            }
        }
    }

    #[test]
    fn test_ids_contiguous() {
        let text = "lorem ipsum ".repeat(100);
        let chunks = chunk_text(&text, 50, 10);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.id, i);
            assert_eq!(c.label(), format!("chunk_{}", i));
        }
    }

    #[test]
    fn test_multibyte_utf8_chars() {
        let text = "┌──────┐ héllo wörld ✓✓✓";
        let chunks = chunk_text(text, 4, 1);
        let total_chars = text.chars().count();
        assert_eq!(chunks.last().map(|c| c.end_offset), Some(total_chars));
        for c in &chunks {
            assert_eq!(c.text.chars().count(), c.end_offset - c.start_offset);
        }
    }

    #[test]
    fn test_huge_size_and_overlap_do_not_overflow() {
        let chunks = chunk_text("abc", usize::MAX, usize::MAX - 1);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "abc");
        assert_eq!(chunks[2].text, "c");
        assert!(chunks.iter().all(|c| c.end_offset == 3));

        let single = chunk_text("abc", usize::MAX, 0);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].text, "abc");
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta gamma delta epsilon zeta eta theta";
        assert_eq!(chunk_text(text, 10, 3), chunk_text(text, 10, 3));
    }
}
