//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`FixedSizeChunker`], a
//! deterministic sliding-window splitter with configurable overlap.

/// A strategy for splitting document text into chunks.
///
/// Implementations must be deterministic: the same input always yields the
/// same chunk sequence, which reproducible ingestion and testing rely on.
pub trait Chunker: Send + Sync {
    /// Split text into an ordered sequence of chunk texts.
    ///
    /// Returns an empty `Vec` for empty or whitespace-only text.
    fn chunk(&self, text: &str) -> Vec<String>;
}

/// Splits text into fixed-size chunks by character count with configurable
/// overlap.
///
/// Whitespace runs are collapsed to single spaces before windowing, then a
/// window of `chunk_size` characters sweeps forward by
/// `chunk_size - chunk_overlap` per step. The final chunk may be shorter
/// than `chunk_size`.
///
/// # Example
///
/// ```rust,ignore
/// use minirag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(350, 60);
/// let chunks = chunker.chunk("long document text...");
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk; must be
    ///   greater than `chunk_overlap` (enforced by the config builder)
    /// * `chunk_overlap` — number of overlapping characters between
    ///   consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            return Vec::new();
        }

        // Window over characters, not bytes, so multi-byte input never
        // splits inside a code point.
        let chars: Vec<char> = normalized.chars().collect();
        let step = self.chunk_size.saturating_sub(self.chunk_overlap).max(1);

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}
