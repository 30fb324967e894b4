//! Local fallback embedding backend.
//!
//! Deterministic hash-bucket vectors: no network, no model weights, almost
//! no memory. Not semantically strong, but exact-text and shared-vocabulary
//! retrieval works, which is enough for development and tests.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::embedding::{EmbeddingProvider, l2_normalize};
use crate::error::Result;

/// The default dimensionality for hash vectors.
const DEFAULT_DIM: usize = 32;

/// An [`EmbeddingProvider`] that buckets SHA-256 token hashes into a small
/// fixed-dimension vector.
///
/// Tokenizes on whitespace after lowercasing; each token increments one
/// bucket chosen by its hash; the result is L2-normalized. Deterministic
/// across runs and platforms.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
    name: String,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::with_dimensions(DEFAULT_DIM)
    }
}

impl HashEmbedder {
    /// Create a hash embedder with the default dimensionality (32).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hash embedder with a custom dimensionality.
    pub fn with_dimensions(dim: usize) -> Self {
        Self { dim, name: format!("local-hash-{dim}") }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        for token in text.to_lowercase().split_whitespace() {
            let digest = Sha256::digest(token.as_bytes());
            let bucket =
                u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize
                    % self.dim;
            v[bucket] += 1.0;
        }
        l2_normalize(&mut v);
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dim
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}
