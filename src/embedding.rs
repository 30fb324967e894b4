//! Embedding provider trait for generating vector embeddings from text.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::RagConfig;
use crate::error::Result;
use crate::local::HashEmbedder;
use crate::remote::RemoteEmbedder;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a specific backend (a remote embeddings API or the
/// local hash fallback) behind a unified async interface. All vectors are
/// L2-normalized, so inner product equals cosine similarity.
///
/// Two providers must never feed the same index generation: vector spaces
/// are not comparable across models, so switching providers requires a full
/// overwrite rebuild.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding vectors for a batch of text inputs, one vector
    /// per input, in the same order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        Ok(vectors.pop().unwrap_or_else(|| vec![0.0; self.dimensions()]))
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Return the active model name, reported in ingest responses and logs.
    fn model_name(&self) -> &str;
}

/// Select an embedding backend from configuration.
///
/// Uses the remote backend when an API key is configured, otherwise the
/// local hash fallback.
///
/// # Errors
///
/// Returns [`crate::RagError::Embedding`] if the remote backend rejects its
/// configuration.
pub fn provider_from_config(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.api_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => {
            let remote = RemoteEmbedder::new(key, config)?;
            Ok(Arc::new(remote))
        }
        None => Ok(Arc::new(HashEmbedder::new())),
    }
}

/// L2-normalize a vector in place. Zero vectors are left unchanged.
pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
