//! Configuration for the RAG engine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the RAG engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Candidate pool oversampling factor for MMR: the retriever fetches
    /// `max(k * pool_multiplier, k)` raw candidates before reranking.
    pub pool_multiplier: usize,
    /// Default MMR relevance/diversity trade-off. `1.0` is pure relevance,
    /// `0.0` is maximum diversity.
    pub mmr_lambda: f32,
    /// Maximum hit text length in characters for citation display.
    pub snippet_len: usize,
    /// Whether PII redaction runs before embedding and persistence.
    /// Disabling this lets unredacted text reach the index; ingest logs a
    /// warning per document when it is off.
    pub redaction_enabled: bool,
    /// Path of the vector index blob.
    pub index_path: PathBuf,
    /// Path of the metadata sidecar file.
    pub meta_path: PathBuf,
    /// API key for the remote embedding backend. When unset or empty the
    /// local hash fallback is used instead.
    pub api_key: Option<String>,
    /// Remote embedding model name.
    pub remote_model: String,
    /// Maximum number of retries for transient remote embedding failures.
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries, in milliseconds.
    pub backoff_base_ms: u64,
    /// Upper bound on the backoff delay, in milliseconds.
    pub backoff_cap_ms: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 350,
            chunk_overlap: 60,
            pool_multiplier: 4,
            mmr_lambda: 0.6,
            snippet_len: 220,
            redaction_enabled: true,
            index_path: PathBuf::from("instance/rag_index.bin"),
            meta_path: PathBuf::from("instance/rag_meta.json"),
            api_key: None,
            remote_model: "text-embedding-3-small".to_string(),
            max_retries: 3,
            backoff_base_ms: 200,
            backoff_cap_ms: 5_000,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Build a configuration from the environment.
    ///
    /// Reads `OPENAI_API_KEY`; when set and non-empty the remote embedding
    /// backend is selected, otherwise the local hash fallback is used.
    pub fn from_env() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        Self { api_key, ..Self::default() }
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the candidate pool oversampling factor for MMR.
    pub fn pool_multiplier(mut self, multiplier: usize) -> Self {
        self.config.pool_multiplier = multiplier;
        self
    }

    /// Set the default MMR relevance/diversity trade-off.
    pub fn mmr_lambda(mut self, lambda: f32) -> Self {
        self.config.mmr_lambda = lambda;
        self
    }

    /// Set the maximum hit text length for citation display.
    pub fn snippet_len(mut self, len: usize) -> Self {
        self.config.snippet_len = len;
        self
    }

    /// Enable or disable PII redaction at ingest.
    pub fn redaction_enabled(mut self, enabled: bool) -> Self {
        self.config.redaction_enabled = enabled;
        self
    }

    /// Set the vector index blob path.
    pub fn index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.index_path = path.into();
        self
    }

    /// Set the metadata sidecar path.
    pub fn meta_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.meta_path = path.into();
        self
    }

    /// Set the API key for the remote embedding backend.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Set the remote embedding model name.
    pub fn remote_model(mut self, model: impl Into<String>) -> Self {
        self.config.remote_model = model.into();
        self
    }

    /// Set the maximum number of retries for transient embedding failures.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0` or `chunk_overlap >= chunk_size`
    /// - `pool_multiplier == 0`
    /// - `mmr_lambda` is outside `[0.0, 1.0]`
    /// - `snippet_len == 0`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.pool_multiplier == 0 {
            return Err(RagError::Config("pool_multiplier must be greater than zero".to_string()));
        }
        if !(0.0..=1.0).contains(&self.config.mmr_lambda) {
            return Err(RagError::Config(format!(
                "mmr_lambda ({}) must be within [0.0, 1.0]",
                self.config.mmr_lambda
            )));
        }
        if self.config.snippet_len == 0 {
            return Err(RagError::Config("snippet_len must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}
