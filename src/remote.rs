//! Remote embedding backend.
//!
//! Calls an OpenAI-compatible `/v1/embeddings` endpoint via `reqwest`.
//! Transient failures (connection errors, timeouts, 429 and 5xx responses)
//! are retried with exponential backoff and jitter; exhausting the retries
//! yields [`RagError::Embedding`], which callers surface as a
//! service-unavailable condition.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::RagConfig;
use crate::embedding::{EmbeddingProvider, l2_normalize};
use crate::error::{RagError, Result};

/// The default embeddings API endpoint.
const EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// The default dimensionality for `text-embedding-3-small`.
const DEFAULT_DIMENSIONS: usize = 1536;

/// Compute the backoff delay for a retry attempt (0-based): `base * 2^attempt`,
/// saturating at `cap`.
///
/// Deliberately deterministic; jitter is applied separately by the caller.
pub fn backoff_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.checked_mul(factor).unwrap_or(cap).min(cap)
}

/// Multiply a delay by a random factor in `[0.5, 1.5)` so concurrent
/// retries spread out instead of stampeding.
fn jittered(delay: Duration) -> Duration {
    delay.mul_f64(0.5 + rand::random::<f64>())
}

/// How a single request attempt failed, deciding whether to retry.
enum RequestFailure {
    /// Timeouts, connection errors, 429 and 5xx responses.
    Transient(String),
    /// Everything else; retrying would not help.
    Fatal(String),
}

/// An [`EmbeddingProvider`] backed by an OpenAI-compatible embeddings API.
///
/// Returned vectors are L2-normalized before use so inner product search
/// behaves as cosine similarity.
pub struct RemoteEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
    max_retries: u32,
    backoff_base: Duration,
    backoff_cap: Duration,
}

impl RemoteEmbedder {
    /// Create a new remote embedder from the given API key and configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if the API key is empty.
    pub fn new(api_key: impl Into<String>, config: &RagConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Embedding {
                provider: "remote".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: config.remote_model.clone(),
            dimensions: DEFAULT_DIMENSIONS,
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_cap: Duration::from_millis(config.backoff_cap_ms),
        })
    }

    /// Override the reported dimensionality (for models other than the
    /// default).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }

    async fn request(&self, texts: &[&str]) -> std::result::Result<Vec<Vec<f32>>, RequestFailure> {
        let body = EmbeddingRequest { model: &self.model, input: texts.to_vec() };

        let response = self
            .client
            .post(EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RequestFailure::Transient(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            let message = format!("API returned {status}: {detail}");
            return if status.as_u16() == 429 || status.is_server_error() {
                Err(RequestFailure::Transient(message))
            } else {
                Err(RequestFailure::Fatal(message))
            };
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| RequestFailure::Fatal(format!("failed to parse response: {e}")))?;

        let mut vectors: Vec<Vec<f32>> =
            parsed.data.into_iter().map(|d| d.embedding).collect();
        for v in &mut vectors {
            l2_normalize(v);
        }
        Ok(vectors)
    }
}

// ── API request/response types ─────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(batch_size = texts.len(), model = %self.model, "embedding batch");

        let mut attempt = 0;
        loop {
            match self.request(texts).await {
                Ok(vectors) => return Ok(vectors),
                Err(RequestFailure::Transient(message)) if attempt < self.max_retries => {
                    let delay = jittered(backoff_delay(attempt, self.backoff_base, self.backoff_cap));
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        %message,
                        "transient embedding failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(RequestFailure::Transient(message)) => {
                    error!(attempts = attempt + 1, %message, "embedding retries exhausted");
                    return Err(RagError::Embedding { provider: self.model.clone(), message });
                }
                Err(RequestFailure::Fatal(message)) => {
                    error!(%message, "embedding request failed");
                    return Err(RagError::Embedding { provider: self.model.clone(), message });
                }
            }
        }
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
