//! RAG engine facade.
//!
//! [`RagEngine`] owns the chunker, redactor, embedding provider, and the
//! vector index, and exposes the four operations an external HTTP layer
//! calls into: ingest, query, eval, and agent. Ingestion takes the index
//! write lock (single writer); queries share the read lock and never
//! observe a partially-written generation.
//!
//! # Example
//!
//! ```rust,ignore
//! use minirag::{RagEngine, RagConfig};
//!
//! let engine = RagEngine::builder()
//!     .config(RagConfig::from_env())
//!     .build()?;
//!
//! engine.ingest(IngestRequest { docs, overwrite: true }).await?;
//! let out = engine.query(QueryRequest { query: "What counts as PII?".into(), ..Default::default() }).await?;
//! ```

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agent::{self, AgentResult, AgentTool};
use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::RagConfig;
use crate::document::{ChunkMeta, Document, EvalQuery, Hit};
use crate::embedding::{EmbeddingProvider, provider_from_config};
use crate::error::{RagError, Result};
use crate::evals;
use crate::index::VectorIndex;
use crate::redaction::Redactor;
use crate::retriever;

fn default_k() -> i64 {
    4
}

/// Ingest operation input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// The documents to ingest.
    pub docs: Vec<Document>,
    /// When true, the new batch fully replaces the current generation;
    /// otherwise it appends to it.
    #[serde(default)]
    pub overwrite: bool,
}

/// Ingest operation output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Always true on success; failures surface as [`RagError`].
    pub ok: bool,
    /// Number of chunks written to the index.
    pub ingested: usize,
    /// The active embedding model name.
    pub emb_model: String,
}

/// Query operation input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The query text.
    pub query: String,
    /// How many hits to return. Non-positive values yield an empty result.
    #[serde(default = "default_k")]
    pub k: i64,
    /// Optional department filter; hits must match exactly.
    #[serde(default)]
    pub department: Option<String>,
    /// Optional MMR trade-off override; defaults to the configured value.
    #[serde(default)]
    pub mmr_lambda: Option<f32>,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self { query: String::new(), k: default_k(), department: None, mmr_lambda: None }
    }
}

/// Query operation output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Always true on success, including when `hits` is empty.
    pub ok: bool,
    /// The query text as received.
    pub query: String,
    /// Citable hits, best first.
    pub hits: Vec<Hit>,
}

/// Eval operation input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRequest {
    /// The labeled query set.
    pub queries: Vec<EvalQuery>,
    /// Top-k cutoff used for every query.
    #[serde(default = "default_k")]
    pub k: i64,
}

/// Eval operation output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalResponse {
    /// Always true on success.
    pub ok: bool,
    /// Aggregate recall and latency metrics.
    pub metrics: crate::document::EvalMetrics,
}

/// Agent operation input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    /// The goal text the agent plans from.
    pub goal: String,
    /// How many hits the planned retrieval requests.
    #[serde(default = "default_k")]
    pub k: i64,
}

/// Agent operation output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Always true on success.
    pub ok: bool,
    /// The agent's validated result.
    pub result: AgentResult,
}

/// The RAG engine.
///
/// Construct one via [`RagEngine::builder()`]; the builder loads the
/// persisted index generation (or starts empty on a fresh deployment).
pub struct RagEngine {
    config: RagConfig,
    provider: Arc<dyn EmbeddingProvider>,
    chunker: Arc<dyn Chunker>,
    redactor: Redactor,
    index: RwLock<VectorIndex>,
}

impl RagEngine {
    /// Create a new [`RagEngineBuilder`].
    pub fn builder() -> RagEngineBuilder {
        RagEngineBuilder::default()
    }

    /// The active embedding model name.
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Ingest documents: chunk → redact → embed → index → persist.
    ///
    /// With `overwrite` the batch replaces the entire current generation;
    /// both on-disk artifacts are rewritten together and renamed into place
    /// atomically. Without it the batch appends to the current generation.
    ///
    /// # Errors
    ///
    /// - [`RagError::Embedding`] if the provider exhausts its retries.
    /// - [`RagError::Validation`] on an embedding dimension mismatch.
    /// - [`RagError::IndexIo`] if persisting either artifact fails.
    ///
    /// On any error the served generation is unchanged, in memory and on
    /// disk, and the ingest is safe to retry.
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestResponse> {
        let mut texts: Vec<String> = Vec::new();
        let mut metas: Vec<ChunkMeta> = Vec::new();

        for doc in &request.docs {
            let doc_id = if doc.id.trim().is_empty() {
                Uuid::new_v4().to_string()
            } else {
                doc.id.clone()
            };
            let department = if doc.department.trim().is_empty() {
                "general".to_string()
            } else {
                doc.department.clone()
            };

            if !self.config.redaction_enabled {
                warn!(doc_id = %doc_id, "redaction disabled, ingesting unredacted text");
            }

            for (i, piece) in self.chunker.chunk(&doc.text).into_iter().enumerate() {
                let clean = if self.config.redaction_enabled {
                    let findings = self.redactor.detect(&piece);
                    if !findings.is_empty() {
                        let summary: Vec<String> = findings
                            .iter()
                            .map(|(cat, count)| format!("{}={count}", cat.label()))
                            .collect();
                        debug!(doc_id = %doc_id, chunk = i, pii = %summary.join(","), "redacting chunk");
                    }
                    self.redactor.redact(&piece)
                } else {
                    piece
                };

                metas.push(ChunkMeta {
                    doc_id: doc_id.clone(),
                    chunk_id: format!("{doc_id}::chunk{i}"),
                    department: department.clone(),
                    text: clean.clone(),
                });
                texts.push(clean);
            }
        }

        let emb_model = self.provider.model_name().to_string();
        if texts.is_empty() {
            info!(ingested = 0, "ingest produced no chunks");
            return Ok(IngestResponse { ok: true, ingested: 0, emb_model });
        }

        // Embed outside the lock so queries keep flowing.
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let vectors = self.provider.embed_batch(&refs).await?;
        if vectors.len() != metas.len() {
            return Err(RagError::Embedding {
                provider: emb_model,
                message: format!("expected {} vectors, got {}", metas.len(), vectors.len()),
            });
        }

        let ingested = metas.len();
        let mut index = self.index.write().await;

        // Build and persist the new generation on a staged copy; the live
        // index only advances once both artifacts are on disk. A failed
        // persist leaves memory and disk on the previous generation, so a
        // retried append cannot double-ingest the batch.
        let mut staged = index.clone();
        if request.overwrite {
            staged.rebuild(vectors, metas)?;
        } else {
            staged.add(vectors, metas)?;
        }
        staged.persist()?;
        *index = staged;

        info!(ingested, overwrite = request.overwrite, total_rows = index.len(), "ingest complete");
        Ok(IngestResponse { ok: true, ingested, emb_model })
    }

    /// Retrieve citable hits for a query.
    ///
    /// Empty results are not errors: an empty or whitespace query, a
    /// non-positive `k`, an empty index, or a department filter matching
    /// nothing all return `ok = true` with no hits.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Validation`] if the request's `mmr_lambda`
    /// override is outside `[0.0, 1.0]`.
    pub async fn query(&self, request: QueryRequest) -> Result<QueryResponse> {
        let hits = self
            .search_hits(&request.query, request.k, request.department.as_deref(), request.mmr_lambda)
            .await?;
        Ok(QueryResponse { ok: true, query: request.query, hits })
    }

    /// Run a labeled query set and report recall@k and p95 latency.
    pub async fn evaluate(&self, request: EvalRequest) -> Result<EvalResponse> {
        let mut hits_per_query = Vec::with_capacity(request.queries.len());
        let mut latencies_ms = Vec::with_capacity(request.queries.len());

        for item in &request.queries {
            let start = Instant::now();
            let hits = self.search_hits(&item.q, request.k, None, None).await?;
            latencies_ms.push(start.elapsed().as_secs_f64() * 1000.0);
            hits_per_query.push(evals::recall_hit(&hits, &item.expected_doc_id));
        }

        let metrics = evals::summarize(&hits_per_query, latencies_ms);
        info!(n = metrics.n, recall_at_k = metrics.recall_at_k, "evaluation complete");
        Ok(EvalResponse { ok: true, metrics })
    }

    /// Run the single-step agent: plan → execute → validate.
    pub async fn run_agent(&self, request: AgentRequest) -> Result<AgentResponse> {
        let call = agent::plan(&request.goal, request.k);
        debug!(tool = call.tool.name(), k = call.k, "agent executing planned call");

        let hits = match call.tool {
            AgentTool::RagSearch => self.search_hits(&call.query, call.k, None, None).await?,
        };

        let valid = agent::validate(&hits);
        Ok(AgentResponse { ok: true, result: AgentResult { hits, valid } })
    }

    async fn search_hits(
        &self,
        query: &str,
        k: i64,
        department: Option<&str>,
        mmr_lambda: Option<f32>,
    ) -> Result<Vec<Hit>> {
        // A request override gets the same bounds check the config builder
        // applies to the default; NaN fails the range test too.
        if let Some(lambda) = mmr_lambda {
            if !(0.0..=1.0).contains(&lambda) {
                return Err(RagError::Validation(format!(
                    "mmr_lambda ({lambda}) must be within [0.0, 1.0]"
                )));
            }
        }
        if k <= 0 {
            return Ok(Vec::new());
        }
        let normalized = query.trim();
        if normalized.is_empty() {
            return Ok(Vec::new());
        }

        // The query passes through the same redaction as indexed text, so
        // PII in questions never reaches the remote embedding API.
        let clean = self.redactor.redact(normalized);
        let query_vec = self.provider.embed(&clean).await?;

        let lambda = mmr_lambda.unwrap_or(self.config.mmr_lambda);
        let index = self.index.read().await;
        Ok(retriever::search_index(
            &index,
            &query_vec,
            k as usize,
            department,
            lambda,
            self.config.pool_multiplier,
            self.config.snippet_len,
        ))
    }
}

/// Builder for constructing a [`RagEngine`].
///
/// Only the configuration is required; the embedding provider defaults to
/// the configured backend selection and the chunker to a
/// [`FixedSizeChunker`] with the configured size and overlap.
#[derive(Default)]
pub struct RagEngineBuilder {
    config: Option<RagConfig>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagEngineBuilder {
    /// Set the engine configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Override the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagEngine`], compiling the redaction table and loading
    /// the persisted index generation.
    ///
    /// # Errors
    ///
    /// - [`RagError::Config`] if no configuration was provided.
    /// - [`RagError::Redaction`] if the pattern table fails to compile.
    /// - [`RagError::IndexIo`] if persisted index files exist but are
    ///   unreadable or corrupt.
    pub fn build(self) -> Result<RagEngine> {
        let config =
            self.config.ok_or_else(|| RagError::Config("config is required".to_string()))?;

        let provider = match self.provider {
            Some(provider) => provider,
            None => provider_from_config(&config)?,
        };
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap))
        });

        let redactor = Redactor::new()?;
        let index =
            VectorIndex::load(&config.index_path, &config.meta_path, provider.dimensions())?;

        Ok(RagEngine { config, provider, chunker, redactor, index: RwLock::new(index) })
    }
}
