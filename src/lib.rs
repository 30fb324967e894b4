//! # minirag
//!
//! A retrieval-augmented-generation engine: document ingestion with
//! chunking and PII redaction, pluggable embeddings (remote API or local
//! hash fallback), a durable file-backed vector index, Maximal-Marginal-
//! Relevance retrieval with citations, a recall/latency evaluation harness,
//! and a minimal single-tool planning agent.
//!
//! The crate exposes four request/response contracts — ingest, query, eval,
//! and agent — intended to be wrapped by an external HTTP layer that
//! handles validation, authentication, and rate limiting.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use minirag::{Document, IngestRequest, QueryRequest, RagConfig, RagEngine};
//!
//! #[tokio::main]
//! async fn main() -> minirag::Result<()> {
//!     let engine = RagEngine::builder().config(RagConfig::from_env()).build()?;
//!
//!     engine
//!         .ingest(IngestRequest {
//!             docs: vec![Document {
//!                 id: "HR-Leave-Policy".into(),
//!                 department: "HR".into(),
//!                 text: "Employees accrue leave at ...".into(),
//!             }],
//!             overwrite: true,
//!         })
//!         .await?;
//!
//!     let out = engine
//!         .query(QueryRequest { query: "How does leave accrue?".into(), k: 4, ..Default::default() })
//!         .await?;
//!     println!("{:?}", out.hits);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod evals;
pub mod index;
pub mod local;
pub mod redaction;
pub mod remote;
pub mod retriever;

pub use agent::{AgentResult, AgentTool, ToolCall};
pub use chunking::{Chunker, FixedSizeChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{ChunkMeta, Document, EvalMetrics, EvalQuery, Hit};
pub use embedding::{EmbeddingProvider, provider_from_config};
pub use engine::{
    AgentRequest, AgentResponse, EvalRequest, EvalResponse, IngestRequest, IngestResponse,
    QueryRequest, QueryResponse, RagEngine, RagEngineBuilder,
};
pub use error::{RagError, Result};
pub use index::VectorIndex;
pub use local::HashEmbedder;
pub use redaction::{PiiCategory, Redactor};
pub use remote::{RemoteEmbedder, backoff_delay};
pub use retriever::{Candidate, mmr_select, search_index};
