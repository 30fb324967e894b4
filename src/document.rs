//! Data types for documents, chunk metadata, hits, and evaluation records.

use serde::{Deserialize, Serialize};

/// A caller-supplied source document for ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier within one ingest batch. Empty ids are replaced
    /// with a generated UUID at ingest.
    #[serde(default)]
    pub id: String,
    /// Owning department, used for metadata filtering at query time.
    /// Empty departments default to `"general"`.
    #[serde(default)]
    pub department: String,
    /// The text content of the document.
    #[serde(default)]
    pub text: String,
}

/// Metadata for one indexed chunk, stored in the sidecar file parallel to
/// the vector blob. Row position in the sidecar equals the vector's row id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMeta {
    /// The parent document id.
    pub doc_id: String,
    /// Chunk identifier, `{doc_id}::chunk{i}`, unique within the document.
    pub chunk_id: String,
    /// Department inherited from the parent document.
    pub department: String,
    /// The redacted chunk text.
    pub text: String,
}

/// A citable retrieval result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hit {
    /// Similarity score (inner product on normalized vectors), rounded to
    /// four decimal places.
    pub score: f32,
    /// The source document id.
    pub doc_id: String,
    /// The source chunk id.
    pub chunk_id: String,
    /// The source department.
    pub department: String,
    /// Chunk text truncated for citation display.
    pub text: String,
}

/// One labeled evaluation query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalQuery {
    /// The question to retrieve for.
    pub q: String,
    /// The document id expected among the top-k hits.
    pub expected_doc_id: String,
}

/// Aggregate metrics for one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalMetrics {
    /// Fraction of queries whose expected document appeared in the top-k.
    pub recall_at_k: f64,
    /// 95th-percentile per-query retrieval latency in milliseconds.
    pub p95_latency_ms: f64,
    /// Number of queries evaluated. Zero means the input set was empty.
    pub n: usize,
}
