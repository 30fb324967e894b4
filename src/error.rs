//! Error types for the `minirag` crate.

use thiserror::Error;

/// Errors that can occur in RAG engine operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Malformed ingest/query/eval input, e.g. a vector dimension mismatch.
    ///
    /// Never mutates persisted state; callers should surface this as a
    /// client-side failure.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The embedding provider failed after exhausting its retries.
    ///
    /// Surfaced as a transient service-unavailable condition so the caller
    /// may retry later.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The index blob or metadata sidecar exists but is unreadable or corrupt.
    ///
    /// Fatal for the affected operation; never silently repaired.
    #[error("Index I/O error: {0}")]
    IndexIo(String),

    /// The PII pattern engine failed during construction or ingest.
    #[error("Redaction error: {0}")]
    Redaction(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for RAG engine operations.
pub type Result<T> = std::result::Result<T, RagError>;
