//! Evaluation helpers: recall@k and latency percentiles.

use crate::document::{EvalMetrics, Hit};

/// Whether the expected document appears among the returned hits.
pub fn recall_hit(hits: &[Hit], expected_doc_id: &str) -> bool {
    hits.iter().any(|h| h.doc_id == expected_doc_id)
}

/// The 0-indexed position of the 95th percentile in a sorted sample of
/// size `n`: `ceil(0.95 * n) - 1`.
pub fn p95_index(n: usize) -> usize {
    ((0.95 * n as f64).ceil() as usize).saturating_sub(1)
}

/// Aggregate per-query hit indicators and latencies into [`EvalMetrics`].
///
/// An empty run reports all-zero metrics with `n = 0` rather than
/// undefined values, so callers can detect the empty-input case.
pub fn summarize(hits: &[bool], mut latencies_ms: Vec<f64>) -> EvalMetrics {
    let n = hits.len();
    if n == 0 {
        return EvalMetrics { recall_at_k: 0.0, p95_latency_ms: 0.0, n: 0 };
    }

    let recall_at_k = hits.iter().filter(|&&hit| hit).count() as f64 / n as f64;

    latencies_ms.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let p95_latency_ms = latencies_ms[p95_index(latencies_ms.len())];

    EvalMetrics { recall_at_k, p95_latency_ms, n }
}
