//! Retrieval with department filtering and MMR reranking.
//!
//! Candidates come from an oversampled raw similarity search; Maximal
//! Marginal Relevance then trades relevance against redundancy among the
//! already-selected results, producing citable [`Hit`]s.

use tracing::debug;

use crate::document::Hit;
use crate::index::{VectorIndex, dot};

/// One member of the MMR candidate pool.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    /// Row id in the vector index; the final tie-break key.
    pub row: usize,
    /// Raw query similarity from the candidate search.
    pub score: f32,
    /// The candidate's stored vector.
    pub vector: &'a [f32],
}

/// Select up to `k` candidates by Maximal Marginal Relevance.
///
/// Repeatedly picks the remaining candidate maximizing
/// `lambda * sim(query, candidate) - (1 - lambda) * max(sim(candidate, s))`
/// over the already-selected set `s`. Ties break by higher raw similarity,
/// then lower row id. `lambda = 1` degenerates to the pure relevance
/// ranking; `lambda = 0` maximizes diversity.
///
/// Returns indices into `pool` in selection order.
pub fn mmr_select(pool: &[Candidate<'_>], k: usize, lambda: f32) -> Vec<usize> {
    let mut selected: Vec<usize> = Vec::with_capacity(k.min(pool.len()));
    let mut remaining: Vec<usize> = (0..pool.len()).collect();

    while selected.len() < k && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_key = (f32::NEG_INFINITY, f32::NEG_INFINITY, usize::MAX);

        for (pos, &j) in remaining.iter().enumerate() {
            let relevance = pool[j].score;
            let redundancy = if selected.is_empty() {
                0.0
            } else {
                selected
                    .iter()
                    .map(|&s| dot(pool[s].vector, pool[j].vector))
                    .fold(f32::NEG_INFINITY, f32::max)
            };
            let score = lambda * relevance - (1.0 - lambda) * redundancy;

            let key = (score, relevance, pool[j].row);
            if key.0 > best_key.0
                || (key.0 == best_key.0 && key.1 > best_key.1)
                || (key.0 == best_key.0 && key.1 == best_key.1 && key.2 < best_key.2)
            {
                best_key = key;
                best_pos = pos;
            }
        }

        selected.push(remaining.swap_remove(best_pos));
    }

    selected
}

/// Run the candidate search, department filter, and MMR rerank against an
/// index, mapping the selection to citable hits.
///
/// Empty results are not errors: a `k` of zero, an empty index, or a filter
/// matching nothing all yield an empty list.
pub fn search_index(
    index: &VectorIndex,
    query_vec: &[f32],
    k: usize,
    department: Option<&str>,
    lambda: f32,
    pool_multiplier: usize,
    snippet_len: usize,
) -> Vec<Hit> {
    if k == 0 || index.is_empty() {
        return Vec::new();
    }

    // Oversample so MMR has material to diversify over.
    let pool_size = k.saturating_mul(pool_multiplier).max(k);
    let raw = index.search(query_vec, pool_size);

    let pool: Vec<Candidate<'_>> = raw
        .into_iter()
        .filter(|&(_, row)| {
            department.is_none_or(|dept| index.meta(row).department == dept)
        })
        .map(|(score, row)| Candidate { row, score, vector: index.vector(row) })
        .collect();

    if pool.is_empty() {
        return Vec::new();
    }

    let order = mmr_select(&pool, k, lambda);
    debug!(pool = pool.len(), selected = order.len(), lambda, "mmr selection complete");

    order
        .into_iter()
        .map(|i| {
            let candidate = &pool[i];
            let meta = index.meta(candidate.row);
            Hit {
                score: round4(candidate.score),
                doc_id: meta.doc_id.clone(),
                chunk_id: meta.chunk_id.clone(),
                department: meta.department.clone(),
                text: snippet(&meta.text, snippet_len),
            }
        })
        .collect()
}

/// Truncate text to `max_chars` characters for citation display, appending
/// an ellipsis when truncation happened.
fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

fn round4(score: f32) -> f32 {
    (score * 10_000.0).round() / 10_000.0
}
