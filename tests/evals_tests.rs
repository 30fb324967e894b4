//! Tests for the evaluation helpers and backoff schedule.

use std::time::Duration;

use minirag::evals::{p95_index, recall_hit, summarize};
use minirag::{Hit, backoff_delay};

fn hit(doc_id: &str) -> Hit {
    Hit {
        score: 0.5,
        doc_id: doc_id.to_string(),
        chunk_id: format!("{doc_id}::chunk0"),
        department: "general".to_string(),
        text: "text".to_string(),
    }
}

#[test]
fn recall_hit_checks_doc_ids() {
    let hits = vec![hit("a"), hit("b")];
    assert!(recall_hit(&hits, "b"));
    assert!(!recall_hit(&hits, "c"));
    assert!(!recall_hit(&[], "a"));
}

#[test]
fn p95_index_follows_the_ceiling_rule() {
    assert_eq!(p95_index(1), 0);
    assert_eq!(p95_index(10), 9);
    assert_eq!(p95_index(20), 18);
    assert_eq!(p95_index(100), 94);
}

#[test]
fn summarize_averages_hits_and_picks_p95() {
    let hits = vec![true, true, false, true];
    let latencies = vec![4.0, 1.0, 3.0, 2.0];
    let metrics = summarize(&hits, latencies);
    assert_eq!(metrics.n, 4);
    assert!((metrics.recall_at_k - 0.75).abs() < 1e-9);
    // ceil(0.95 * 4) - 1 = 3, the largest latency in this sample.
    assert_eq!(metrics.p95_latency_ms, 4.0);
}

#[test]
fn summarize_of_nothing_is_all_zeros() {
    let metrics = summarize(&[], vec![]);
    assert_eq!(metrics.n, 0);
    assert_eq!(metrics.recall_at_k, 0.0);
    assert_eq!(metrics.p95_latency_ms, 0.0);
}

#[test]
fn backoff_doubles_until_the_cap() {
    let base = Duration::from_millis(200);
    let cap = Duration::from_secs(5);
    assert_eq!(backoff_delay(0, base, cap), Duration::from_millis(200));
    assert_eq!(backoff_delay(1, base, cap), Duration::from_millis(400));
    assert_eq!(backoff_delay(2, base, cap), Duration::from_millis(800));
    assert_eq!(backoff_delay(4, base, cap), Duration::from_millis(3_200));
    assert_eq!(backoff_delay(5, base, cap), cap);
    assert_eq!(backoff_delay(30, base, cap), cap);
    // Shift overflow saturates rather than wrapping.
    assert_eq!(backoff_delay(200, base, cap), cap);
}

#[test]
fn backoff_is_nondecreasing() {
    let base = Duration::from_millis(100);
    let cap = Duration::from_secs(10);
    let mut previous = Duration::ZERO;
    for attempt in 0..40 {
        let delay = backoff_delay(attempt, base, cap);
        assert!(delay >= previous);
        previous = delay;
    }
}
