//! Persistence and search tests for the file-backed vector index.

use std::fs;
use std::path::Path;

use minirag::{ChunkMeta, RagError, VectorIndex};
use tempfile::TempDir;

fn meta(doc: &str, chunk: usize) -> ChunkMeta {
    ChunkMeta {
        doc_id: doc.to_string(),
        chunk_id: format!("{doc}::chunk{chunk}"),
        department: "general".to_string(),
        text: format!("{doc} text {chunk}"),
    }
}

fn open(dir: &Path, dim: usize) -> VectorIndex {
    VectorIndex::load(dir.join("rag_index.bin"), dir.join("rag_meta.json"), dim).unwrap()
}

#[test]
fn missing_files_load_as_an_empty_index() {
    let dir = TempDir::new().unwrap();
    let index = open(dir.path(), 4);
    assert!(index.is_empty());
    assert_eq!(index.len(), 0);
    assert!(index.search(&[1.0, 0.0, 0.0, 0.0], 5).is_empty());
}

#[test]
fn persist_and_reload_round_trips() {
    let dir = TempDir::new().unwrap();

    let mut index = open(dir.path(), 2);
    index
        .add(
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![meta("doc-a", 0), meta("doc-b", 0)],
        )
        .unwrap();
    index.persist().unwrap();

    let reloaded = open(dir.path(), 2);
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.meta(0).doc_id, "doc-a");
    assert_eq!(reloaded.meta(1).doc_id, "doc-b");
    assert_eq!(reloaded.vector(1), &[0.0, 1.0]);

    let results = reloaded.search(&[1.0, 0.0], 2);
    assert_eq!(results[0].1, 0);
    assert!(results[0].0 > results[1].0);
}

#[test]
fn rebuild_replaces_every_row() {
    let dir = TempDir::new().unwrap();

    let mut index = open(dir.path(), 2);
    index.add(vec![vec![1.0, 0.0]], vec![meta("old", 0)]).unwrap();
    index.rebuild(vec![vec![0.0, 1.0], vec![1.0, 0.0]], vec![meta("new-a", 0), meta("new-b", 0)]).unwrap();

    assert_eq!(index.len(), 2);
    assert!(!(0..index.len()).any(|row| index.meta(row).doc_id == "old"));
}

#[test]
fn dimension_mismatch_is_a_validation_error() {
    let dir = TempDir::new().unwrap();
    let mut index = open(dir.path(), 4);

    let err = index.add(vec![vec![1.0, 0.0]], vec![meta("doc", 0)]).unwrap_err();
    assert!(matches!(err, RagError::Validation(_)));
    assert!(index.is_empty());
}

#[test]
fn unpaired_vectors_and_metadata_are_rejected() {
    let dir = TempDir::new().unwrap();
    let mut index = open(dir.path(), 2);

    let err = index.add(vec![vec![1.0, 0.0]], vec![meta("a", 0), meta("b", 0)]).unwrap_err();
    assert!(matches!(err, RagError::Validation(_)));
}

#[test]
fn corrupt_blob_is_an_index_io_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("rag_index.bin"), b"not an index at all").unwrap();
    fs::write(dir.path().join("rag_meta.json"), b"[]").unwrap();

    let err =
        VectorIndex::load(dir.path().join("rag_index.bin"), dir.path().join("rag_meta.json"), 4)
            .unwrap_err();
    assert!(matches!(err, RagError::IndexIo(_)));
}

#[test]
fn blob_and_sidecar_row_count_disagreement_is_an_index_io_error() {
    let dir = TempDir::new().unwrap();

    let mut index = open(dir.path(), 2);
    index.add(vec![vec![1.0, 0.0]], vec![meta("doc", 0)]).unwrap();
    index.persist().unwrap();

    // Rewrite the sidecar with an extra entry the blob does not have.
    let extra = vec![meta("doc", 0), meta("ghost", 0)];
    fs::write(dir.path().join("rag_meta.json"), serde_json::to_vec(&extra).unwrap()).unwrap();

    let err =
        VectorIndex::load(dir.path().join("rag_index.bin"), dir.path().join("rag_meta.json"), 2)
            .unwrap_err();
    assert!(matches!(err, RagError::IndexIo(_)));
}

#[test]
fn dimension_change_starts_an_empty_generation() {
    let dir = TempDir::new().unwrap();

    let mut index = open(dir.path(), 2);
    index.add(vec![vec![1.0, 0.0]], vec![meta("doc", 0)]).unwrap();
    index.persist().unwrap();

    // Loading with a different model dimensionality must not reuse rows.
    let switched = open(dir.path(), 8);
    assert!(switched.is_empty());
    assert_eq!(switched.dimensions(), 8);
}

#[test]
fn search_orders_by_score_then_row_id() {
    let dir = TempDir::new().unwrap();

    let mut index = open(dir.path(), 2);
    index
        .add(
            vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 0.0]],
            vec![meta("far", 0), meta("near-a", 0), meta("near-b", 0)],
        )
        .unwrap();

    let results = index.search(&[1.0, 0.0], 3);
    // Rows 1 and 2 tie on score; the lower row id wins.
    assert_eq!(results.iter().map(|r| r.1).collect::<Vec<_>>(), vec![1, 2, 0]);
}

#[test]
fn search_n_larger_than_index_returns_all_rows() {
    let dir = TempDir::new().unwrap();

    let mut index = open(dir.path(), 2);
    index.add(vec![vec![1.0, 0.0]], vec![meta("doc", 0)]).unwrap();
    assert_eq!(index.search(&[1.0, 0.0], 50).len(), 1);
}

#[test]
fn persist_leaves_no_temporary_files() {
    let dir = TempDir::new().unwrap();

    let mut index = open(dir.path(), 2);
    index.add(vec![vec![1.0, 0.0]], vec![meta("doc", 0)]).unwrap();
    index.persist().unwrap();

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().all(|n| !n.ends_with(".tmp")), "leftover temp files: {names:?}");
    assert!(names.contains(&"rag_index.bin".to_string()));
    assert!(names.contains(&"rag_meta.json".to_string()));
}

#[test]
fn failed_sidecar_rename_keeps_the_previous_blob() {
    let dir = TempDir::new().unwrap();

    let mut index = open(dir.path(), 2);
    index.add(vec![vec![1.0, 0.0]], vec![meta("doc-a", 0)]).unwrap();
    index.persist().unwrap();
    let old_blob = fs::read(dir.path().join("rag_index.bin")).unwrap();

    // Block the sidecar rename by putting a directory in its place.
    fs::remove_file(dir.path().join("rag_meta.json")).unwrap();
    fs::create_dir(dir.path().join("rag_meta.json")).unwrap();

    index.add(vec![vec![0.0, 1.0]], vec![meta("doc-b", 0)]).unwrap();
    let err = index.persist().unwrap_err();
    assert!(matches!(err, RagError::IndexIo(_)));

    // The sidecar renames first, so the blob still holds the old generation.
    assert_eq!(fs::read(dir.path().join("rag_index.bin")).unwrap(), old_blob);
}

#[test]
fn persist_creates_missing_parent_directories() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("instance");

    let mut index =
        VectorIndex::load(nested.join("rag_index.bin"), nested.join("rag_meta.json"), 2).unwrap();
    index.add(vec![vec![1.0, 0.0]], vec![meta("doc", 0)]).unwrap();
    index.persist().unwrap();

    assert!(nested.join("rag_index.bin").exists());
    assert!(nested.join("rag_meta.json").exists());
}
