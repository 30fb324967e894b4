//! File-backed flat vector index.
//!
//! A durable inner-product index over L2-normalized vectors, persisted as
//! two parallel files: a little-endian binary blob of row vectors and a
//! JSON metadata sidecar. Row id is positional: sidecar entry `i` describes
//! blob row `i`, and the two files are always rewritten together.
//!
//! Persistence writes to temporary siblings and renames them into place, so
//! a crash mid-write never leaves a half-updated generation visible.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::document::ChunkMeta;
use crate::error::{RagError, Result};

/// Magic bytes identifying the index blob format.
const MAGIC: &[u8; 4] = b"MRIX";

/// Current blob format version.
const VERSION: u32 = 1;

/// Inner product of two equal-length vectors.
pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// A flat vector index with parallel chunk metadata.
///
/// Vectors are stored row-major in insertion order; search is exhaustive
/// inner product (cosine, since vectors are normalized). The metadata list
/// length always equals the row count.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dim: usize,
    vectors: Vec<f32>,
    meta: Vec<ChunkMeta>,
    index_path: PathBuf,
    meta_path: PathBuf,
}

impl VectorIndex {
    /// Load an index from disk, or initialize an empty one.
    ///
    /// Missing files mean a fresh deployment and yield an empty index. A
    /// stored dimensionality different from `dim` means the embedding model
    /// changed; the stored generation is unusable with the new model, so an
    /// empty index is returned and a warning logged.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexIo`] if either file exists but is
    /// unreadable, corrupt, or inconsistent with its sibling.
    pub fn load(
        index_path: impl Into<PathBuf>,
        meta_path: impl Into<PathBuf>,
        dim: usize,
    ) -> Result<Self> {
        let index_path = index_path.into();
        let meta_path = meta_path.into();

        if !index_path.exists() || !meta_path.exists() {
            debug!(index_path = %index_path.display(), "no persisted index, starting empty");
            return Ok(Self { dim, vectors: Vec::new(), meta: Vec::new(), index_path, meta_path });
        }

        let (stored_dim, vectors) = read_blob(&index_path)?;
        let meta = read_sidecar(&meta_path)?;

        if stored_dim != 0 && stored_dim != dim {
            warn!(
                stored_dim,
                expected_dim = dim,
                "index dimensionality does not match the active embedding model, starting empty"
            );
            return Ok(Self { dim, vectors: Vec::new(), meta: Vec::new(), index_path, meta_path });
        }

        let rows = if stored_dim == 0 { 0 } else { vectors.len() / stored_dim };
        if rows != meta.len() {
            return Err(RagError::IndexIo(format!(
                "index blob has {rows} rows but metadata sidecar has {} entries",
                meta.len()
            )));
        }

        info!(rows, dim, "loaded vector index");
        Ok(Self { dim, vectors, meta, index_path, meta_path })
    }

    /// Number of rows in the index.
    pub fn len(&self) -> usize {
        self.meta.len()
    }

    /// Whether the index has no rows.
    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }

    /// The fixed vector dimensionality of this generation.
    pub fn dimensions(&self) -> usize {
        self.dim
    }

    /// Metadata for a row.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn meta(&self, row: usize) -> &ChunkMeta {
        &self.meta[row]
    }

    /// The stored vector for a row.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn vector(&self, row: usize) -> &[f32] {
        &self.vectors[row * self.dim..(row + 1) * self.dim]
    }

    fn validate_batch(&self, vectors: &[Vec<f32>], meta: &[ChunkMeta]) -> Result<()> {
        if vectors.len() != meta.len() {
            return Err(RagError::Validation(format!(
                "{} vectors paired with {} metadata entries",
                vectors.len(),
                meta.len()
            )));
        }
        for v in vectors {
            if v.len() != self.dim {
                return Err(RagError::Validation(format!(
                    "embedding dimension mismatch: got {}, index uses {}",
                    v.len(),
                    self.dim
                )));
            }
        }
        Ok(())
    }

    /// Replace every row and its metadata, starting a new generation.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Validation`] on a dimension mismatch or unequal
    /// vector/metadata counts. The existing rows are untouched on error.
    pub fn rebuild(&mut self, vectors: Vec<Vec<f32>>, meta: Vec<ChunkMeta>) -> Result<()> {
        self.validate_batch(&vectors, &meta)?;
        self.vectors = vectors.into_iter().flatten().collect();
        self.meta = meta;
        Ok(())
    }

    /// Append rows to the current generation without disturbing existing
    /// ones.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Validation`] on a dimension mismatch or unequal
    /// vector/metadata counts. The existing rows are untouched on error.
    pub fn add(&mut self, vectors: Vec<Vec<f32>>, meta: Vec<ChunkMeta>) -> Result<()> {
        self.validate_batch(&vectors, &meta)?;
        for v in vectors {
            self.vectors.extend_from_slice(&v);
        }
        self.meta.extend(meta);
        Ok(())
    }

    /// Return the `n` nearest rows as `(score, row_id)`, highest similarity
    /// first, ties broken by lowest row id.
    pub fn search(&self, query: &[f32], n: usize) -> Vec<(f32, usize)> {
        if n == 0 || self.is_empty() || query.len() != self.dim {
            return Vec::new();
        }

        let mut scored: Vec<(f32, usize)> =
            (0..self.len()).map(|row| (dot(self.vector(row), query), row)).collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal).then(a.1.cmp(&b.1))
        });
        scored.truncate(n);
        scored
    }

    /// Write both files to disk atomically.
    ///
    /// Each file is written to a temporary sibling and renamed into place,
    /// so concurrent readers observe either the previous generation or this
    /// one, never an intermediate state.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexIo`] on any filesystem failure.
    pub fn persist(&self) -> Result<()> {
        if let Some(parent) = self.index_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| RagError::IndexIo(format!("creating {}: {e}", parent.display())))?;
            }
        }

        let index_tmp = tmp_sibling(&self.index_path);
        let meta_tmp = tmp_sibling(&self.meta_path);

        write_blob(&index_tmp, self.dim, &self.vectors, self.len())?;
        write_sidecar(&meta_tmp, &self.meta)?;

        // Sidecar first; if the blob rename then fails, the next load sees
        // the row-count mismatch and refuses the split pair.
        fs::rename(&meta_tmp, &self.meta_path)
            .map_err(|e| RagError::IndexIo(format!("renaming metadata sidecar: {e}")))?;
        fs::rename(&index_tmp, &self.index_path)
            .map_err(|e| RagError::IndexIo(format!("renaming index blob: {e}")))?;

        debug!(rows = self.len(), "persisted vector index");
        Ok(())
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_blob(path: &Path, dim: usize, vectors: &[f32], rows: usize) -> Result<()> {
    let io_err = |e: std::io::Error| RagError::IndexIo(format!("writing {}: {e}", path.display()));

    let file = File::create(path).map_err(io_err)?;
    let mut w = BufWriter::new(file);
    w.write_all(MAGIC).map_err(io_err)?;
    w.write_all(&VERSION.to_le_bytes()).map_err(io_err)?;
    w.write_all(&(dim as u32).to_le_bytes()).map_err(io_err)?;
    w.write_all(&(rows as u64).to_le_bytes()).map_err(io_err)?;
    for value in vectors {
        w.write_all(&value.to_le_bytes()).map_err(io_err)?;
    }
    w.flush().map_err(io_err)
}

fn read_blob(path: &Path) -> Result<(usize, Vec<f32>)> {
    let io_err = |e: std::io::Error| RagError::IndexIo(format!("reading {}: {e}", path.display()));

    let file = File::open(path).map_err(io_err)?;
    let mut r = BufReader::new(file);

    let mut magic = [0u8; 4];
    r.read_exact(&mut magic).map_err(io_err)?;
    if &magic != MAGIC {
        return Err(RagError::IndexIo(format!("{} is not an index blob", path.display())));
    }

    let mut word = [0u8; 4];
    r.read_exact(&mut word).map_err(io_err)?;
    let version = u32::from_le_bytes(word);
    if version != VERSION {
        return Err(RagError::IndexIo(format!("unsupported index blob version {version}")));
    }

    r.read_exact(&mut word).map_err(io_err)?;
    let dim = u32::from_le_bytes(word) as usize;

    let mut long = [0u8; 8];
    r.read_exact(&mut long).map_err(io_err)?;
    let rows = u64::from_le_bytes(long) as usize;

    let count = rows.checked_mul(dim).ok_or_else(|| {
        RagError::IndexIo(format!("index blob header overflow: {rows} rows x {dim} dims"))
    })?;
    let mut vectors = Vec::with_capacity(count);
    for _ in 0..count {
        r.read_exact(&mut word).map_err(io_err)?;
        vectors.push(f32::from_le_bytes(word));
    }

    // Trailing bytes mean a truncated or mismatched write.
    let mut rest = [0u8; 1];
    match r.read(&mut rest) {
        Ok(0) => Ok((dim, vectors)),
        Ok(_) => Err(RagError::IndexIo(format!(
            "{} has trailing data beyond {rows} rows",
            path.display()
        ))),
        Err(e) => Err(io_err(e)),
    }
}

fn write_sidecar(path: &Path, meta: &[ChunkMeta]) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| RagError::IndexIo(format!("writing {}: {e}", path.display())))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, meta)
        .map_err(|e| RagError::IndexIo(format!("serializing metadata: {e}")))?;
    w.flush().map_err(|e| RagError::IndexIo(format!("writing {}: {e}", path.display())))
}

fn read_sidecar(path: &Path) -> Result<Vec<ChunkMeta>> {
    let file = File::open(path)
        .map_err(|e| RagError::IndexIo(format!("reading {}: {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| RagError::IndexIo(format!("parsing {}: {e}", path.display())))
}
