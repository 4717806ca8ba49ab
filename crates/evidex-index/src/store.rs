//! Append-only chunk sequence with a row-aligned embedding matrix.

use evidex_core::types::Chunk;
use evidex_core::{IndexError, Result};
use tracing::debug;

/// Chunks and their vectors, stored position-for-position.
///
/// Vectors live in one row-major buffer whose width is fixed by the first
/// non-empty batch and released again by [`ChunkStore::clear`].
#[derive(Debug, Default, Clone)]
pub struct ChunkStore {
    chunks: Vec<Chunk>,
    matrix: Vec<f32>,
    dim: Option<usize>,
}

/// Read-only view of the embedding matrix.
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a> {
    data: &'a [f32],
    dim: usize,
}

impl<'a> MatrixView<'a> {
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, position: usize) -> Option<&'a [f32]> {
        let start = position.checked_mul(self.dim)?;
        self.data.get(start..start + self.dim)
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [f32]> + 'a {
        // chunks_exact panics on zero width; an empty view has no rows anyway.
        self.data.chunks_exact(self.dim.max(1))
    }
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunks` with their `vectors`, preserving input order.
    ///
    /// Each chunk's `chunk_id` is rewritten to its store position. The batch
    /// is validated in full before anything is written, so a rejected batch
    /// leaves the store untouched. An empty batch is a no-op.
    pub fn append(&mut self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<()> {
        if chunks.len() != vectors.len() {
            return Err(IndexError::InvariantViolation {
                chunks: chunks.len(),
                vectors: vectors.len(),
            });
        }
        if chunks.is_empty() {
            return Ok(());
        }
        let width = self.dim.unwrap_or(vectors[0].len());
        if width == 0 {
            return Err(IndexError::DimensionMismatch { expected: 1, actual: 0 });
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != width) {
            return Err(IndexError::DimensionMismatch {
                expected: width,
                actual: bad.len(),
            });
        }

        let base = self.chunks.len();
        self.matrix.reserve(width * vectors.len());
        for v in &vectors {
            self.matrix.extend_from_slice(v);
        }
        self.chunks.extend(chunks.into_iter().enumerate().map(|(offset, mut chunk)| {
            chunk.chunk_id = base + offset;
            chunk
        }));
        self.dim = Some(width);
        debug!(added = vectors.len(), total = self.chunks.len(), dim = width, "appended batch");
        self.check_invariant()
    }

    /// Drop every chunk and vector. Idempotent.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.matrix.clear();
        self.dim = None;
    }

    pub fn get(&self, position: usize) -> Result<&Chunk> {
        self.chunks.get(position).ok_or(IndexError::IndexOutOfRange {
            position,
            size: self.chunks.len(),
        })
    }

    pub fn size(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Width of stored vectors, `None` while the store is empty.
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn all_vectors(&self) -> MatrixView<'_> {
        MatrixView { data: &self.matrix, dim: self.dim.unwrap_or(0) }
    }

    /// Row count of the matrix must equal the chunk count.
    pub fn check_invariant(&self) -> Result<()> {
        let rows = match self.dim {
            Some(d) if self.matrix.len() % d == 0 => self.matrix.len() / d,
            Some(_) => usize::MAX,
            None if self.matrix.is_empty() => 0,
            None => usize::MAX,
        };
        if rows == self.chunks.len() {
            Ok(())
        } else {
            Err(IndexError::InvariantViolation {
                chunks: self.chunks.len(),
                vectors: rows,
            })
        }
    }
}
