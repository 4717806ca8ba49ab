//! Exact cosine ranking over every stored vector.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use evidex_core::{IndexError, Result};

use crate::store::MatrixView;

/// Cosine similarity in `[-1, 1]`; 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    // Adding 0.0 turns -0.0 into 0.0 so equal scores tie under total_cmp.
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0) + 0.0
}

/// A scored position. Greater means a better hit: higher score first, then
/// lower position.
#[derive(Debug, Clone, Copy)]
struct Scored {
    position: usize,
    score: f32,
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.position.cmp(&self.position))
    }
}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}

/// Top `k` `(position, score)` pairs by descending score, ties broken by
/// ascending position. `k` is clamped to the number of stored rows.
///
/// Fails with `EmptyIndex` when there are no rows and with
/// `DimensionMismatch` when the query width differs from the matrix.
pub fn rank(matrix: MatrixView<'_>, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
    if matrix.is_empty() {
        return Err(IndexError::EmptyIndex);
    }
    if query.len() != matrix.dim() {
        return Err(IndexError::DimensionMismatch {
            expected: matrix.dim(),
            actual: query.len(),
        });
    }
    let k = k.min(matrix.len());
    if k == 0 {
        return Ok(vec![]);
    }

    // Min-heap of the best k seen so far; the root is the weakest kept hit.
    let mut heap: BinaryHeap<Reverse<Scored>> = BinaryHeap::with_capacity(k + 1);
    for (position, row) in matrix.rows().enumerate() {
        let candidate = Scored {
            position,
            score: cosine_similarity(query, row),
        };
        if heap.len() < k {
            heap.push(Reverse(candidate));
        } else if heap.peek().is_some_and(|Reverse(weakest)| candidate > *weakest) {
            heap.pop();
            heap.push(Reverse(candidate));
        }
    }

    // Ascending order of Reverse<Scored> is descending order of Scored.
    Ok(heap
        .into_sorted_vec()
        .into_iter()
        .map(|Reverse(s)| (s.position, s.score))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ChunkStore;
    use evidex_core::types::ChunkRecord;

    fn store_with(vectors: Vec<Vec<f32>>) -> ChunkStore {
        let chunks = (0..vectors.len())
            .map(|i| {
                ChunkRecord {
                    chunk_id: i,
                    page_number: 1,
                    text: format!("c{i}"),
                    start_offset: 0,
                    end_offset: 2,
                }
                .attach("doc")
            })
            .collect();
        let mut store = ChunkStore::new();
        store.append(chunks, vectors).unwrap();
        store
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn orders_by_score_then_position() {
        let store = store_with(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![2.0, 0.0],
        ]);
        let ranked = rank(store.all_vectors(), &[1.0, 0.0], 3).unwrap();
        let positions: Vec<usize> = ranked.iter().map(|(p, _)| *p).collect();
        // Positions 1 and 3 tie at 1.0; lower position wins.
        assert_eq!(positions, vec![1, 3, 2]);
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn k_is_clamped_to_size() {
        let store = store_with(vec![vec![1.0], vec![0.5], vec![-1.0]]);
        let ranked = rank(store.all_vectors(), &[1.0], 100).unwrap();
        assert_eq!(ranked.len(), 3);
        assert!((ranked[2].1 + 1.0).abs() < 1e-6, "negative similarity is kept as-is");
    }

    #[test]
    fn empty_matrix_is_an_error() {
        let store = ChunkStore::new();
        assert!(matches!(rank(store.all_vectors(), &[1.0], 5), Err(IndexError::EmptyIndex)));
    }

    #[test]
    fn query_width_must_match() {
        let store = store_with(vec![vec![1.0, 0.0]]);
        assert!(matches!(
            rank(store.all_vectors(), &[1.0, 0.0, 0.0], 1),
            Err(IndexError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }
}
