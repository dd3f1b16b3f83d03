//! Flat (brute-force) similarity index under squared Euclidean distance.
//!
//! Vectors are stored contiguously in insertion order; position `i` is the
//! entry id. Search is exact and O(n·dim), which suits FAQ-sized corpora.

use crate::errors::IndexError;
use crate::record::SearchHit;

#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityIndex {
    dim: usize,
    data: Vec<f32>,
}

impl SimilarityIndex {
    /// Creates an empty index for `dim`-wide vectors.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    /// Rebuilds an index from its flat buffer.
    ///
    /// # Errors
    /// [`IndexError::IndexCorrupt`] if the buffer is not a whole number of rows.
    pub fn from_flat(dim: usize, data: Vec<f32>) -> Result<Self, IndexError> {
        if dim == 0 || data.len() % dim != 0 {
            return Err(IndexError::IndexCorrupt(format!(
                "vector buffer of {} floats does not split into rows of {dim}",
                data.len()
            )));
        }
        Ok(Self { dim, data })
    }

    /// Appends one vector; its position becomes `len() - 1`.
    ///
    /// # Errors
    /// [`IndexError::VectorSizeMismatch`] if the width differs from `dim`.
    pub fn add(&mut self, vector: &[f32]) -> Result<usize, IndexError> {
        if vector.len() != self.dim {
            return Err(IndexError::VectorSizeMismatch {
                got: vector.len(),
                want: self.dim,
            });
        }
        self.data.extend_from_slice(vector);
        Ok(self.len() - 1)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn vector(&self, i: usize) -> Option<&[f32]> {
        self.data.chunks_exact(self.dim.max(1)).nth(i)
    }

    pub(crate) fn as_flat(&self) -> &[f32] {
        &self.data
    }

    /// Returns up to `k` nearest entries, closest first.
    ///
    /// Equal distances are ordered by lower entry position. `k == 0` yields
    /// nothing; `k > len()` yields every entry.
    ///
    /// # Errors
    /// [`IndexError::DimensionMismatch`] if `query` has the wrong width.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(index, row)| SearchHit {
                index,
                distance: squared_l2(query, row),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.index.cmp(&b.index))
        });
        hits.truncate(k);
        Ok(hits)
    }
}

/// Squared Euclidean distance between equally sized vectors.
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(rows: &[[f32; 2]]) -> SimilarityIndex {
        let mut idx = SimilarityIndex::new(2);
        for r in rows {
            idx.add(r).unwrap();
        }
        idx
    }

    #[test]
    fn exact_vector_is_top_hit_at_zero() {
        let idx = index(&[[0.0, 0.0], [3.0, 4.0], [1.0, 1.0]]);
        let hits = idx.search(&[3.0, 4.0], 2).unwrap();
        assert_eq!(hits[0], SearchHit { index: 1, distance: 0.0 });
        assert_eq!(hits[1].index, 2);
        assert_eq!(hits[1].distance, 13.0);
    }

    #[test]
    fn ties_prefer_lower_position() {
        let idx = index(&[[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0]]);
        let hits = idx.search(&[0.0, 0.0], 3).unwrap();
        let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn k_bounds() {
        let idx = index(&[[0.0, 0.0], [1.0, 1.0]]);
        assert!(idx.search(&[0.0, 0.0], 0).unwrap().is_empty());
        assert_eq!(idx.search(&[0.0, 0.0], 10).unwrap().len(), 2);
    }

    #[test]
    fn repeated_search_is_stable() {
        let idx = index(&[[0.5, 0.5], [0.2, 0.9], [0.9, 0.1]]);
        let a = idx.search(&[0.4, 0.6], 3).unwrap();
        let b = idx.search(&[0.4, 0.6], 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wrong_widths_are_rejected() {
        let mut idx = index(&[[0.0, 0.0]]);
        assert!(matches!(
            idx.search(&[0.0], 1),
            Err(IndexError::DimensionMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            idx.add(&[1.0, 2.0, 3.0]),
            Err(IndexError::VectorSizeMismatch { got: 3, want: 2 })
        ));
    }

    #[test]
    fn from_flat_checks_row_alignment() {
        assert!(SimilarityIndex::from_flat(2, vec![1.0, 2.0, 3.0]).is_err());
        let idx = SimilarityIndex::from_flat(2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.vector(1), Some(&[3.0, 4.0][..]));
    }
}
