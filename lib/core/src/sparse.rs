use crate::kernels;
use serde::{Deserialize, Serialize};

/// Sparse vector: parallel arrays of strictly ascending column indices and
/// their (non-zero) values, plus the logical width.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SparseVector {
    pub dim: usize,
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(column, value)` pairs sorted by column; zero values are dropped.
    pub fn from_sorted_pairs(dim: usize, pairs: impl IntoIterator<Item = (u32, f32)>) -> Self {
        let mut v = Self::zeros(dim);
        for (idx, value) in pairs {
            debug_assert!((idx as usize) < dim);
            debug_assert!(v.indices.last().map_or(true, |&last| last < idx));
            if value != 0.0 {
                v.indices.push(idx);
                v.values.push(value);
            }
        }
        v
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        kernels::norm(&self.values)
    }

    pub fn get(&self, idx: u32) -> f32 {
        match self.indices.binary_search(&idx) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Scatter the non-zeros into `out`, which must be `dim` wide.
    pub fn write_dense(&self, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.dim);
        for (&idx, &value) in self.indices.iter().zip(&self.values) {
            out[idx as usize] = value;
        }
    }

    pub fn to_dense(&self) -> Vec<f32> {
        let mut data = vec![0.0; self.dim];
        self.write_dense(&mut data);
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_drops_zeros_and_densifies() {
        let sparse = SparseVector::from_sorted_pairs(5, vec![(0, 1.5), (2, 0.0), (4, -2.0)]);
        assert_eq!(sparse.nnz(), 2);
        assert_eq!(sparse.get(4), -2.0);
        assert_eq!(sparse.get(2), 0.0);
        assert_eq!(sparse.to_dense(), vec![1.5, 0.0, 0.0, 0.0, -2.0]);
    }

    #[test]
    fn test_norm_ignores_implicit_zeros() {
        let sparse = SparseVector::from_sorted_pairs(10, vec![(1, 3.0), (7, 4.0)]);
        assert!((sparse.norm() - 5.0).abs() < 1e-6);
        assert_eq!(SparseVector::zeros(4).norm(), 0.0);
        assert_eq!(SparseVector::zeros(4).to_dense(), vec![0.0; 4]);
    }
}
