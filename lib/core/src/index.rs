//! Exact cosine nearest-neighbor index over a row-normalized matrix.
//!
//! Rows are expected to be unit length (or all-zero), so cosine distance
//! is `1 - dot`. Results are ordered by ascending distance, ties by
//! ascending item index, which makes every query fully deterministic.

use crate::{kernels, Error, Matrix, Result};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// One retrieved item and its cosine distance to the query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

/// Ranked neighbors, nearest first
pub type NeighborResult = Vec<Neighbor>;

/// What to search around
#[derive(Debug, Clone, Copy)]
pub enum Query<'a> {
    /// A stored item; the item itself is never part of its own result
    Item(usize),
    /// An arbitrary vector in the fused space; normalized before search
    Vector(&'a [f32]),
}

/// Brute-force cosine index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NeighborIndex {
    matrix: Matrix,
    neighbor_count: usize,
}

impl NeighborIndex {
    /// Wrap an already row-normalized matrix.
    ///
    /// `neighbor_count` is the default result size callers may fall back to.
    pub fn new(matrix: Matrix, neighbor_count: usize) -> Result<Self> {
        if neighbor_count == 0 {
            return Err(Error::configuration("neighbor_count must be at least 1"));
        }
        Ok(Self {
            matrix,
            neighbor_count,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.matrix.n_rows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.matrix.n_cols()
    }

    #[inline]
    pub fn neighbor_count(&self) -> usize {
        self.neighbor_count
    }

    #[inline]
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn query(&self, query: Query<'_>, k: usize) -> Result<NeighborResult> {
        match query {
            Query::Item(index) => self.query_item(index, k),
            Query::Vector(vector) => self.query_vector(vector, k),
        }
    }

    /// `k` nearest items to stored item `index`, excluding the item itself.
    pub fn query_item(&self, index: usize, k: usize) -> Result<NeighborResult> {
        self.check_item(index)?;
        self.check_k(k, self.len().saturating_sub(1), "item query")?;
        Ok(self.rank(self.matrix.row(index), Some(index), k))
    }

    /// `k` nearest items to an arbitrary vector.
    pub fn query_vector(&self, vector: &[f32], k: usize) -> Result<NeighborResult> {
        if vector.len() != self.dim() {
            return Err(Error::invalid_argument(format!(
                "query vector has dimension {}, index has {}",
                vector.len(),
                self.dim()
            )));
        }
        self.check_k(k, self.len(), "vector query")?;

        let mut normalized = vector.to_vec();
        kernels::normalize_in_place(&mut normalized);
        Ok(self.rank(&normalized, None, k))
    }

    /// Neighbor indices for every stored item (self excluded), one row per item.
    pub fn kneighbors_all(&self, k: usize) -> Result<Vec<Vec<usize>>> {
        self.check_k(k, self.len().saturating_sub(1), "neighbor matrix")?;
        tracing::debug!(items = self.len(), k, "computing full neighbor matrix");

        Ok((0..self.len())
            .map(|i| {
                self.rank(self.matrix.row(i), Some(i), k)
                    .into_iter()
                    .map(|n| n.index)
                    .collect()
            })
            .collect())
    }

    fn check_item(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(Error::invalid_argument(format!(
                "item index {index} out of range for {} items",
                self.len()
            )));
        }
        Ok(())
    }

    fn check_k(&self, k: usize, max: usize, what: &str) -> Result<()> {
        if k == 0 || k > max {
            return Err(Error::invalid_argument(format!(
                "k = {k} out of range for {what}: must be between 1 and {max}"
            )));
        }
        Ok(())
    }

    fn rank(&self, query: &[f32], exclude: Option<usize>, k: usize) -> NeighborResult {
        let mut scored: Vec<(OrderedFloat<f32>, usize)> = self
            .matrix
            .rows()
            .enumerate()
            .filter(|(j, _)| Some(*j) != exclude)
            .map(|(j, row)| (OrderedFloat(1.0 - kernels::dot_product(query, row)), j))
            .collect();

        // (distance, index) keys are unique, so unstable selection is deterministic
        if k < scored.len() {
            scored.select_nth_unstable(k - 1);
            scored.truncate(k);
        }
        scored.sort_unstable();

        scored
            .into_iter()
            .map(|(distance, index)| Neighbor {
                index,
                distance: distance.into_inner(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn unit_rows(rows: &[Vec<f32>]) -> Matrix {
        let mut m = Matrix::from_rows(rows).unwrap();
        m.normalize_rows();
        m
    }

    fn brute_force(m: &Matrix, i: usize) -> Vec<usize> {
        let mut all: Vec<(f32, usize)> = (0..m.n_rows())
            .filter(|&j| j != i)
            .map(|j| (1.0 - kernels::dot_product(m.row(i), m.row(j)), j))
            .collect();
        all.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap().then(a.1.cmp(&b.1)));
        all.into_iter().map(|(_, j)| j).collect()
    }

    #[test]
    fn test_query_item_excludes_self() {
        let index = NeighborIndex::new(
            unit_rows(&[
                vec![1.0, 0.0],
                vec![0.9, 0.1],
                vec![0.0, 1.0],
                vec![0.5, 0.5],
            ]),
            3,
        )
        .unwrap();

        let result = index.query_item(0, 3).unwrap();
        let ids: Vec<usize> = result.iter().map(|n| n.index).collect();
        assert_eq!(ids, vec![1, 3, 2]);
        assert!(result.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_ties_break_by_ascending_index() {
        let index = NeighborIndex::new(unit_rows(&vec![vec![1.0, 1.0]; 5]), 1).unwrap();
        let ids: Vec<usize> = index
            .query_item(3, 4)
            .unwrap()
            .iter()
            .map(|n| n.index)
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 4]);
    }

    #[test]
    fn test_k_bounds() {
        let index = NeighborIndex::new(unit_rows(&vec![vec![1.0, 0.0]; 4]), 1).unwrap();
        assert!(matches!(index.query_item(0, 0), Err(Error::InvalidArgument(_))));
        assert!(matches!(index.query_item(0, 4), Err(Error::InvalidArgument(_))));
        assert!(matches!(index.query_item(4, 1), Err(Error::InvalidArgument(_))));
        assert!(index.query_item(0, 3).is_ok());
        assert!(index.query_vector(&[1.0, 0.0], 4).is_ok());
        assert!(matches!(
            index.query_vector(&[1.0, 0.0], 5),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            index.query_vector(&[1.0], 1),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_query_vector_is_normalized() {
        let index = NeighborIndex::new(
            unit_rows(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]),
            1,
        )
        .unwrap();
        let result = index.query_vector(&[10.0, 0.0], 1).unwrap();
        assert_eq!(result[0].index, 0);
        assert!(result[0].distance.abs() < 1e-6);
    }

    #[test]
    fn test_matches_brute_force_on_random_data() {
        let mut rng = StdRng::seed_from_u64(7);
        let rows: Vec<Vec<f32>> = (0..60)
            .map(|_| (0..12).map(|_| rng.random_range(-1.0f32..1.0)).collect())
            .collect();
        let matrix = unit_rows(&rows);
        let index = NeighborIndex::new(matrix.clone(), 5).unwrap();

        for i in 0..matrix.n_rows() {
            let expected: Vec<usize> = brute_force(&matrix, i).into_iter().take(7).collect();
            let got: Vec<usize> = index
                .query_item(i, 7)
                .unwrap()
                .iter()
                .map(|n| n.index)
                .collect();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn test_kneighbors_all_shape() {
        let index = NeighborIndex::new(unit_rows(&vec![vec![1.0, 2.0]; 6]), 1).unwrap();
        let all = index.kneighbors_all(5).unwrap();
        assert_eq!(all.len(), 6);
        for (i, row) in all.iter().enumerate() {
            assert_eq!(row.len(), 5);
            assert!(!row.contains(&i));
        }
    }

    #[test]
    fn test_zero_neighbor_count_rejected() {
        assert!(matches!(
            NeighborIndex::new(Matrix::zeros(2, 2), 0),
            Err(Error::Configuration(_))
        ));
    }
}
