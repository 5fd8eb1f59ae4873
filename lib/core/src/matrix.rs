use crate::{kernels, Error, Result};
use serde::{Deserialize, Serialize};

/// Dense row-major matrix of f32 features, one row per item
///
/// Deserialization goes through [`Matrix::from_vec`], so a decoded matrix
/// always holds exactly `n_rows * n_cols` values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(try_from = "MatrixParts")]
pub struct Matrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f32>,
}

// wire layout of `Matrix`, unchecked
#[derive(Deserialize)]
struct MatrixParts {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f32>,
}

impl TryFrom<MatrixParts> for Matrix {
    type Error = Error;

    fn try_from(parts: MatrixParts) -> Result<Self> {
        Matrix::from_vec(parts.n_rows, parts.n_cols, parts.data)
    }
}

impl Matrix {
    #[must_use]
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            data: vec![0.0; n_rows * n_cols],
        }
    }

    pub fn from_vec(n_rows: usize, n_cols: usize, data: Vec<f32>) -> Result<Self> {
        if n_rows.checked_mul(n_cols) != Some(data.len()) {
            return Err(Error::invalid_argument(format!(
                "matrix data has {} values, expected {n_rows} x {n_cols}",
                data.len()
            )));
        }
        Ok(Self { n_rows, n_cols, data })
    }

    /// Build from equally sized rows.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self> {
        let n_cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * n_cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != n_cols {
                return Err(Error::invalid_argument(format!(
                    "row {i} has {} columns, expected {n_cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            n_rows: rows.len(),
            n_cols,
            data,
        })
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.n_cols + col]
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        let start = i * self.n_cols;
        &self.data[start..start + self.n_cols]
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [f32] {
        let start = i * self.n_cols;
        &mut self.data[start..start + self.n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        (0..self.n_rows).map(move |i| self.row(i))
    }

    pub fn column(&self, j: usize) -> Vec<f32> {
        self.rows().map(|r| r[j]).collect()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// New matrix holding only `columns`, in the given order.
    pub fn select_columns(&self, columns: &[usize]) -> Result<Self> {
        if let Some(&bad) = columns.iter().find(|&&c| c >= self.n_cols) {
            return Err(Error::invalid_argument(format!(
                "column {bad} out of range for {} columns",
                self.n_cols
            )));
        }
        let mut data = Vec::with_capacity(self.n_rows * columns.len());
        for row in self.rows() {
            data.extend(columns.iter().map(|&c| row[c]));
        }
        Ok(Self {
            n_rows: self.n_rows,
            n_cols: columns.len(),
            data,
        })
    }

    /// Horizontal concatenation, left to right.
    pub fn hstack(blocks: &[&Matrix]) -> Result<Self> {
        let n_rows = blocks.first().map_or(0, |b| b.n_rows);
        if let Some(bad) = blocks.iter().find(|b| b.n_rows != n_rows) {
            return Err(Error::invalid_argument(format!(
                "cannot stack blocks with {} and {} rows",
                n_rows, bad.n_rows
            )));
        }
        let n_cols = blocks.iter().map(|b| b.n_cols).sum();
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for i in 0..n_rows {
            for block in blocks {
                data.extend_from_slice(block.row(i));
            }
        }
        Ok(Self { n_rows, n_cols, data })
    }

    /// L2-normalize every row; zero rows stay zero.
    pub fn normalize_rows(&mut self) {
        for i in 0..self.n_rows {
            kernels::normalize_in_place(self.row_mut(i));
        }
    }

    pub fn row_norms(&self) -> Vec<f32> {
        self.rows().map(kernels::norm).collect()
    }
}
