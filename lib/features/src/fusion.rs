//! Feature fusion
//!
//! Concatenates the tabular and text blocks in the fixed order
//! `[tabular, text]` and L2-normalizes every fused row, so cosine similarity
//! between items is a plain dot product. Rows with zero norm stay zero.

use fusionrec_core::{kernels, Error, Matrix, Result, SparseVector};
use serde::{Deserialize, Serialize};

/// Column layout of the fused space
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FusionLayout {
    /// Width of the tabular block, `None` when the modality is off
    pub tabular: Option<usize>,
    /// Width of the text block, `None` when the modality is off
    pub text: Option<usize>,
}

impl FusionLayout {
    pub fn dim(&self) -> usize {
        self.tabular.unwrap_or(0) + self.text.unwrap_or(0)
    }

    pub fn has_tabular(&self) -> bool {
        self.tabular.is_some()
    }

    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }

    /// Fuse one item given its already extracted blocks.
    ///
    /// Each block must be supplied exactly when the layout has it.
    pub fn fuse_row(
        &self,
        tabular: Option<&[f32]>,
        text: Option<&SparseVector>,
    ) -> Result<Vec<f32>> {
        let mut row = vec![0.0f32; self.dim()];
        let offset = self.tabular.unwrap_or(0);

        match (self.tabular, tabular) {
            (Some(width), Some(values)) if values.len() == width => {
                row[..width].copy_from_slice(values);
            }
            (None, None) => {}
            (expected, got) => {
                return Err(Error::invalid_argument(format!(
                    "tabular block mismatch: layout expects {:?} columns, got {:?}",
                    expected,
                    got.map(<[f32]>::len)
                )));
            }
        }

        match (self.text, text) {
            (Some(width), Some(sparse)) if sparse.dim == width => {
                sparse.write_dense(&mut row[offset..]);
            }
            (None, None) => {}
            (expected, got) => {
                return Err(Error::invalid_argument(format!(
                    "text block mismatch: layout expects {:?} columns, got {:?}",
                    expected,
                    got.map(|s| s.dim)
                )));
            }
        }

        kernels::normalize_in_place(&mut row);
        Ok(row)
    }
}

/// Fuse whole blocks into one row-normalized matrix.
///
/// Fails with `Configuration` when both blocks are omitted and with
/// `InvalidTrainingData` when they disagree on the number of rows.
pub fn fuse(tabular: Option<&Matrix>, text: Option<&Matrix>) -> Result<(Matrix, FusionLayout)> {
    let layout = FusionLayout {
        tabular: tabular.map(Matrix::n_cols),
        text: text.map(Matrix::n_cols),
    };

    let blocks: Vec<&Matrix> = tabular.into_iter().chain(text).collect();
    if blocks.is_empty() {
        return Err(Error::configuration(
            "at least one of the tabular or text modalities must be enabled",
        ));
    }
    if let (Some(t), Some(x)) = (tabular, text) {
        if t.n_rows() != x.n_rows() {
            return Err(Error::invalid_training_data(format!(
                "tabular block has {} rows, text block has {}",
                t.n_rows(),
                x.n_rows()
            )));
        }
    }

    let mut fused = Matrix::hstack(&blocks)?;
    fused.normalize_rows();
    Ok((fused, layout))
}
