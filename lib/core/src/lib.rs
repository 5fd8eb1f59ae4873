//! # FusionRec Core
//!
//! Core library for the FusionRec recommender.
//!
//! This crate provides the fundamental data structures and algorithms:
//!
//! - [`SparseVector`] - Sparse feature rows produced by the text extractor
//! - [`Matrix`] - Dense row-major feature matrix, one row per item
//! - [`NeighborIndex`] - Exact cosine nearest-neighbor search over normalized rows
//! - [`evaluation`] - precision@k, recall@k (hit rate), MAP@k, MRR@k, diversity@k
//!
//! ## Example
//!
//! ```rust
//! use fusionrec_core::{Matrix, NeighborIndex};
//!
//! let mut matrix = Matrix::from_rows(&[
//!     vec![1.0, 0.0],
//!     vec![0.9, 0.1],
//!     vec![0.0, 1.0],
//! ]).unwrap();
//! matrix.normalize_rows();
//!
//! let index = NeighborIndex::new(matrix, 2).unwrap();
//! let neighbors = index.query_item(0, 2).unwrap();
//! assert_eq!(neighbors[0].index, 1);
//! ```

pub mod error;
pub mod evaluation;
pub mod index;
pub mod matrix;
pub mod sparse;

/// Dot-product and norm kernels used for every cosine distance
pub mod kernels;

pub use error::{Error, Result};
pub use evaluation::{
    diversity_at_k, map_at_k, mrr_at_k, precision_at_k, recall_at_k, EvaluationReport,
};
pub use index::{Neighbor, NeighborIndex, NeighborResult, Query};
pub use matrix::Matrix;
pub use sparse::SparseVector;
