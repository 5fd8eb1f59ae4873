//! # FusionRec
//!
//! A multi-modal item recommender. Numeric attributes and free-text
//! descriptions are turned into feature blocks, fused into one
//! row-normalized cosine space, and searched exactly for nearest neighbors.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! fusionrec train --data products.jsonl.gz --store ./models --name snacks
//! fusionrec recommend --store ./models --name snacks --item 0
//! fusionrec metrics --store ./models --name snacks --k 5
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use fusionrec::prelude::*;
//!
//! let nutrients = Matrix::from_rows(&[
//!     vec![120.0, 1.0, 3.0, 20.0],
//!     vec![130.0, 2.0, 3.5, 22.0],
//!     vec![500.0, 30.0, 6.0, 55.0],
//!     vec![520.0, 32.0, 7.0, 50.0],
//! ]).unwrap();
//! let texts: Vec<String> = ["oat drink", "oat milk", "milk chocolate", "dark chocolate"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! let labels = [0, 0, 1, 1];
//!
//! let engine = Recommender::new(EngineConfig::default());
//! let trained = engine.fit(Some(&nutrients), Some(&texts), &labels).unwrap();
//!
//! let recs = trained.recommend(0, 1).unwrap();
//! assert_eq!(recs, vec![1]);
//! ```
//!
//! ## Crate Structure
//!
//! - `fusionrec-core` - sparse rows, dense matrix, cosine neighbor index, ranking metrics
//! - `fusionrec-features` - tabular and TF-IDF extractors, feature fusion
//! - `fusionrec-engine` - configuration, recommender, trained model snapshot
//! - `fusionrec-storage` - gzip JSONL dataset loader, model blob store

pub mod artifact;

pub use artifact::ModelArtifact;

// Re-export core types
pub use fusionrec_core::{
    diversity_at_k, map_at_k, mrr_at_k, precision_at_k, recall_at_k, Error, EvaluationReport,
    Matrix, Neighbor, NeighborIndex, NeighborResult, Query, Result, SparseVector,
};

// Re-export features
pub use fusionrec_features::{fuse, FusionLayout, TabularExtractor, TfidfExtractor};

// Re-export engine
pub use fusionrec_engine::{evaluate, fit, recommend, EngineConfig, Recommender, TrainedModel};

// Re-export storage
pub use fusionrec_storage::{
    load_dataset, load_dataset_path, BlobDescription, Dataset, ItemMeta, ModelStore,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        load_dataset, load_dataset_path, Dataset, EngineConfig, Error, EvaluationReport, ItemMeta,
        Matrix, ModelArtifact, ModelStore, Neighbor, Recommender, Result, TrainedModel,
    };
}
