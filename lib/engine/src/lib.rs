//! # FusionRec Engine
//!
//! Orchestrates the feature extractors and the neighbor index: `fit`
//! learns a [`TrainedModel`] from tabular and/or text data, `recommend`
//! answers nearest-item queries against it.
//!
//! ## Example
//!
//! ```rust
//! use fusionrec_engine::{EngineConfig, Recommender};
//!
//! let texts: Vec<String> = ["oat drink", "oat milk", "cocoa bar", "cocoa spread"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! let labels = [0, 0, 1, 1];
//!
//! let engine = Recommender::new(EngineConfig::default().with_tabular(false));
//! let trained = engine.fit(None, Some(&texts), &labels).unwrap();
//!
//! assert_eq!(trained.recommend(0, 1).unwrap(), vec![1]);
//! ```

pub mod config;
pub mod model;
pub mod recommender;

pub use config::{EngineConfig, DEFAULT_NEIGHBOR_COUNT};
pub use model::{TrainedModel, MODEL_FORMAT_VERSION};
pub use recommender::{evaluate, fit, recommend, Recommender};
