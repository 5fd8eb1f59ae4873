//! # FusionRec Features
//!
//! Feature extractors that turn mixed catalog data into one comparable
//! numeric space.
//!
//! ## Components
//!
//! - **Tabular**: per-column standardization, then ANOVA F-test selection of
//!   the most label-discriminative columns
//! - **Text**: TF-IDF over a frequency-capped vocabulary
//! - **Fusion**: `[tabular | text]` concatenation with per-row L2 normalization
//!
//! ## Example
//!
//! ```rust
//! use fusionrec_core::Matrix;
//! use fusionrec_features::{fuse, TabularExtractor, TfidfExtractor};
//!
//! let nutrients = Matrix::from_rows(&[
//!     vec![120.0, 1.0, 3.0, 20.0],
//!     vec![130.0, 2.0, 3.5, 22.0],
//!     vec![500.0, 30.0, 6.0, 55.0],
//!     vec![520.0, 32.0, 7.0, 50.0],
//! ]).unwrap();
//! let labels = [0, 0, 1, 1];
//! let texts = ["oat drink", "oat milk drink", "chocolate bar", "dark chocolate"];
//!
//! let (tabular, tab_block) = TabularExtractor::fit_transform(&nutrients, &labels, 4).unwrap();
//! let text = TfidfExtractor::fit(&texts, 100).unwrap();
//! let text_block = text.transform_dense(&texts);
//!
//! let (fused, layout) = fuse(Some(&tab_block), Some(&text_block)).unwrap();
//! assert_eq!(fused.n_cols(), layout.dim());
//! assert_eq!(tabular.n_features_out(), 4);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐
//! │  Nutrients  │────>│  Tabular    │──┐
//! │  (N x 4)    │     │ scale+kbest │  │   ┌─────────────┐
//! └─────────────┘     └─────────────┘  ├──>│   Fusion    │──> fused rows
//! ┌─────────────┐     ┌─────────────┐  │   │ concat + L2 │    (unit length)
//! │    Text     │────>│   TF-IDF    │──┘   └─────────────┘
//! └─────────────┘     └─────────────┘
//! ```

pub mod fusion;
pub mod tabular;
pub mod text;

pub use fusion::{fuse, FusionLayout};
pub use tabular::{f_classif, SelectKBest, StandardScaler, TabularExtractor, DEFAULT_K_BEST};
pub use text::{tokenize, TfidfExtractor, DEFAULT_MAX_FEATURES};
