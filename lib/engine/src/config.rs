use fusionrec_core::{Error, Result};
use fusionrec_features::{DEFAULT_K_BEST, DEFAULT_MAX_FEATURES};
use serde::{Deserialize, Serialize};

/// Default neighbor count: five recommendations plus the query item itself
pub const DEFAULT_NEIGHBOR_COUNT: usize = 6;

/// Configuration for fitting a recommender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Include the standardized nutrient block
    pub use_tabular: bool,
    /// Include the TF-IDF text block
    pub use_text: bool,
    /// Tabular columns kept by the ANOVA selector
    pub k_best: usize,
    /// Vocabulary cap for the text extractor
    pub max_features: usize,
    /// Default neighborhood size remembered by the index
    pub neighbor_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            use_tabular: true,
            use_text: true,
            k_best: DEFAULT_K_BEST,
            max_features: DEFAULT_MAX_FEATURES,
            neighbor_count: DEFAULT_NEIGHBOR_COUNT,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_tabular(mut self, enabled: bool) -> Self {
        self.use_tabular = enabled;
        self
    }

    #[must_use]
    pub fn with_text(mut self, enabled: bool) -> Self {
        self.use_text = enabled;
        self
    }

    #[must_use]
    pub fn with_k_best(mut self, k_best: usize) -> Self {
        self.k_best = k_best;
        self
    }

    #[must_use]
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    #[must_use]
    pub fn with_neighbor_count(mut self, neighbor_count: usize) -> Self {
        self.neighbor_count = neighbor_count;
        self
    }

    /// Reject configurations no fit could satisfy.
    pub fn validate(&self) -> Result<()> {
        if !self.use_tabular && !self.use_text {
            return Err(Error::configuration(
                "at least one of use_tabular or use_text must be enabled",
            ));
        }
        if self.use_tabular && self.k_best == 0 {
            return Err(Error::configuration("k_best must be at least 1 when use_tabular is set"));
        }
        if self.use_text && self.max_features == 0 {
            return Err(Error::configuration(
                "max_features must be at least 1 when use_text is set",
            ));
        }
        if self.neighbor_count == 0 {
            return Err(Error::configuration("neighbor_count must be at least 1"));
        }
        Ok(())
    }

    /// Default number of recommendations for an item query: the neighbor
    /// count minus the query item itself, at least 1.
    pub fn default_k(&self) -> usize {
        self.neighbor_count.saturating_sub(1).max(1)
    }
}
