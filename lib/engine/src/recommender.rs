//! Recommendation engine
//!
//! A [`Recommender`] is either untrained or holds one shared, immutable
//! [`TrainedModel`]. Fitting never mutates the receiver: it returns a new
//! trained recommender and leaves the old one (and any reader of its model)
//! untouched.

use crate::config::EngineConfig;
use crate::model::TrainedModel;
use fusionrec_core::{evaluation, Error, EvaluationReport, Matrix, NeighborResult, Result};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Recommender {
    config: EngineConfig,
    model: Option<Arc<TrainedModel>>,
}

impl Recommender {
    /// Untrained recommender that will fit with `config`.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    /// Trained recommender around an existing model.
    pub fn from_model(model: TrainedModel) -> Self {
        Self {
            config: *model.config(),
            model: Some(Arc::new(model)),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        TrainedModel::from_bytes(bytes).map(Self::from_model)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// The current model, shared.
    pub fn model(&self) -> Result<&Arc<TrainedModel>> {
        self.model.as_ref().ok_or(Error::ModelNotTrained)
    }

    /// Fit on explicitly supplied modalities.
    pub fn fit(
        &self,
        tabular: Option<&Matrix>,
        text: Option<&[String]>,
        labels: &[u32],
    ) -> Result<Self> {
        let model = TrainedModel::fit(&self.config, tabular, text, labels)?;
        Ok(Self::from_model(model))
    }

    /// Fit on a loaded dataset, using the modalities the config enables.
    pub fn fit_dataset(&self, tabular: &Matrix, text: &[String], labels: &[u32]) -> Result<Self> {
        self.config.validate()?;
        let tabular = self.config.use_tabular.then_some(tabular);
        let text = self.config.use_text.then_some(text);
        self.fit(tabular, text, labels)
    }

    pub fn recommend(&self, item: usize, k: usize) -> Result<Vec<usize>> {
        self.model()?.recommend(item, k)
    }

    pub fn recommend_with_distances(&self, item: usize, k: usize) -> Result<NeighborResult> {
        self.model()?.recommend_with_distances(item, k)
    }

    /// Recommend with the default size: the fitted neighbor count minus the
    /// query item.
    pub fn recommend_default(&self, item: usize) -> Result<Vec<usize>> {
        let model = self.model()?;
        model.recommend(item, model.config().default_k())
    }

    pub fn query(
        &self,
        tabular_row: Option<&[f32]>,
        text: Option<&str>,
        k: usize,
    ) -> Result<NeighborResult> {
        self.model()?.query(tabular_row, text, k)
    }

    pub fn similar_to_text(&self, text: &str, k: usize) -> Result<NeighborResult> {
        self.model()?.similar_to_text(text, k)
    }

    pub fn neighbor_matrix(&self, k: usize) -> Result<Vec<Vec<usize>>> {
        self.model()?.neighbor_matrix(k)
    }

    pub fn evaluate(&self, k: usize) -> Result<EvaluationReport> {
        self.model()?.evaluate(k)
    }

    pub fn precision_at_k(
        &self,
        labels: &[u32],
        neighbors: &[Vec<usize>],
        k: usize,
    ) -> Result<f64> {
        evaluation::precision_at_k(labels, neighbors, k)
    }

    pub fn recall_at_k(&self, labels: &[u32], neighbors: &[Vec<usize>], k: usize) -> Result<f64> {
        evaluation::recall_at_k(labels, neighbors, k)
    }

    pub fn map_at_k(&self, labels: &[u32], neighbors: &[Vec<usize>], k: usize) -> Result<f64> {
        evaluation::map_at_k(labels, neighbors, k)
    }

    pub fn mrr_at_k(&self, labels: &[u32], neighbors: &[Vec<usize>], k: usize) -> Result<f64> {
        evaluation::mrr_at_k(labels, neighbors, k)
    }

    pub fn diversity_at_k(&self, neighbors: &[Vec<usize>], k: usize) -> Result<f64> {
        evaluation::diversity_at_k(neighbors, k)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.model()?.to_bytes()
    }
}

/// Fit a model with default extractor settings and the given neighbor count.
pub fn fit(
    tabular: Option<&Matrix>,
    text: Option<&[String]>,
    labels: &[u32],
    neighbor_count: usize,
) -> Result<TrainedModel> {
    let config = EngineConfig::default().with_neighbor_count(neighbor_count);
    TrainedModel::fit(&config, tabular, text, labels)
}

pub fn recommend(model: &TrainedModel, item: usize, k: usize) -> Result<Vec<usize>> {
    model.recommend(item, k)
}

pub fn evaluate(model: &TrainedModel, labels: &[u32], k: usize) -> Result<EvaluationReport> {
    model.evaluate_with(labels, k)
}
