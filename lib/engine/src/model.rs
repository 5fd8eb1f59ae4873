//! Trained model snapshot
//!
//! A [`TrainedModel`] bundles everything `fit` learned: the fitted
//! extractors, the fused row-normalized matrix (inside the neighbor index)
//! and the ground-truth labels. It is immutable once built; a re-fit
//! produces a new snapshot with a new id.

use crate::config::EngineConfig;
use fusionrec_core::{
    Error, EvaluationReport, Matrix, NeighborIndex, NeighborResult, Query, Result,
};
use fusionrec_features::{fuse, FusionLayout, TabularExtractor, TfidfExtractor};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Version of the serialized blob layout
pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainedModel {
    format_version: u32,
    id: Uuid,
    config: EngineConfig,
    tabular: Option<TabularExtractor>,
    text: Option<TfidfExtractor>,
    layout: FusionLayout,
    index: NeighborIndex,
    labels: Vec<u32>,
}

impl TrainedModel {
    /// Fit extractors, fuse, and index.
    ///
    /// The supplied blocks decide which modalities are active; the stored
    /// config records that choice alongside `k_best`, `max_features` and
    /// `neighbor_count` from `config`.
    pub fn fit(
        config: &EngineConfig,
        tabular: Option<&Matrix>,
        text: Option<&[String]>,
        labels: &[u32],
    ) -> Result<Self> {
        let config = config
            .with_tabular(tabular.is_some())
            .with_text(text.is_some());
        config.validate()?;

        if let Some(x) = tabular {
            check_label_count("tabular block", x.n_rows(), labels.len())?;
        }
        if let Some(docs) = text {
            check_label_count("text block", docs.len(), labels.len())?;
        }
        if labels.is_empty() {
            return Err(Error::invalid_training_data("cannot fit on zero items"));
        }

        let (tabular_extractor, tabular_block) = match tabular {
            Some(x) => {
                let (extractor, block) = TabularExtractor::fit_transform(x, labels, config.k_best)?;
                (Some(extractor), Some(block))
            }
            None => (None, None),
        };
        let (text_extractor, text_block) = match text {
            Some(docs) => {
                let extractor = TfidfExtractor::fit(docs, config.max_features)?;
                let block = extractor.transform_dense(docs);
                (Some(extractor), Some(block))
            }
            None => (None, None),
        };

        let (fused, layout) = fuse(tabular_block.as_ref(), text_block.as_ref())?;
        let index = NeighborIndex::new(fused, config.neighbor_count)?;

        let model = Self {
            format_version: MODEL_FORMAT_VERSION,
            id: Uuid::new_v4(),
            config,
            tabular: tabular_extractor,
            text: text_extractor,
            layout,
            index,
            labels: labels.to_vec(),
        };

        tracing::info!(
            model_id = %model.id,
            items = model.len(),
            dim = model.dim(),
            modalities = %model.modalities().join(","),
            "model fitted"
        );

        Ok(model)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of indexed items
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Width of the fused space
    pub fn dim(&self) -> usize {
        self.layout.dim()
    }

    pub fn neighbor_count(&self) -> usize {
        self.index.neighbor_count()
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    pub fn layout(&self) -> &FusionLayout {
        &self.layout
    }

    pub fn fused_matrix(&self) -> &Matrix {
        self.index.matrix()
    }

    pub fn index(&self) -> &NeighborIndex {
        &self.index
    }

    pub fn tabular_extractor(&self) -> Option<&TabularExtractor> {
        self.tabular.as_ref()
    }

    pub fn text_extractor(&self) -> Option<&TfidfExtractor> {
        self.text.as_ref()
    }

    /// Names of the active modalities, in fusion order.
    pub fn modalities(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(2);
        if self.layout.has_tabular() {
            names.push("tabular");
        }
        if self.layout.has_text() {
            names.push("text");
        }
        names
    }

    /// Ranked indices of the `k` items most similar to `item`.
    pub fn recommend(&self, item: usize, k: usize) -> Result<Vec<usize>> {
        Ok(self
            .recommend_with_distances(item, k)?
            .into_iter()
            .map(|n| n.index)
            .collect())
    }

    pub fn recommend_with_distances(&self, item: usize, k: usize) -> Result<NeighborResult> {
        self.index.query(Query::Item(item), k)
    }

    /// Map a new item's raw attributes into the fused space.
    ///
    /// Each input must be given exactly when its modality is active.
    pub fn embed(&self, tabular_row: Option<&[f32]>, text: Option<&str>) -> Result<Vec<f32>> {
        let tabular_block = match (&self.tabular, tabular_row) {
            (Some(extractor), Some(row)) => Some(extractor.transform_row(row)?),
            (None, None) => None,
            (Some(_), None) => {
                return Err(Error::invalid_argument(
                    "model uses the tabular modality: a nutrient row is required",
                ))
            }
            (None, Some(_)) => {
                return Err(Error::invalid_argument(
                    "model was fitted without the tabular modality",
                ))
            }
        };
        let text_block = match (&self.text, text) {
            (Some(extractor), Some(t)) => Some(extractor.transform_one(t)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(Error::invalid_argument(
                    "model uses the text modality: a text is required",
                ))
            }
            (None, Some(_)) => {
                return Err(Error::invalid_argument("model was fitted without the text modality"))
            }
        };

        self.layout
            .fuse_row(tabular_block.as_deref(), text_block.as_ref())
    }

    /// `k` stored items nearest to a new item given by raw attributes.
    pub fn query(
        &self,
        tabular_row: Option<&[f32]>,
        text: Option<&str>,
        k: usize,
    ) -> Result<NeighborResult> {
        let vector = self.embed(tabular_row, text)?;
        self.index.query(Query::Vector(&vector), k)
    }

    /// `k` stored items nearest to a free-text description.
    ///
    /// When the model also uses the tabular modality the nutrient block of
    /// the query is left at zero, so only the text contributes.
    pub fn similar_to_text(&self, text: &str, k: usize) -> Result<NeighborResult> {
        let Some(extractor) = &self.text else {
            return Err(Error::invalid_argument("model was fitted without the text modality"));
        };
        let sparse = extractor.transform_one(text);
        let zeros = self.layout.tabular.map(|width| vec![0.0f32; width]);
        let vector = self.layout.fuse_row(zeros.as_deref(), Some(&sparse))?;
        self.index.query(Query::Vector(&vector), k)
    }

    /// Full neighbor matrix (self excluded), one row per item.
    pub fn neighbor_matrix(&self, k: usize) -> Result<Vec<Vec<usize>>> {
        self.index.kneighbors_all(k)
    }

    /// Score retrieval quality against the labels supplied at fit time.
    pub fn evaluate(&self, k: usize) -> Result<EvaluationReport> {
        self.evaluate_with(&self.labels, k)
    }

    /// Score retrieval quality against caller-supplied labels.
    pub fn evaluate_with<L: PartialEq>(&self, labels: &[L], k: usize) -> Result<EvaluationReport> {
        let neighbors = self.neighbor_matrix(k)?;
        EvaluationReport::compute(labels, &neighbors, k)
    }

    /// Encode as an opaque blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Decode a blob produced by [`TrainedModel::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let model: Self =
            bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))?;

        if model.format_version != MODEL_FORMAT_VERSION {
            return Err(Error::Serialization(format!(
                "unsupported model format version {} (expected {MODEL_FORMAT_VERSION})",
                model.format_version
            )));
        }
        model
            .check_consistency()
            .map_err(|e| Error::Serialization(format!("model blob is inconsistent: {e}")))?;
        Ok(model)
    }

    /// Cross-check the decoded parts so no later query can index out of
    /// bounds.
    fn check_consistency(&self) -> Result<()> {
        if self.labels.len() != self.index.len() {
            return Err(Error::invalid_argument(format!(
                "{} labels for {} indexed items",
                self.labels.len(),
                self.index.len()
            )));
        }
        if self.layout.dim() != self.index.dim() {
            return Err(Error::invalid_argument(format!(
                "layout is {} wide, index {}",
                self.layout.dim(),
                self.index.dim()
            )));
        }
        if self.index.neighbor_count() == 0 {
            return Err(Error::invalid_argument("neighbor_count is 0"));
        }

        match (&self.tabular, self.layout.tabular) {
            (Some(extractor), Some(width)) => {
                extractor.validate()?;
                if extractor.n_features_out() != width {
                    return Err(Error::invalid_argument(format!(
                        "tabular extractor yields {} columns, layout expects {width}",
                        extractor.n_features_out()
                    )));
                }
            }
            (None, None) => {}
            _ => return Err(Error::invalid_argument("tabular extractor and layout disagree")),
        }
        match (&self.text, self.layout.text) {
            (Some(extractor), Some(width)) => {
                extractor.validate()?;
                if extractor.vocabulary_size() != width {
                    return Err(Error::invalid_argument(format!(
                        "text extractor yields {} columns, layout expects {width}",
                        extractor.vocabulary_size()
                    )));
                }
            }
            (None, None) => {}
            _ => return Err(Error::invalid_argument("text extractor and layout disagree")),
        }
        if self.tabular.is_none() && self.text.is_none() {
            return Err(Error::invalid_argument("no modality"));
        }
        Ok(())
    }
}

fn check_label_count(block: &str, rows: usize, labels: usize) -> Result<()> {
    if rows != labels {
        return Err(Error::invalid_training_data(format!(
            "{block} has {rows} rows but {labels} labels were given"
        )));
    }
    Ok(())
}
