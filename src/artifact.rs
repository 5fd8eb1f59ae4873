//! What the CLI persists per trained model: the model snapshot plus the
//! display metadata of the items it indexed.

use fusionrec_core::{Error, Result};
use fusionrec_engine::TrainedModel;
use fusionrec_storage::{Dataset, ItemMeta};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Opaque [`TrainedModel`] blob
    model: Vec<u8>,
    pub items: Vec<ItemMeta>,
    pub categories: Vec<String>,
}

impl ModelArtifact {
    pub fn new(model: &TrainedModel, dataset: &Dataset) -> Result<Self> {
        if model.len() != dataset.len() {
            return Err(Error::invalid_argument(format!(
                "model indexes {} items but the dataset has {}",
                model.len(),
                dataset.len()
            )));
        }
        Ok(Self {
            model: model.to_bytes()?,
            items: dataset.items.clone(),
            categories: dataset.categories.clone(),
        })
    }

    pub fn model(&self) -> Result<TrainedModel> {
        TrainedModel::from_bytes(&self.model)
    }

    pub fn item(&self, index: usize) -> Option<&ItemMeta> {
        self.items.get(index)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }
}
