pub mod dataset;
pub mod model_store;

pub use dataset::{
    load_dataset, load_dataset_path, load_jsonl, Dataset, ItemMeta, LoadStats, DEFAULT_SAMPLE_CAP,
    NUTRIENT_FIELDS,
};
pub use model_store::{BlobDescription, ModelStore};
