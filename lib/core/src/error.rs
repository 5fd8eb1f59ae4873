use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// No modality selected, or options that contradict each other.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Training input the extractors cannot learn from.
    #[error("Invalid training data: {0}")]
    InvalidTrainingData(String),

    /// Out-of-range `k`, item index or vector dimension.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Model not trained: call fit() first")]
    ModelNotTrained,

    #[error("Dataset empty: no record passed the field filter ({scanned} lines scanned)")]
    DatasetEmpty { scanned: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    pub fn invalid_training_data(msg: impl Into<String>) -> Self {
        Error::InvalidTrainingData(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
