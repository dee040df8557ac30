//! Error types for the affinity models.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AffinityError>;

#[derive(Error, Debug)]
pub enum AffinityError {
    #[error("Unknown architecture: {0}")]
    UnknownArchitecture(String),

    #[error("Unknown distance metric: {0}")]
    UnknownMetric(String),

    #[error("Unknown activation: {0}")]
    UnknownActivation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<candle_core::Error> for AffinityError {
    fn from(e: candle_core::Error) -> Self {
        AffinityError::Inference(e.to_string())
    }
}

impl From<toml::de::Error> for AffinityError {
    fn from(e: toml::de::Error) -> Self {
        AffinityError::Toml(e.to_string())
    }
}

impl From<toml::ser::Error> for AffinityError {
    fn from(e: toml::ser::Error) -> Self {
        AffinityError::Toml(e.to_string())
    }
}
