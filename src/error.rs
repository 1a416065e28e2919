//! Error types for the screening pipeline

use thiserror::Error;

/// Failures surfaced by a transaction check.
///
/// A lockout is not represented here: it is an expected outcome of the
/// authentication gate and always ends in an alert.
#[derive(Debug, Error)]
pub enum ScreeningError {
    /// The requested model name is not registered.
    #[error("unknown model: {name}")]
    UnknownModel { name: String },

    /// Invalid PIN or attempt-bound configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The classifier failed during inference.
    #[error("prediction failed for model {model}: {reason}")]
    PredictionFailed { model: String, reason: String },

    /// PIN or sample input could not be read.
    #[error("input error: {0}")]
    Input(#[from] std::io::Error),

    /// Evaluation data is missing or unusable.
    #[error("dataset error: {0}")]
    Dataset(String),
}

impl ScreeningError {
    pub fn unknown_model(name: impl Into<String>) -> Self {
        Self::UnknownModel { name: name.into() }
    }

    pub fn prediction_failed(model: impl Into<String>, reason: impl ToString) -> Self {
        Self::PredictionFailed {
            model: model.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, ScreeningError>;
