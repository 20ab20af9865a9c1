use thiserror::Error;

pub type Result<T> = std::result::Result<T, PairsError>;

/// Failures surfaced by the pipeline. None of them are retried: the run is a
/// single offline pass over a fully loaded transcript.
#[derive(Error, Debug)]
pub enum PairsError {
    /// The transcript does not match the expected export shape.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A required identifier or setting is missing or out of range.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PairsError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        PairsError::Validation(msg.into())
    }

    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        PairsError::Configuration(msg.into())
    }
}
