//! Error types for biomarker stress assessment

use thiserror::Error;

/// Errors surfaced by submission and interpretation
#[derive(Debug, Error)]
pub enum StressError {
    #[error("Inference service error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Unable to parse inference response: {0}")]
    Parse(String),

    #[error("Invalid biomarker input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures talking to the remote inference endpoint
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The endpoint handle could not be established
    #[error("connection failed: {0}")]
    Connection(String),

    /// Both the named and positional calls failed
    #[error("{0}")]
    Call(String),

    /// A call succeeded but carried no payload container
    #[error("Invalid response format from inference service")]
    MissingPayload,
}

impl StressError {
    /// True for connection and remote-call failures
    pub fn is_inference(&self) -> bool {
        matches!(self, StressError::Inference(_))
    }
}
