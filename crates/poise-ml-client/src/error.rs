//! ML client error types.

use thiserror::Error;

use poise_models::AnalysisError;

pub type MlResult<T> = Result<T, MlError>;

#[derive(Debug, Error)]
pub enum MlError {
    #[error("Emotion service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MlError {
    pub fn is_retryable(&self) -> bool {
        match self {
            MlError::ServiceUnavailable(_) | MlError::Timeout(_) => true,
            MlError::Network(e) => !e.is_decode(),
            _ => false,
        }
    }
}

impl From<MlError> for AnalysisError {
    fn from(err: MlError) -> Self {
        AnalysisError::ScoringUnavailable(err.to_string())
    }
}
