//! Storage error types.

use thiserror::Error;

use poise_models::AnalysisError;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to configure storage client: {0}")]
    ConfigError(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Object is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("AWS SDK error: {0}")]
    AwsSdk(String),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }
}

impl From<StorageError> for AnalysisError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConfigError(msg) => AnalysisError::Internal(msg),
            other => AnalysisError::SourceFetchFailed(other.to_string()),
        }
    }
}
