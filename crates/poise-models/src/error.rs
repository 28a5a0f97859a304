//! Analysis error taxonomy.

use thiserror::Error;

/// Result type for a frame analysis run.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors surfaced by a frame analysis run.
///
/// `ScoringUnavailable` is recovered per frame and never aborts a run; the
/// remaining variants abort the request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("Invalid video reference: {0}")]
    InvalidReference(String),

    #[error("Failed to fetch video: {0}")]
    SourceFetchFailed(String),

    #[error("Invalid video metadata: {0}")]
    InvalidMediaMetadata(String),

    #[error("No frames extracted: {0}")]
    NoFramesExtracted(String),

    #[error("Emotion scoring unavailable: {0}")]
    ScoringUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    pub fn invalid_reference(msg: impl Into<String>) -> Self {
        Self::InvalidReference(msg.into())
    }

    pub fn source_fetch_failed(msg: impl Into<String>) -> Self {
        Self::SourceFetchFailed(msg.into())
    }

    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMediaMetadata(msg.into())
    }

    pub fn no_frames(msg: impl Into<String>) -> Self {
        Self::NoFramesExtracted(msg.into())
    }

    pub fn scoring_unavailable(msg: impl Into<String>) -> Self {
        Self::ScoringUnavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable code, used in HTTP error bodies and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InvalidReference(_) => "invalid_reference",
            AnalysisError::SourceFetchFailed(_) => "source_fetch_failed",
            AnalysisError::InvalidMediaMetadata(_) => "invalid_media_metadata",
            AnalysisError::NoFramesExtracted(_) => "no_frames_extracted",
            AnalysisError::ScoringUnavailable(_) => "scoring_unavailable",
            AnalysisError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AnalysisError::source_fetch_failed("404").code(),
            "source_fetch_failed"
        );
        assert_eq!(
            AnalysisError::invalid_metadata("fps=0").code(),
            "invalid_media_metadata"
        );
        assert_eq!(AnalysisError::no_frames("short").code(), "no_frames_extracted");
    }
}
