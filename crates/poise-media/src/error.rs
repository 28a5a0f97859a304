//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use poise_models::AnalysisError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while fetching, probing, decoding or encoding video.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Invalid video metadata: {0}")]
    InvalidMetadata(String),

    #[error("Frame {index} out of range (video has {frame_count} frames)")]
    FrameOutOfRange { index: u64, frame_count: u64 },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    /// Create an invalid metadata error.
    pub fn invalid_metadata(message: impl Into<String>) -> Self {
        Self::InvalidMetadata(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<MediaError> for AnalysisError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::DownloadFailed { message } => AnalysisError::SourceFetchFailed(message),
            MediaError::InvalidMetadata(message) | MediaError::InvalidVideo(message) => {
                AnalysisError::InvalidMediaMetadata(message)
            }
            MediaError::FfprobeFailed { message, .. } => {
                AnalysisError::InvalidMediaMetadata(message)
            }
            other => AnalysisError::Internal(other.to_string()),
        }
    }
}
