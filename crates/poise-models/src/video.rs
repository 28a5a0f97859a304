//! Video source references.

use std::fmt;

use url::Url;

use crate::error::{AnalysisError, AnalysisResult};

/// Where a video to analyze lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoReference {
    /// Publicly fetchable HTTP(S) URL
    Url(Url),
    /// Object key in the configured storage bucket
    StorageKey(String),
}

impl VideoReference {
    /// Parse a caller-supplied reference.
    ///
    /// Values with a `scheme://` prefix must be `http` or `https` URLs. Anything
    /// else is treated as a storage key; leading slashes are stripped.
    pub fn parse(raw: &str) -> AnalysisResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AnalysisError::invalid_reference("Missing video_url"));
        }

        if raw.contains("://") {
            let url = Url::parse(raw)
                .map_err(|e| AnalysisError::invalid_reference(format!("{}: {}", raw, e)))?;
            return match url.scheme() {
                "http" | "https" if url.host_str().is_some() => Ok(Self::Url(url)),
                "http" | "https" => Err(AnalysisError::invalid_reference("URL has no host")),
                other => Err(AnalysisError::invalid_reference(format!(
                    "unsupported URL scheme: {}",
                    other
                ))),
            };
        }

        let key = raw.trim_start_matches('/');
        if key.is_empty() {
            return Err(AnalysisError::invalid_reference("storage key is empty"));
        }
        if key.chars().any(char::is_control) {
            return Err(AnalysisError::invalid_reference(
                "storage key contains control characters",
            ));
        }

        Ok(Self::StorageKey(key.to_string()))
    }

    /// Short kind label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            VideoReference::Url(_) => "url",
            VideoReference::StorageKey(_) => "storage_key",
        }
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoReference::Url(url) => write!(f, "{}", url),
            VideoReference::StorageKey(key) => write!(f, "storage:{}", key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https_url() {
        let reference = VideoReference::parse(
            "https://example.supabase.co/storage/v1/object/public/videosstore/abc.mp4",
        )
        .unwrap();
        assert_eq!(reference.kind(), "url");
    }

    #[test]
    fn test_parse_storage_key() {
        assert_eq!(
            VideoReference::parse("/videos/user-1/abc.webm").unwrap(),
            VideoReference::StorageKey("videos/user-1/abc.webm".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_empty_and_foreign_schemes() {
        assert!(matches!(
            VideoReference::parse("   "),
            Err(AnalysisError::InvalidReference(_))
        ));
        assert!(matches!(
            VideoReference::parse("file:///etc/passwd"),
            Err(AnalysisError::InvalidReference(_))
        ));
        assert!(matches!(
            VideoReference::parse("ftp://host/video.mp4"),
            Err(AnalysisError::InvalidReference(_))
        ));
        assert!(VideoReference::parse("/").is_err());
    }
}
