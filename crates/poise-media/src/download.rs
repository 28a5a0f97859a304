//! Video download over HTTP(S).
//!
//! Bodies are streamed chunk by chunk into a file so large uploads never sit
//! in memory, and the transfer is aborted once it exceeds the size limit.

use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::error::{MediaError, MediaResult};

/// Default maximum accepted video size (500 MiB).
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// Default timeout for the whole transfer.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Streams remote videos to local files.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    http: Client,
    max_bytes: u64,
}

impl HttpDownloader {
    /// Create a downloader with a transfer timeout and size cap.
    pub fn new(timeout: Duration, max_bytes: u64) -> MediaResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MediaError::internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, max_bytes })
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Download `url` into `dest`, returning the number of bytes written.
    pub async fn download_to(&self, url: &Url, dest: &Path) -> MediaResult<u64> {
        let start = Instant::now();
        debug!(url = %url, dest = %dest.display(), "Downloading video");

        let mut response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| MediaError::download_failed(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::download_failed(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(MediaError::download_failed(format!(
                    "video is {} bytes, limit is {}",
                    len, self.max_bytes
                )));
            }
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| MediaError::download_failed(format!("transfer interrupted: {}", e)))?
        {
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(MediaError::download_failed(format!(
                    "video exceeds the {} byte limit",
                    self.max_bytes
                )));
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        if written == 0 {
            return Err(MediaError::download_failed(format!("{} returned an empty body", url)));
        }

        info!(
            url = %url,
            bytes = written,
            duration_ms = start.elapsed().as_millis() as u64,
            "Video downloaded"
        );
        Ok(written)
    }
}
