//! Emotion service HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::error::{MlError, MlResult};
use crate::types::{ClassifyRequest, ClassifyResponse, EmotionOutcome, HealthResponse};

/// Classifies the dominant facial emotion in a single encoded frame.
#[async_trait]
pub trait EmotionScorer: Send + Sync {
    /// Classify one frame. `image_base64` is the raw base64 payload, `format`
    /// the image format it encodes ("jpeg", "png").
    async fn classify(&self, image_base64: &str, format: &str) -> MlResult<EmotionOutcome>;

    /// Whether the scorer is currently able to serve requests.
    async fn health_check(&self) -> MlResult<bool>;
}

/// Configuration for the emotion service client.
#[derive(Debug, Clone)]
pub struct MlClientConfig {
    /// Base URL of the emotion service
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
}

impl Default for MlClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }
}

impl MlClientConfig {
    /// Create config from environment variables.
    ///
    /// Returns `None` when `EMOTION_SERVICE_URL` is unset, which disables scoring.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("EMOTION_SERVICE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())?;

        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(
                std::env::var("EMOTION_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_retries: std::env::var("EMOTION_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        })
    }
}

/// HTTP client for the emotion service.
pub struct EmotionClient {
    http: Client,
    config: MlClientConfig,
}

impl EmotionClient {
    /// Create a new emotion client.
    pub fn new(config: MlClientConfig) -> MlResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn classify_once(&self, url: &str, request: &ClassifyRequest) -> MlResult<ClassifyResponse> {
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MlError::Timeout(self.config.timeout.as_secs())
                } else {
                    MlError::Network(e)
                }
            })?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::ServiceUnavailable(format!("{}: {}", status, body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::RequestFailed(format!(
                "Emotion service returned {}: {}",
                status, body
            )));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> MlResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = MlResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(250 * 2u64.pow(attempt));
                    warn!(
                        "Emotion request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(MlError::RequestFailed("Unknown error".to_string())))
    }
}

#[async_trait]
impl EmotionScorer for EmotionClient {
    async fn classify(&self, image_base64: &str, format: &str) -> MlResult<EmotionOutcome> {
        let url = format!("{}/classify", self.config.base_url);
        let request = ClassifyRequest {
            image: image_base64.to_string(),
            format: format.to_string(),
        };

        debug!("Sending {} frame to {}", format, url);

        let response = self.with_retry(|| self.classify_once(&url, &request)).await?;
        EmotionOutcome::try_from(response).map_err(MlError::InvalidResponse)
    }

    async fn health_check(&self) -> MlResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Emotion service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Emotion service health check error: {}", e);
                Ok(false)
            }
        }
    }
}
