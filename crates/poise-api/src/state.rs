//! Application state.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use poise_media::{FfmpegRunner, FrameEncoder, HttpDownloader};
use poise_ml_client::{EmotionClient, EmotionScorer, MlClientConfig};
use poise_storage::{R2Client, R2Config};

use crate::config::{AnalysisConfig, ApiConfig};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub analysis: AnalysisConfig,
    pub downloader: HttpDownloader,
    pub encoder: FrameEncoder,
    pub runner: FfmpegRunner,
    /// Object storage for storage-key references; `None` when not configured
    pub storage: Option<Arc<R2Client>>,
    /// Emotion scorer; `None` disables scoring
    pub scorer: Option<Arc<dyn EmotionScorer>>,
}

impl AppState {
    /// Create application state, connecting optional collaborators configured in the environment.
    pub async fn new(config: ApiConfig, analysis: AnalysisConfig) -> anyhow::Result<Self> {
        let storage = match R2Config::from_env_optional().context("Invalid R2 configuration")? {
            Some(r2) => {
                info!("Object storage enabled (bucket {})", r2.bucket_name);
                Some(Arc::new(R2Client::new(r2).await?))
            }
            None => {
                info!("R2_ENDPOINT_URL not set, storage-key references disabled");
                None
            }
        };

        let scorer: Option<Arc<dyn EmotionScorer>> = match MlClientConfig::from_env() {
            Some(ml) => {
                info!("Emotion scoring enabled ({})", ml.base_url);
                Some(Arc::new(EmotionClient::new(ml)?))
            }
            None => {
                info!("EMOTION_SERVICE_URL not set, emotion scoring disabled");
                None
            }
        };

        Self::from_parts(config, analysis, storage, scorer)
    }

    /// Assemble state from already-built collaborators.
    pub fn from_parts(
        config: ApiConfig,
        analysis: AnalysisConfig,
        storage: Option<Arc<R2Client>>,
        scorer: Option<Arc<dyn EmotionScorer>>,
    ) -> anyhow::Result<Self> {
        let downloader = HttpDownloader::new(analysis.download_timeout, analysis.max_download_bytes)
            .context("Failed to build HTTP downloader")?;
        let runner = FfmpegRunner::new().with_timeout(analysis.ffmpeg_timeout_secs);
        let encoder = analysis.encoder();

        Ok(Self {
            config,
            analysis,
            downloader,
            encoder,
            runner,
            storage,
            scorer,
        })
    }
}
