//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

use poise_media::{
    FrameEncoder, FrameFormat, DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_FFMPEG_TIMEOUT_SECS,
    DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DOWNLOAD_BYTES,
};
use poise_models::SampleSpec;
use tracing::warn;

/// Read and parse an environment variable, falling back to `default`.
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Rate limit burst
    pub rate_limit_burst: u32,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:5173".to_string()],
            rate_limit_rps: 10,
            rate_limit_burst: 20,
            request_timeout: Duration::from_secs(120),
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_or("API_PORT", defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_or("RATE_LIMIT_RPS", defaults.rate_limit_rps),
            rate_limit_burst: env_or("RATE_LIMIT_BURST", defaults.rate_limit_burst),
            request_timeout: Duration::from_secs(env_or(
                "REQUEST_TIMEOUT",
                defaults.request_timeout.as_secs(),
            )),
            max_body_size: env_or("MAX_BODY_SIZE", defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

/// Frame sampling and analysis configuration.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Sampling parameters used when a request does not override them
    pub sample_spec: SampleSpec,
    /// Upper bound accepted for a `frames_per_interval` override
    pub max_frames_per_interval: u32,
    /// Upper bound accepted for an `interval_seconds` override
    pub max_interval_seconds: u32,
    /// Parent directory for request scratch dirs (system temp dir when unset)
    pub temp_dir: Option<PathBuf>,
    /// Largest source video accepted, in bytes
    pub max_download_bytes: u64,
    /// Timeout for fetching a source video
    pub download_timeout: Duration,
    /// Output format of returned frames
    pub frame_format: FrameFormat,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Upper bound on frames sampled from one video; larger videos are rejected
    pub max_sampled_frames: u64,
    /// Concurrent scorer calls per request
    pub scorer_concurrency: usize,
    /// Timeout for a single FFmpeg invocation, in seconds
    pub ffmpeg_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_spec: SampleSpec::default(),
            max_frames_per_interval: 10,
            max_interval_seconds: 3600,
            temp_dir: None,
            max_download_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            frame_format: FrameFormat::Jpeg,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            max_sampled_frames: 600,
            scorer_concurrency: 4,
            ffmpeg_timeout_secs: DEFAULT_FFMPEG_TIMEOUT_SECS,
        }
    }
}

impl AnalysisConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let sample_spec = SampleSpec::new(
            env_or("FRAMES_PER_INTERVAL", defaults.sample_spec.frames_per_interval),
            env_or("INTERVAL_SECONDS", defaults.sample_spec.interval_seconds),
        )
        .unwrap_or_else(|e| {
            warn!("Invalid sampling configuration ({}), using defaults", e);
            defaults.sample_spec
        });

        let frame_format = match std::env::var("FRAME_FORMAT") {
            Ok(raw) => raw.parse::<FrameFormat>().unwrap_or_else(|e| {
                warn!("{}, falling back to {}", e, defaults.frame_format);
                defaults.frame_format
            }),
            Err(_) => defaults.frame_format,
        };

        Self {
            sample_spec,
            max_frames_per_interval: env_or("MAX_FRAMES_PER_INTERVAL", defaults.max_frames_per_interval),
            max_interval_seconds: env_or("MAX_INTERVAL_SECONDS", defaults.max_interval_seconds),
            temp_dir: std::env::var("VIDEO_TEMP_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            max_download_bytes: env_or("MAX_DOWNLOAD_BYTES", defaults.max_download_bytes),
            download_timeout: Duration::from_secs(env_or(
                "DOWNLOAD_TIMEOUT",
                defaults.download_timeout.as_secs(),
            )),
            frame_format,
            jpeg_quality: env_or("JPEG_QUALITY", defaults.jpeg_quality).clamp(1, 100),
            max_sampled_frames: env_or("MAX_SAMPLED_FRAMES", defaults.max_sampled_frames).max(1),
            scorer_concurrency: env_or("SCORER_CONCURRENCY", defaults.scorer_concurrency).max(1),
            ffmpeg_timeout_secs: env_or("FFMPEG_TIMEOUT", defaults.ffmpeg_timeout_secs),
        }
    }

    /// Reject request overrides beyond the configured bounds.
    pub fn check_limits(&self, spec: &SampleSpec) -> Result<(), String> {
        spec.validate()?;

        if spec.frames_per_interval > self.max_frames_per_interval {
            return Err(format!(
                "frames_per_interval must be at most {}",
                self.max_frames_per_interval
            ));
        }
        if spec.interval_seconds > self.max_interval_seconds {
            return Err(format!(
                "interval_seconds must be at most {}",
                self.max_interval_seconds
            ));
        }
        Ok(())
    }

    pub fn encoder(&self) -> FrameEncoder {
        FrameEncoder::new(self.frame_format, self.jpeg_quality)
    }
}
