//! `/process-video` request and response schemas.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceBand;
use crate::frame::{ExtractedFrame, SamplingResult};
use crate::sampling::SampleSpec;

/// Request to sample (and score) frames from a video.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProcessVideoRequest {
    /// Video URL or storage key
    #[serde(default)]
    pub video_url: String,

    /// Relevancy score computed elsewhere, echoed back unchanged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevancy_score: Option<f64>,

    /// Override for frames drawn per interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames_per_interval: Option<u32>,

    /// Override for the interval length in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<u32>,

    /// Run emotion scoring (default: true when a scorer is configured)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyze_emotion: Option<bool>,
}

impl ProcessVideoRequest {
    /// Validate the request.
    pub fn validate(&self) -> Result<(), String> {
        if self.video_url.trim().is_empty() {
            return Err("Missing video_url".to_string());
        }

        if let Some(score) = self.relevancy_score {
            if !score.is_finite() {
                return Err("relevancy_score must be a finite number".to_string());
            }
        }

        if self.frames_per_interval == Some(0) {
            return Err("frames_per_interval must be at least 1".to_string());
        }

        if self.interval_seconds == Some(0) {
            return Err("interval_seconds must be at least 1".to_string());
        }

        Ok(())
    }

    /// Sampling spec for this request, falling back to `defaults`.
    pub fn sample_spec(&self, defaults: SampleSpec) -> SampleSpec {
        SampleSpec {
            frames_per_interval: self
                .frames_per_interval
                .unwrap_or(defaults.frames_per_interval),
            interval_seconds: self.interval_seconds.unwrap_or(defaults.interval_seconds),
        }
    }

    /// Whether the caller wants emotion scoring.
    pub fn wants_emotion(&self) -> bool {
        self.analyze_emotion.unwrap_or(true)
    }
}

/// Successful `/process-video` response.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessVideoResponse {
    pub frames: Vec<ExtractedFrame>,
    /// Mean confidence over all sampled frames, 0-100
    pub average_confidence_percentage: f64,
    pub frames_attempted: usize,
    pub frames_scored: usize,
    pub confidence_band: ConfidenceBand,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevancy_score: Option<f64>,
}

impl ProcessVideoResponse {
    pub fn from_result(result: SamplingResult, relevancy_score: Option<f64>) -> Self {
        Self {
            average_confidence_percentage: result.average_confidence_percentage(),
            frames_attempted: result.frames_attempted,
            frames_scored: result.frames_scored,
            confidence_band: result.band(),
            relevancy_score,
            frames: result.frames,
        }
    }
}
