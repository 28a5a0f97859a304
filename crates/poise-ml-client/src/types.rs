//! Emotion service request/response types.

use serde::{Deserialize, Serialize};

/// Request body for `POST /classify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
    /// Base64-encoded image bytes (no data URI prefix)
    pub image: String,
    /// Image format, e.g. "jpeg" or "png"
    pub format: String,
}

/// Response body of `POST /classify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub face_detected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Either 0–1 or 0–100 depending on the deployed model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Result of classifying one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum EmotionOutcome {
    /// A face was found; `confidence` is in [0, 1].
    Detected { label: String, confidence: f64 },
    NoSubjectDetected,
}

impl TryFrom<ClassifyResponse> for EmotionOutcome {
    type Error = String;

    fn try_from(response: ClassifyResponse) -> Result<Self, Self::Error> {
        if !response.face_detected {
            return Ok(EmotionOutcome::NoSubjectDetected);
        }

        let label = response
            .label
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| "face detected but no label returned".to_string())?;
        let raw = response
            .confidence
            .ok_or_else(|| "face detected but no confidence returned".to_string())?;

        Ok(EmotionOutcome::Detected {
            label,
            confidence: normalize_confidence(raw)?,
        })
    }
}

/// Bring a reported confidence onto the [0, 1] scale.
///
/// Values above 1 are read as percentages.
pub fn normalize_confidence(raw: f64) -> Result<f64, String> {
    if !raw.is_finite() || raw < 0.0 {
        return Err(format!("confidence out of range: {}", raw));
    }
    let value = if raw > 1.0 { raw / 100.0 } else { raw };
    Ok(value.min(1.0))
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}
