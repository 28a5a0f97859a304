//! Sampled frames and sampling results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::confidence::{aggregate, ConfidenceBand};
use crate::sampling::FrameIndex;

/// A sampled, encoded and (optionally) scored frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedFrame {
    /// Encoded image as a data URI (`data:image/jpeg;base64,...`)
    #[serde(rename = "frame")]
    pub image: String,

    /// Frame index in the source video
    pub index: FrameIndex,

    /// Presentation time of the frame in seconds
    pub timestamp_seconds: f64,

    /// Dominant emotion label, when the scorer produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Confidence of `label` in `0..=1`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ExtractedFrame {
    /// Create an unscored frame.
    pub fn new(index: FrameIndex, timestamp_seconds: f64, image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            index,
            timestamp_seconds,
            label: None,
            confidence: None,
        }
    }

    /// Attach a classification.
    pub fn scored(mut self, label: impl Into<String>, confidence: f64) -> Self {
        self.label = Some(label.into());
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    /// Whether the scorer produced a label for this frame.
    pub fn is_scored(&self) -> bool {
        self.label.is_some()
    }
}

/// Outcome of sampling and scoring one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SamplingResult {
    /// Frames in sampling order
    pub frames: Vec<ExtractedFrame>,
    /// Mean confidence over all frames (unscored frames count as 0)
    pub average_confidence: f64,
    /// Number of frames in `frames`
    pub frames_attempted: usize,
    /// Number of frames that received a label
    pub frames_scored: usize,
}

impl SamplingResult {
    /// Build a result, computing the aggregate and counts from `frames`.
    pub fn from_frames(frames: Vec<ExtractedFrame>) -> Self {
        let average_confidence = aggregate(
            frames
                .iter()
                .map(|f| if f.is_scored() { f.confidence } else { None }),
        );
        let frames_scored = frames.iter().filter(|f| f.is_scored()).count();

        Self {
            frames_attempted: frames.len(),
            frames_scored,
            average_confidence,
            frames,
        }
    }

    /// Mean confidence over scored frames only; 0 when nothing was scored.
    pub fn scored_mean(&self) -> f64 {
        if self.frames_scored == 0 {
            return 0.0;
        }
        self.average_confidence * self.frames_attempted as f64 / self.frames_scored as f64
    }

    /// `average_confidence` as a percentage.
    pub fn average_confidence_percentage(&self) -> f64 {
        self.average_confidence * 100.0
    }

    pub fn band(&self) -> ConfidenceBand {
        ConfidenceBand::from_percentage(self.average_confidence_percentage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: FrameIndex) -> ExtractedFrame {
        ExtractedFrame::new(index, index as f64 / 30.0, "data:image/jpeg;base64,AA==")
    }

    #[test]
    fn test_result_counts_and_average() {
        let result = SamplingResult::from_frames(vec![
            frame(0).scored("happy", 0.8),
            frame(10),
            frame(20).scored("neutral", 0.4),
            frame(30),
        ]);

        assert_eq!(result.frames_attempted, 4);
        assert_eq!(result.frames_scored, 2);
        assert!((result.average_confidence - 0.3).abs() < 1e-9);
        assert!((result.scored_mean() - 0.6).abs() < 1e-9);
        assert!((result.average_confidence_percentage() - 30.0).abs() < 1e-9);
        assert_eq!(result.band(), ConfidenceBand::NeedsImprovement);
    }

    #[test]
    fn test_empty_result() {
        let result = SamplingResult::from_frames(Vec::new());
        assert_eq!(result.average_confidence, 0.0);
        assert_eq!(result.scored_mean(), 0.0);
    }

    #[test]
    fn test_frame_serialization_shape() {
        let json = serde_json::to_value(frame(3).scored("happy", 1.4)).unwrap();
        assert_eq!(json["frame"], "data:image/jpeg;base64,AA==");
        assert_eq!(json["label"], "happy");
        assert_eq!(json["confidence"], 1.0);

        let unscored = serde_json::to_value(frame(3)).unwrap();
        assert!(unscored.get("label").is_none());
        assert!(unscored.get("confidence").is_none());
    }
}
