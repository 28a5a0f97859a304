//! Confidence aggregation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Mean confidence over every frame in `scores`.
///
/// `None` stands for a frame that produced no signal (scoring failed or no
/// face was found) and counts as 0 in the numerator while still counting in
/// the denominator. Negative and non-finite values are treated as 0. Empty
/// input yields 0.
pub fn aggregate<I>(scores: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = scores.into_iter().fold((0.0_f64, 0_usize), |(sum, count), score| {
        let value = match score {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => 0.0,
        };
        (sum + value, count + 1)
    });

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Qualitative band for a confidence percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    Excellent,
    Good,
    NeedsImprovement,
}

impl ConfidenceBand {
    /// Band for a percentage in `0..=100`.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            ConfidenceBand::Excellent
        } else if percentage >= 60.0 {
            ConfidenceBand::Good
        } else {
            ConfidenceBand::NeedsImprovement
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBand::Excellent => "excellent",
            ConfidenceBand::Good => "good",
            ConfidenceBand::NeedsImprovement => "needs_improvement",
        }
    }
}
