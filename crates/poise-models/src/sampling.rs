//! Frame sampling configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Zero-based index of a decodable frame.
pub type FrameIndex = u64;

/// Default number of random frames drawn per interval.
pub const DEFAULT_FRAMES_PER_INTERVAL: u32 = 2;
/// Default interval length in seconds.
pub const DEFAULT_INTERVAL_SECONDS: u32 = 5;

/// How many frames to draw, and from how long a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SampleSpec {
    /// Frames drawn (with replacement) from each full window. Must be >= 1.
    pub frames_per_interval: u32,
    /// Window length in seconds. Must be >= 1.
    pub interval_seconds: u32,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            frames_per_interval: DEFAULT_FRAMES_PER_INTERVAL,
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
        }
    }
}

impl SampleSpec {
    /// Create a validated spec.
    pub fn new(frames_per_interval: u32, interval_seconds: u32) -> Result<Self, String> {
        let spec = Self {
            frames_per_interval,
            interval_seconds,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Validate the spec.
    pub fn validate(&self) -> Result<(), String> {
        if self.frames_per_interval == 0 {
            return Err("frames_per_interval must be at least 1".to_string());
        }
        if self.interval_seconds == 0 {
            return Err("interval_seconds must be at least 1".to_string());
        }
        Ok(())
    }

    /// Number of indices a video of `duration_seconds` whole seconds yields.
    pub fn expected_samples(&self, duration_seconds: u64) -> u64 {
        if self.interval_seconds == 0 {
            return 0;
        }
        (duration_seconds / u64::from(self.interval_seconds)) * u64::from(self.frames_per_interval)
    }
}
