//! Shared data models for the Poise backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video references (URL or storage key)
//! - Sampling configuration and sampled frames
//! - Confidence aggregation
//! - The analysis error taxonomy
//! - `/process-video` request/response schemas

pub mod analysis;
pub mod confidence;
pub mod error;
pub mod frame;
pub mod sampling;
pub mod video;

// Re-export common types
pub use analysis::{ProcessVideoRequest, ProcessVideoResponse};
pub use confidence::{aggregate, ConfidenceBand};
pub use error::{AnalysisError, AnalysisResult};
pub use frame::{ExtractedFrame, SamplingResult};
pub use sampling::{FrameIndex, SampleSpec, DEFAULT_FRAMES_PER_INTERVAL, DEFAULT_INTERVAL_SECONDS};
pub use video::VideoReference;
