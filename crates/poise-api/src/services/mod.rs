//! Business logic services.

pub mod frame_analysis;
pub mod video_source;

pub use frame_analysis::{analyze_frames, analyze_video, sample_indices};
pub use video_source::open_video;
