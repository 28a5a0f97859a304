#![deny(unreachable_patterns)]
//! Video access and frame sampling.
//!
//! This crate provides:
//! - HTTP(S) video download into request-scoped scratch directories
//! - FFprobe metadata (frame count, frame rate, dimensions)
//! - FFmpeg random-access frame decoding to RGB rasters
//! - Interval-based random frame sampling
//! - JPEG/PNG frame encoding and data URIs

pub mod command;
pub mod download;
pub mod encode;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod sampler;
pub mod source;

pub use command::{FfmpegCommand, FfmpegRunner, DEFAULT_FFMPEG_TIMEOUT_SECS};
pub use download::{HttpDownloader, DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_MAX_DOWNLOAD_BYTES};
pub use encode::{data_uri_payload, to_data_uri, FrameEncoder, FrameFormat, DEFAULT_JPEG_QUALITY};
pub use error::{MediaError, MediaResult};
pub use fs_utils::create_scratch_dir;
pub use probe::{probe_video, VideoMetadata};
pub use sampler::sample_frames;
pub use source::{FrameReader, VideoHandle};

/// Re-exported so callers can name frame rasters without depending on `image`.
pub use image::RgbImage;
