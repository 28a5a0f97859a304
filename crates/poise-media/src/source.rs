//! Local video handles and random-access frame reads.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::RgbImage;
use tempfile::TempDir;
use tracing::{debug, info};

use poise_models::FrameIndex;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_video, VideoMetadata};

/// File name of the downloaded source inside a scratch directory.
const SOURCE_FILE_NAME: &str = "source";

/// Random access to decoded frames of one video.
#[async_trait]
pub trait FrameReader: Send + Sync {
    /// Metadata of the underlying video.
    fn metadata(&self) -> &VideoMetadata;

    /// Decode frame `index` into packed RGB.
    async fn read_frame(&self, index: FrameIndex) -> MediaResult<RgbImage>;
}

/// A probed video living in a request-scoped scratch directory.
///
/// Dropping the handle removes the scratch directory and everything in it.
#[derive(Debug)]
pub struct VideoHandle {
    scratch: TempDir,
    path: PathBuf,
    metadata: VideoMetadata,
    runner: FfmpegRunner,
}

impl VideoHandle {
    /// Where the source video should be written inside `scratch`.
    pub fn source_path(scratch: &TempDir) -> PathBuf {
        scratch.path().join(SOURCE_FILE_NAME)
    }

    /// Probe the video at [`VideoHandle::source_path`] and take ownership of its scratch dir.
    pub async fn open(scratch: TempDir, runner: FfmpegRunner) -> MediaResult<Self> {
        let path = Self::source_path(&scratch);
        let metadata = probe_video(&runner, &path).await?;

        info!(
            frames = metadata.frame_count,
            fps = metadata.frame_rate,
            width = metadata.width,
            height = metadata.height,
            codec = %metadata.codec,
            "Opened video"
        );

        Ok(Self {
            scratch,
            path,
            metadata,
            runner,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the handle, reporting cleanup failures instead of ignoring them.
    pub fn close(self) -> MediaResult<()> {
        let dir = self.scratch.path().to_path_buf();
        self.scratch.close()?;
        debug!("Removed scratch directory {}", dir.display());
        Ok(())
    }

    fn frame_command(&self, index: FrameIndex) -> FfmpegCommand {
        FfmpegCommand::to_stdout(&self.path)
            .input_arg("-noautorotate")
            .seek(self.metadata.timestamp_of(index))
            .video_filter(format!(
                "scale={}:{}",
                self.metadata.width, self.metadata.height
            ))
            .single_frame()
            .raw_rgb24()
    }
}

#[async_trait]
impl FrameReader for VideoHandle {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    async fn read_frame(&self, index: FrameIndex) -> MediaResult<RgbImage> {
        if index >= self.metadata.frame_count {
            return Err(MediaError::FrameOutOfRange {
                index,
                frame_count: self.metadata.frame_count,
            });
        }

        let mut bytes = self.runner.run_capture(&self.frame_command(index)).await?;
        rgb_from_raw(&mut bytes, self.metadata.width, self.metadata.height)
            .ok_or_else(|| {
                MediaError::InvalidVideo(format!(
                    "frame {} decoded to {} bytes, expected {}",
                    index,
                    bytes.len(),
                    self.metadata.rgb24_frame_len()
                ))
            })
    }
}

/// Wrap exactly one packed RGB24 frame; `None` on a short read.
fn rgb_from_raw(bytes: &mut Vec<u8>, width: u32, height: u32) -> Option<RgbImage> {
    let expected = width as usize * height as usize * 3;
    if expected == 0 || bytes.len() < expected {
        return None;
    }
    bytes.truncate(expected);
    RgbImage::from_raw(width, height, std::mem::take(bytes))
}
