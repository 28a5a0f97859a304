//! FFprobe video metadata.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::command::FfmpegRunner;
use crate::error::{MediaError, MediaResult};

/// Decodable-video metadata needed for sampling and frame reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Total number of video frames
    pub frame_count: u64,
    /// Average frame rate (fps)
    pub frame_rate: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Duration in seconds as reported by the container
    pub duration_seconds: f64,
    /// Video codec
    pub codec: String,
}

impl VideoMetadata {
    /// Check the invariants sampling and frame reads depend on.
    pub fn validate(&self) -> MediaResult<()> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(MediaError::invalid_metadata(format!(
                "frame rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if self.frame_count == 0 {
            return Err(MediaError::invalid_metadata("frame count is zero"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(MediaError::invalid_metadata(format!(
                "invalid frame dimensions {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Whole seconds of video, as used by the sampler.
    pub fn whole_seconds(&self) -> u64 {
        (self.frame_count as f64 / self.frame_rate).floor() as u64
    }

    /// Presentation time of `index`.
    pub fn timestamp_of(&self, index: u64) -> f64 {
        index as f64 / self.frame_rate
    }

    /// Size of one packed RGB24 frame in bytes.
    pub fn rgb24_frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
    nb_frames: Option<String>,
    nb_read_frames: Option<String>,
}

/// Probe a video file for metadata.
///
/// The frame count comes from the stream header (`nb_frames`). Containers that
/// omit it (WebM, MKV) are re-probed with `-count_frames`; if that also yields
/// nothing the count is estimated from duration and frame rate.
///
/// Each ffprobe invocation is bounded by the runner's timeout.
pub async fn probe_video(runner: &FfmpegRunner, path: impl AsRef<Path>) -> MediaResult<VideoMetadata> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let probe = run_ffprobe(runner, path, &["-show_format", "-show_streams"]).await?;
    let mut metadata = parse_probe_output(&probe)?;

    if metadata.frame_count == 0 {
        debug!(path = %path.display(), "nb_frames missing, counting frames");
        let counted = run_ffprobe(
            runner,
            path,
            &[
                "-select_streams",
                "v:0",
                "-count_frames",
                "-show_entries",
                "stream=nb_read_frames",
            ],
        )
        .await?;
        metadata.frame_count = counted
            .streams
            .first()
            .and_then(|s| parse_u64(s.nb_read_frames.as_deref()))
            .unwrap_or(0);
    }

    if metadata.frame_count == 0 && metadata.duration_seconds > 0.0 && metadata.frame_rate > 0.0 {
        metadata.frame_count = (metadata.duration_seconds * metadata.frame_rate).round() as u64;
    }

    metadata.validate()?;
    Ok(metadata)
}

async fn run_ffprobe(
    runner: &FfmpegRunner,
    path: &Path,
    extra_args: &[&str],
) -> MediaResult<FfprobeOutput> {
    let mut command = Command::new(runner.ffprobe_path()?);
    command
        .args(["-v", "quiet", "-print_format", "json"])
        .args(extra_args)
        .arg(path);
    let output = runner.output(command).await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe could not read the file".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    Ok(serde_json::from_slice(&output.stdout)?)
}

/// Turn `ffprobe -show_format -show_streams` output into metadata.
///
/// `frame_count` is 0 when the header does not carry it.
fn parse_probe_output(probe: &FfprobeOutput) -> MediaResult<VideoMetadata> {
    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| MediaError::InvalidVideo("No video stream found".to_string()))?;

    let frame_rate = video_stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video_stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .ok_or_else(|| MediaError::invalid_metadata("frame rate missing"))?;

    let duration_seconds = video_stream
        .duration
        .as_deref()
        .or(probe.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(0.0);

    Ok(VideoMetadata {
        frame_count: parse_u64(video_stream.nb_frames.as_deref()).unwrap_or(0),
        frame_rate,
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
        duration_seconds,
        codec: video_stream.codec_name.clone().unwrap_or_default(),
    })
}

fn parse_u64(s: Option<&str>) -> Option<u64> {
    s.and_then(|v| v.trim().parse::<u64>().ok())
}

/// Parse frame rate string (e.g., "30/1" or "29.97"). Zero and "0/0" yield `None`.
fn parse_frame_rate(s: &str) -> Option<f64> {
    let rate = if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den <= 0.0 {
            return None;
        }
        num / den
    } else {
        s.parse().ok()?
    };

    (rate.is_finite() && rate > 0.0).then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_json(stream: serde_json::Value) -> FfprobeOutput {
        serde_json::from_value(serde_json::json!({
            "format": { "duration": "10.000000" },
            "streams": [
                { "codec_type": "audio", "codec_name": "aac" },
                stream,
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("0/0").is_none());
        assert!(parse_frame_rate("0").is_none());
    }

    #[test]
    fn test_parse_probe_output_mp4() {
        let probe = probe_json(serde_json::json!({
            "codec_type": "video",
            "codec_name": "h264",
            "width": 1280,
            "height": 720,
            "avg_frame_rate": "30/1",
            "duration": "10.000000",
            "nb_frames": "300"
        }));
        let meta = parse_probe_output(&probe).unwrap();
        assert_eq!(meta.frame_count, 300);
        assert_eq!(meta.whole_seconds(), 10);
        assert_eq!(meta.codec, "h264");
        assert_eq!(meta.rgb24_frame_len(), 1280 * 720 * 3);
        assert!(meta.validate().is_ok());
    }

    #[test]
    fn test_parse_probe_output_webm_without_frame_count() {
        let probe = probe_json(serde_json::json!({
            "codec_type": "video",
            "codec_name": "vp8",
            "width": 640,
            "height": 480,
            "avg_frame_rate": "0/0",
            "r_frame_rate": "25/1"
        }));
        let meta = parse_probe_output(&probe).unwrap();
        assert_eq!(meta.frame_count, 0);
        assert!((meta.frame_rate - 25.0).abs() < f64::EPSILON);
        assert!((meta.duration_seconds - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_frame_rate_is_invalid_metadata() {
        let probe = probe_json(serde_json::json!({
            "codec_type": "video",
            "width": 640,
            "height": 480,
            "avg_frame_rate": "0/0",
            "r_frame_rate": "0/0"
        }));
        assert!(matches!(
            parse_probe_output(&probe),
            Err(MediaError::InvalidMetadata(_))
        ));
    }

    #[test]
    fn test_no_video_stream() {
        let probe: FfprobeOutput = serde_json::from_value(serde_json::json!({
            "streams": [{ "codec_type": "audio" }]
        }))
        .unwrap();
        assert!(matches!(
            parse_probe_output(&probe),
            Err(MediaError::InvalidVideo(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_frames() {
        let meta = VideoMetadata {
            frame_count: 0,
            frame_rate: 30.0,
            width: 10,
            height: 10,
            duration_seconds: 0.0,
            codec: String::new(),
        };
        assert!(matches!(meta.validate(), Err(MediaError::InvalidMetadata(_))));
    }

    #[tokio::test]
    async fn test_probe_without_ffprobe() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let runner = FfmpegRunner::with_binaries(None, None);
        assert!(matches!(
            probe_video(&runner, file.path()).await,
            Err(MediaError::FfprobeNotFound)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_honours_runner_timeout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let stalled = dir.path().join("ffprobe");
        std::fs::write(&stalled, "#!/bin/sh\nsleep 10\n").unwrap();
        std::fs::set_permissions(&stalled, std::fs::Permissions::from_mode(0o755)).unwrap();
        let video = dir.path().join("source");
        std::fs::write(&video, b"not a video").unwrap();

        let runner = FfmpegRunner::with_binaries(None, Some(stalled)).with_timeout(1);
        assert!(matches!(
            probe_video(&runner, &video).await,
            Err(MediaError::Timeout(1))
        ));
    }
}
