//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Output target meaning "write to stdout".
const STDOUT_PIPE: &str = "pipe:1";

/// Max bytes of stderr kept in error values.
const MAX_STDERR_BYTES: usize = 4096;

/// Per-invocation timeout when none is configured.
pub const DEFAULT_FFMPEG_TIMEOUT_SECS: u64 = 60;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path, or `pipe:1`
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
        }
    }

    /// Create a command that writes its output to stdout.
    pub fn to_stdout(input: impl AsRef<Path>) -> Self {
        Self::new(input, STDOUT_PIPE)
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set seek position (before input, frame-accurate when decoding).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.6}", seconds))
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Extract single frame.
    pub fn single_frame(self) -> Self {
        self.output_arg("-vframes").output_arg("1")
    }

    /// Emit packed 8-bit RGB without a container.
    pub fn raw_rgb24(self) -> Self {
        self.output_args(["-an", "-f", "rawvideo", "-pix_fmt", "rgb24"])
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-nostdin".to_string());
        args.push("-v".to_string());
        args.push("error".to_string());

        args.extend(self.input_args.iter().cloned());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.iter().cloned());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg and FFprobe with a per-invocation timeout.
///
/// Binary locations are resolved once at construction; a missing binary
/// surfaces as `FfmpegNotFound` / `FfprobeNotFound` on use.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    ffmpeg: Option<PathBuf>,
    ffprobe: Option<PathBuf>,
    timeout_secs: u64,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Locate `ffmpeg` and `ffprobe` on PATH.
    pub fn new() -> Self {
        let ffmpeg = which::which("ffmpeg").ok();
        let ffprobe = which::which("ffprobe").ok();
        if ffmpeg.is_none() || ffprobe.is_none() {
            warn!(
                ffmpeg = ffmpeg.is_some(),
                ffprobe = ffprobe.is_some(),
                "FFmpeg binaries missing from PATH"
            );
        }
        Self::with_binaries(ffmpeg, ffprobe)
    }

    /// Use explicit binary locations instead of searching PATH.
    pub fn with_binaries(ffmpeg: Option<PathBuf>, ffprobe: Option<PathBuf>) -> Self {
        Self {
            ffmpeg,
            ffprobe,
            timeout_secs: DEFAULT_FFMPEG_TIMEOUT_SECS,
        }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn ffmpeg_path(&self) -> MediaResult<&Path> {
        self.ffmpeg.as_deref().ok_or(MediaError::FfmpegNotFound)
    }

    pub fn ffprobe_path(&self) -> MediaResult<&Path> {
        self.ffprobe.as_deref().ok_or(MediaError::FfprobeNotFound)
    }

    /// Run an FFmpeg command and return everything it wrote to stdout.
    pub async fn run_capture(&self, cmd: &FfmpegCommand) -> MediaResult<Vec<u8>> {
        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut command = Command::new(self.ffmpeg_path()?);
        command.args(&args);
        let output = self.output(command).await?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(truncate_stderr(&output.stderr)),
                output.status.code(),
            ))
        }
    }

    /// Spawn `command` with piped output and wait for it under the timeout.
    ///
    /// kill_on_drop reaps the process when the timeout drops the future.
    pub(crate) async fn output(&self, mut command: Command) -> MediaResult<Output> {
        let child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let secs = self.timeout_secs;
        match tokio::time::timeout(Duration::from_secs(secs), child.wait_with_output()).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!("Process timed out after {} seconds, killing it", secs);
                Err(MediaError::Timeout(secs))
            }
        }
    }
}

fn truncate_stderr(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= MAX_STDERR_BYTES {
        return text.to_string();
    }
    let mut end = MAX_STDERR_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_frame_grab() {
        let cmd = FfmpegCommand::to_stdout("/tmp/in.mp4")
            .seek(2.5)
            .single_frame()
            .raw_rgb24();
        let args = cmd.build_args();

        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        let seek_pos = args.iter().position(|a| a == "-ss").unwrap();
        assert!(seek_pos < input_pos, "seek must precede the input");
        assert_eq!(args[seek_pos + 1], "2.500000");
        assert_eq!(args[input_pos + 1], "/tmp/in.mp4");
        assert_eq!(args.last().unwrap(), "pipe:1");
        assert!(args.windows(2).any(|w| w[0] == "-pix_fmt" && w[1] == "rgb24"));
        assert!(args.windows(2).any(|w| w[0] == "-vframes" && w[1] == "1"));
    }

    #[test]
    fn test_truncate_stderr() {
        let long = "x".repeat(MAX_STDERR_BYTES + 10);
        let truncated = truncate_stderr(long.as_bytes());
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.len(), MAX_STDERR_BYTES + 3);
        assert_eq!(truncate_stderr(b"  short \n"), "short");
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_is_reported_without_spawning() {
        let runner = FfmpegRunner::with_binaries(None, None);
        let cmd = FfmpegCommand::to_stdout("/tmp/in.mp4").single_frame();
        assert!(matches!(
            runner.run_capture(&cmd).await,
            Err(MediaError::FfmpegNotFound)
        ));
        assert!(matches!(runner.ffprobe_path(), Err(MediaError::FfprobeNotFound)));
    }

    #[test]
    fn test_timeout_defaults_and_overrides() {
        let runner = FfmpegRunner::with_binaries(None, None);
        assert_eq!(runner.timeout_secs(), DEFAULT_FFMPEG_TIMEOUT_SECS);
        assert_eq!(runner.with_timeout(5).timeout_secs(), 5);
    }
}
