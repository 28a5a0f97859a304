//! Raster frame encoding for transport.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbImage};

use crate::error::{MediaError, MediaResult};

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Compressed image formats frames can be encoded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameFormat {
    #[default]
    Jpeg,
    Png,
}

impl FrameFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            FrameFormat::Jpeg => "image/jpeg",
            FrameFormat::Png => "image/png",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameFormat::Jpeg => "jpeg",
            FrameFormat::Png => "png",
        }
    }
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameFormat {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(FrameFormat::Jpeg),
            "png" => Ok(FrameFormat::Png),
            other => Err(MediaError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Encoder settings for sampled frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEncoder {
    pub format: FrameFormat,
    /// JPEG quality, ignored for PNG
    pub quality: u8,
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self {
            format: FrameFormat::Jpeg,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl FrameEncoder {
    pub fn new(format: FrameFormat, quality: u8) -> Self {
        Self {
            format,
            quality: quality.clamp(1, 100),
        }
    }

    /// Compress a raster frame.
    pub fn encode(&self, frame: &RgbImage) -> MediaResult<Vec<u8>> {
        let mut buf = Vec::new();
        let (width, height) = frame.dimensions();

        match self.format {
            FrameFormat::Jpeg => {
                JpegEncoder::new_with_quality(&mut buf, self.quality).encode(
                    frame.as_raw(),
                    width,
                    height,
                    ColorType::Rgb8,
                )?;
            }
            FrameFormat::Png => {
                PngEncoder::new(&mut buf).write_image(
                    frame.as_raw(),
                    width,
                    height,
                    ColorType::Rgb8,
                )?;
            }
        }

        Ok(buf)
    }

    /// Compress a raster frame straight into a data URI.
    pub fn encode_data_uri(&self, frame: &RgbImage) -> MediaResult<String> {
        let bytes = self.encode(frame)?;
        Ok(to_data_uri(&bytes, self.format))
    }
}

/// `data:<mime>;base64,<payload>` for already-encoded image bytes.
pub fn to_data_uri(bytes: &[u8], format: FrameFormat) -> String {
    format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(bytes))
}

/// Inverse of [`to_data_uri`]: the raw base64 payload of a data URI.
pub fn data_uri_payload(uri: &str) -> Option<&str> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    meta.ends_with(";base64").then_some(payload)
}
