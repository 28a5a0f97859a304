//! Interval-based random frame sampling.
//!
//! The video is cut into whole-second windows of `interval_seconds`; a trailing
//! partial window is ignored. From each window `frames_per_interval` indices are
//! drawn uniformly, with replacement. Randomising inside the window avoids
//! always landing on the same keyframe cadence while keeping the number of
//! decodes proportional to video length.

use rand::Rng;

use poise_models::{FrameIndex, SampleSpec};

use crate::error::{MediaError, MediaResult};

/// Draw frame indices for a video of `frame_count` frames at `frame_rate` fps.
///
/// Returns indices in window order, then draw order. An empty vector means the
/// video is shorter than one interval. Metadata that would need more than
/// `max_samples` indices is rejected before anything is drawn.
pub fn sample_frames<R>(
    frame_count: u64,
    frame_rate: f64,
    spec: &SampleSpec,
    max_samples: u64,
    rng: &mut R,
) -> MediaResult<Vec<FrameIndex>>
where
    R: Rng + ?Sized,
{
    if frame_count == 0 {
        return Err(MediaError::invalid_metadata("frame count is zero"));
    }
    if !frame_rate.is_finite() || frame_rate <= 0.0 {
        return Err(MediaError::invalid_metadata(format!(
            "frame rate must be positive, got {}",
            frame_rate
        )));
    }
    spec.validate().map_err(MediaError::Internal)?;

    let interval = u64::from(spec.interval_seconds);
    let per_window = u64::from(spec.frames_per_interval);

    // Kept in f64 until bounded: a tiny frame rate makes the duration overflow u64
    let whole_seconds = (frame_count as f64 / frame_rate).floor();
    let windows = (whole_seconds / interval as f64).floor();
    let needed = windows * per_window as f64;
    if needed > max_samples as f64 {
        return Err(MediaError::invalid_metadata(format!(
            "{} frames at {} fps would need {:.0} samples, limit is {}",
            frame_count, frame_rate, needed, max_samples
        )));
    }

    // windows <= needed <= max_samples, so the cast is exact
    let windows = windows as u64;
    let mut indices = Vec::new();
    let last_frame = frame_count - 1;

    for window in 0..windows {
        let start_second = window * interval;
        let (low, high) = window_bounds(start_second, interval, frame_rate, last_frame);
        for _ in 0..per_window {
            indices.push(rng.random_range(low..=high));
        }
    }

    Ok(indices)
}

/// Inclusive index range for the window starting at `start_second`.
fn window_bounds(start_second: u64, interval: u64, frame_rate: f64, last_frame: u64) -> (u64, u64) {
    let low = ((start_second as f64 * frame_rate).floor() as u64).min(last_frame);
    let end = ((start_second + interval) as f64 * frame_rate).floor() as u64;
    let high = end.saturating_sub(1).min(last_frame).max(low);
    (low, high)
}
