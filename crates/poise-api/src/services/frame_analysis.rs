//! Frame sampling, encoding and emotion scoring for one video.

use std::time::Instant;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use poise_media::{
    data_uri_payload, sample_frames, FrameEncoder, FrameReader, MediaError, RgbImage,
    VideoMetadata,
};
use poise_ml_client::{EmotionOutcome, EmotionScorer};
use poise_models::{
    AnalysisError, AnalysisResult, ExtractedFrame, FrameIndex, SampleSpec, SamplingResult,
    VideoReference,
};

use crate::metrics;
use crate::services::video_source::open_video;
use crate::state::AppState;

/// Fetch, sample and (optionally) score one video.
#[instrument(skip_all, fields(source = reference.kind(), score = score))]
pub async fn analyze_video(
    state: &AppState,
    reference: &VideoReference,
    spec: SampleSpec,
    score: bool,
) -> AnalysisResult<SamplingResult> {
    let start = Instant::now();
    let outcome = run(state, reference, spec, score).await;

    let label = match &outcome {
        Ok(_) => "ok",
        Err(e) => e.code(),
    };
    metrics::record_analysis(label, start.elapsed().as_secs_f64());
    outcome
}

async fn run(
    state: &AppState,
    reference: &VideoReference,
    spec: SampleSpec,
    score: bool,
) -> AnalysisResult<SamplingResult> {
    let handle = open_video(state, reference).await?;
    let indices = sample_indices(handle.metadata(), &spec, state.analysis.max_sampled_frames)?;
    metrics::record_frames_sampled(indices.len());

    let scorer = if score { state.scorer.as_deref() } else { None };
    let result = analyze_frames(
        &handle,
        &indices,
        state.encoder,
        scorer,
        state.analysis.scorer_concurrency,
    )
    .await;

    if let Err(e) = handle.close() {
        warn!("Failed to remove scratch directory: {}", e);
    }

    let result = result?;
    info!(
        attempted = result.frames_attempted,
        scored = result.frames_scored,
        average = result.average_confidence,
        "Analysis complete"
    );
    Ok(result)
}

/// Draw at most `max_samples` frame indices for `metadata` using a thread-local RNG.
pub fn sample_indices(
    metadata: &VideoMetadata,
    spec: &SampleSpec,
    max_samples: u64,
) -> AnalysisResult<Vec<FrameIndex>> {
    let mut rng = rand::rng();
    Ok(sample_frames(
        metadata.frame_count,
        metadata.frame_rate,
        spec,
        max_samples,
        &mut rng,
    )?)
}

/// Decode and encode the frames at `indices`, then score them if a scorer is given.
///
/// Up to `concurrency` scorer calls run at once. Output keeps the order of
/// `indices`. Frames that fail to decode are dropped; frames whose scoring
/// fails are kept unscored.
pub async fn analyze_frames(
    reader: &dyn FrameReader,
    indices: &[FrameIndex],
    encoder: FrameEncoder,
    scorer: Option<&dyn EmotionScorer>,
    concurrency: usize,
) -> AnalysisResult<SamplingResult> {
    if indices.is_empty() {
        return Err(AnalysisError::no_frames(format!(
            "video is shorter than one sampling interval ({:.2}s)",
            reader.metadata().duration_seconds
        )));
    }

    let metadata = reader.metadata();
    let mut frames = Vec::with_capacity(indices.len());

    // One FFmpeg process per read, so reads stay sequential
    for &index in indices {
        match extract_frame(reader, encoder, index).await {
            Ok(image) => {
                metrics::record_frame_decoded();
                frames.push(ExtractedFrame::new(index, metadata.timestamp_of(index), image));
            }
            Err(e) => {
                metrics::record_frame_decode_failure();
                warn!(index, "Failed to extract frame: {}", e);
            }
        }
    }

    if frames.is_empty() {
        return Err(AnalysisError::no_frames(format!(
            "none of {} sampled frames could be decoded",
            indices.len()
        )));
    }
    debug!("Extracted {} of {} frames", frames.len(), indices.len());

    let frames = match scorer {
        Some(scorer) => {
            stream::iter(frames)
                .map(|frame| score_frame(scorer, encoder, frame))
                .buffered(concurrency.max(1))
                .collect()
                .await
        }
        None => frames,
    };

    Ok(SamplingResult::from_frames(frames))
}

/// Read one frame and return it as a data URI.
async fn extract_frame(
    reader: &dyn FrameReader,
    encoder: FrameEncoder,
    index: FrameIndex,
) -> Result<String, MediaError> {
    let raster: RgbImage = reader.read_frame(index).await?;
    tokio::task::spawn_blocking(move || encoder.encode_data_uri(&raster))
        .await
        .map_err(|e| MediaError::Internal(format!("encode task failed: {}", e)))?
}

async fn score_frame(
    scorer: &dyn EmotionScorer,
    encoder: FrameEncoder,
    frame: ExtractedFrame,
) -> ExtractedFrame {
    let Some(payload) = data_uri_payload(&frame.image) else {
        warn!(index = frame.index, "Frame is not a base64 data URI, skipping scoring");
        return frame;
    };

    match scorer.classify(payload, encoder.format.as_str()).await {
        Ok(EmotionOutcome::Detected { label, confidence }) => {
            metrics::record_frame_scored(&label);
            frame.scored(label, confidence)
        }
        Ok(EmotionOutcome::NoSubjectDetected) => {
            metrics::record_frame_scored("none");
            debug!(index = frame.index, "No face detected");
            frame
        }
        Err(e) => {
            metrics::record_scoring_failure();
            let err = AnalysisError::from(e);
            warn!(index = frame.index, code = err.code(), "{}", err);
            frame
        }
    }
}
