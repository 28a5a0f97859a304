//! `POST /process-video` handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::{info, warn};

use poise_models::{ProcessVideoRequest, ProcessVideoResponse, VideoReference};

use crate::error::{ApiError, ApiResult};
use crate::services::analyze_video;
use crate::state::AppState;

/// Sample frames from a video, score them and report the average confidence.
pub async fn process_video(
    State(state): State<AppState>,
    payload: Result<Json<ProcessVideoRequest>, JsonRejection>,
) -> ApiResult<Json<ProcessVideoResponse>> {
    let hide_internal = state.config.is_production();
    handle(state, payload)
        .await
        .map_err(|e| e.redacted(hide_internal))
}

async fn handle(
    state: AppState,
    payload: Result<Json<ProcessVideoRequest>, JsonRejection>,
) -> ApiResult<Json<ProcessVideoResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    request.validate().map_err(ApiError::BadRequest)?;

    let spec = request.sample_spec(state.analysis.sample_spec);
    state
        .analysis
        .check_limits(&spec)
        .map_err(ApiError::BadRequest)?;

    let reference = VideoReference::parse(&request.video_url)?;
    let score = request.wants_emotion() && state.scorer.is_some();
    if request.analyze_emotion == Some(true) && state.scorer.is_none() {
        warn!("Emotion scoring requested but no scorer is configured");
    }

    info!(
        source = reference.kind(),
        frames_per_interval = spec.frames_per_interval,
        interval_seconds = spec.interval_seconds,
        score,
        "Processing video"
    );

    let timeout = state.config.request_timeout;
    let result = tokio::time::timeout(timeout, analyze_video(&state, &reference, spec, score))
        .await
        .map_err(|_| ApiError::Timeout(timeout.as_secs()))??;

    Ok(Json(ProcessVideoResponse::from_result(
        result,
        request.relevancy_score,
    )))
}
