//! Resolve a video reference into a probed local video.

use std::time::Instant;

use tracing::{debug, info};

use poise_media::{create_scratch_dir, VideoHandle};
use poise_models::{AnalysisError, AnalysisResult, VideoReference};

use crate::metrics;
use crate::state::AppState;

/// Fetch the referenced video into a fresh scratch directory and probe it.
///
/// The scratch directory belongs to the returned handle; on any error it is
/// removed before this function returns.
pub async fn open_video(state: &AppState, reference: &VideoReference) -> AnalysisResult<VideoHandle> {
    let scratch = create_scratch_dir(state.analysis.temp_dir.as_deref())?;
    let dest = VideoHandle::source_path(&scratch);
    debug!("Fetching {} into {}", reference, dest.display());

    let start = Instant::now();
    let bytes = match reference {
        VideoReference::Url(url) => state.downloader.download_to(url, &dest).await?,
        VideoReference::StorageKey(key) => {
            let storage = state.storage.as_ref().ok_or_else(|| {
                AnalysisError::source_fetch_failed(format!(
                    "cannot fetch storage key '{}': object storage is not configured",
                    key
                ))
            })?;
            storage
                .download_to_file(key, &dest, state.downloader.max_bytes())
                .await?
        }
    };
    metrics::record_download_duration(reference.kind(), start.elapsed().as_secs_f64());
    info!(source = reference.kind(), bytes, "Fetched source video");

    Ok(VideoHandle::open(scratch, state.runner.clone()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisConfig, ApiConfig};

    #[tokio::test]
    async fn test_storage_key_without_storage_fails_fetch() {
        let scratch_parent = tempfile::tempdir().unwrap();
        let analysis = AnalysisConfig {
            temp_dir: Some(scratch_parent.path().to_path_buf()),
            ..AnalysisConfig::default()
        };
        let state = AppState::from_parts(ApiConfig::default(), analysis, None, None).unwrap();

        let reference = VideoReference::parse("videos/clip.mp4").unwrap();
        let err = open_video(&state, &reference).await.unwrap_err();
        assert!(matches!(err, AnalysisError::SourceFetchFailed(_)));

        // Scratch directory is gone after the failure
        assert_eq!(std::fs::read_dir(scratch_parent.path()).unwrap().count(), 0);
    }
}
