//! Router-level tests driven through `tower::ServiceExt::oneshot`.
//!
//! Run the FFmpeg-backed test with: cargo test -p poise-api --test api_tests -- --ignored

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use poise_api::{create_router, AnalysisConfig, ApiConfig, AppState};
use poise_media::FfmpegRunner;
use poise_ml_client::{EmotionOutcome, EmotionScorer, MlResult};

struct FixedScorer(f64);

#[async_trait]
impl EmotionScorer for FixedScorer {
    async fn classify(&self, _image_base64: &str, _format: &str) -> MlResult<EmotionOutcome> {
        Ok(EmotionOutcome::Detected {
            label: "happy".to_string(),
            confidence: self.0,
        })
    }

    async fn health_check(&self) -> MlResult<bool> {
        Ok(true)
    }
}

struct TestApp {
    router: Router,
    // Keeps the scratch parent alive for the duration of the test
    scratch: TempDir,
}

fn test_app(config: ApiConfig, scorer: Option<Arc<dyn EmotionScorer>>) -> TestApp {
    let scratch = tempfile::tempdir().unwrap();
    let analysis = AnalysisConfig {
        temp_dir: Some(scratch.path().to_path_buf()),
        ..AnalysisConfig::default()
    };
    let state = AppState::from_parts(config, analysis, None, scorer).unwrap();
    TestApp {
        router: create_router(state, None),
        scratch,
    }
}

fn process_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process-video")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-Forwarded-For", "198.51.100.10")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app(ApiConfig::default(), None);
    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = test_app(ApiConfig::default(), None);
    let response = app
        .router
        .oneshot(
            Request::get("/healthz")
                .header("X-Request-ID", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "abc-123");
}

#[tokio::test]
async fn test_ready_reports_disabled_collaborators() {
    let app = test_app(ApiConfig::default(), None);
    let response = app
        .router
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    // 200 or 503 depending on whether FFmpeg is installed
    assert!(matches!(
        response.status(),
        StatusCode::OK | StatusCode::SERVICE_UNAVAILABLE
    ));
    let body = json_body(response).await;
    assert_eq!(body["checks"]["storage"]["status"], "disabled");
    assert_eq!(body["checks"]["scorer"]["status"], "disabled");
}

#[tokio::test]
async fn test_ready_degraded_without_ffmpeg() {
    let mut state =
        AppState::from_parts(ApiConfig::default(), AnalysisConfig::default(), None, None).unwrap();
    state.runner = FfmpegRunner::with_binaries(None, None);

    let response = create_router(state, None)
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["ffmpeg"]["status"], "error");
    assert_eq!(body["checks"]["ffprobe"]["status"], "error");
}

#[tokio::test]
async fn test_metrics_route_absent_when_disabled() {
    let app = test_app(ApiConfig::default(), None);
    let response = app
        .router
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_video_url() {
    let app = test_app(ApiConfig::default(), None);
    let response = app.router.oneshot(process_request(json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "bad_request");
    assert_eq!(body["error"], "Missing video_url");
}

#[tokio::test]
async fn test_malformed_json() {
    let app = test_app(ApiConfig::default(), None);
    let request = Request::builder()
        .method("POST")
        .uri("/process-video")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"video_url\": "))
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "bad_request");
}

#[tokio::test]
async fn test_override_above_limit() {
    let app = test_app(ApiConfig::default(), None);
    let response = app
        .router
        .oneshot(process_request(json!({
            "video_url": "https://videos.example.com/a.mp4",
            "frames_per_interval": 50
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unsupported_scheme() {
    let app = test_app(ApiConfig::default(), None);
    let response = app
        .router
        .oneshot(process_request(json!({"video_url": "ftp://example.com/a.mp4"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "bad_request");
}

#[tokio::test]
async fn test_storage_key_without_storage() {
    let app = test_app(ApiConfig::default(), None);
    let response = app
        .router
        .oneshot(process_request(json!({"video_url": "uploads/clip.mp4"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["code"], "source_fetch_failed");
}

#[tokio::test]
async fn test_unreachable_source_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.mp4"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let app = test_app(ApiConfig::default(), None);
    let response = app
        .router
        .oneshot(process_request(json!({
            "video_url": format!("{}/missing.mp4", server.uri())
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["code"], "source_fetch_failed");
    assert_eq!(
        std::fs::read_dir(app.scratch.path()).unwrap().count(),
        0,
        "scratch directory must be removed after a failed fetch"
    );
}

#[tokio::test]
async fn test_slow_source_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.mp4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0u8; 16])
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = ApiConfig {
        request_timeout: Duration::from_secs(1),
        ..ApiConfig::default()
    };
    let app = test_app(config, None);
    let response = app
        .router
        .oneshot(process_request(json!({
            "video_url": format!("{}/slow.mp4", server.uri())
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json_body(response).await["code"], "timeout");
}

#[tokio::test]
async fn test_rate_limit() {
    let config = ApiConfig {
        rate_limit_rps: 1,
        rate_limit_burst: 1,
        ..ApiConfig::default()
    };
    let app = test_app(config, None);

    let first = app
        .router
        .clone()
        .oneshot(process_request(json!({})))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::BAD_REQUEST);

    let second = app
        .router
        .clone()
        .oneshot(process_request(json!({})))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.headers().get("retry-after").unwrap(), "1");
    assert_eq!(json_body(second).await["code"], "rate_limited");
}

/// Encode a 12 second 160x120 test pattern at 25 fps and return its bytes.
fn render_test_video(dir: &std::path::Path) -> Vec<u8> {
    let dest = dir.join("pattern.mp4");
    let status = std::process::Command::new("ffmpeg")
        .args([
            "-y",
            "-v",
            "error",
            "-f",
            "lavfi",
            "-i",
            "testsrc=duration=12:size=160x120:rate=25",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
        ])
        .arg(&dest)
        .status()
        .expect("ffmpeg must be installed");
    assert!(status.success());
    std::fs::read(dest).unwrap()
}

#[tokio::test]
#[ignore = "requires ffmpeg and ffprobe"]
async fn test_process_video_end_to_end() {
    let work = tempfile::tempdir().unwrap();
    let video = render_test_video(work.path());

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pattern.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(video))
        .mount(&server)
        .await;

    let app = test_app(ApiConfig::default(), Some(Arc::new(FixedScorer(0.9))));
    let response = app
        .router
        .oneshot(process_request(json!({
            "video_url": format!("{}/pattern.mp4", server.uri()),
            "relevancy_score": 0.42
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    // 12s at 5s intervals: two full windows, two frames each
    let frames = body["frames"].as_array().unwrap();
    assert_eq!(frames.len(), 4);
    for frame in frames {
        assert!(frame["frame"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
        assert!(frame["index"].as_u64().unwrap() < 300);
        assert_eq!(frame["label"], "happy");
    }
    let average = body["average_confidence_percentage"].as_f64().unwrap();
    assert!((average - 90.0).abs() < 1e-6);
    assert_eq!(body["confidence_band"], "excellent");
    assert_eq!(body["relevancy_score"], 0.42);
    assert_eq!(std::fs::read_dir(app.scratch.path()).unwrap().count(), 0);
}

#[tokio::test]
#[ignore = "requires ffmpeg and ffprobe"]
async fn test_short_video_has_no_frames() {
    let work = tempfile::tempdir().unwrap();
    let video = render_test_video(work.path());

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pattern.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(video))
        .mount(&server)
        .await;

    let app = test_app(ApiConfig::default(), None);
    let response = app
        .router
        .oneshot(process_request(json!({
            "video_url": format!("{}/pattern.mp4", server.uri()),
            "interval_seconds": 20
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["code"], "no_frames_extracted");
}
