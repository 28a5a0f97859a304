//! Prometheus metrics for the API server.

use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "poise_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "poise_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "poise_http_requests_in_flight";

    // Analysis metrics
    pub const ANALYSES_TOTAL: &str = "poise_analyses_total";
    pub const ANALYSIS_DURATION_SECONDS: &str = "poise_analysis_duration_seconds";
    pub const DOWNLOAD_DURATION_SECONDS: &str = "poise_download_duration_seconds";
    pub const FRAMES_SAMPLED_TOTAL: &str = "poise_frames_sampled_total";
    pub const FRAMES_DECODED_TOTAL: &str = "poise_frames_decoded_total";
    pub const FRAME_DECODE_FAILURES_TOTAL: &str = "poise_frame_decode_failures_total";
    pub const FRAMES_SCORED_TOTAL: &str = "poise_frames_scored_total";
    pub const SCORING_FAILURES_TOTAL: &str = "poise_scoring_failures_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "poise_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a finished analysis; `outcome` is "ok" or an error code.
pub fn record_analysis(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::ANALYSES_TOTAL, &labels).increment(1);
    histogram!(names::ANALYSIS_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record how long fetching a source video took.
pub fn record_download_duration(source: &str, duration_secs: f64) {
    let labels = [("source", source.to_string())];
    histogram!(names::DOWNLOAD_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_frames_sampled(count: usize) {
    counter!(names::FRAMES_SAMPLED_TOTAL).increment(count as u64);
}

pub fn record_frame_decoded() {
    counter!(names::FRAMES_DECODED_TOTAL).increment(1);
}

pub fn record_frame_decode_failure() {
    counter!(names::FRAME_DECODE_FAILURES_TOTAL).increment(1);
}

/// Record a classified frame; `label` is the emotion, or "none" when no face was found.
pub fn record_frame_scored(label: &str) {
    let labels = [("label", label.to_string())];
    counter!(names::FRAMES_SCORED_TOTAL, &labels).increment(1);
}

pub fn record_scoring_failure() {
    counter!(names::SCORING_FAILURES_TOTAL).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

fn uuid_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
            .expect("valid regex")
    })
}

fn numeric_segment_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r"/[0-9]+(/|$)").expect("valid regex")
    })
}

/// Sanitize path for metrics labels (remove IDs, collapse unknown routes).
fn sanitize_path(path: &str) -> String {
    const KNOWN: [&str; 5] = ["/process-video", "/health", "/healthz", "/ready", "/metrics"];
    if KNOWN.contains(&path) {
        return path.to_string();
    }

    let path = uuid_pattern().replace_all(path, ":id");
    let path = numeric_segment_pattern().replace_all(&path, "/:id$1");
    if path.len() > 64 {
        return "/:other".to_string();
    }
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    // Increment in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    // Decrement in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
