use std::time::Duration;

use poise_ml_client::{EmotionClient, EmotionOutcome, EmotionScorer, MlClientConfig, MlError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, max_retries: u32) -> EmotionClient {
    EmotionClient::new(MlClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        max_retries,
    })
    .unwrap()
}

#[tokio::test]
async fn test_classify_detected_percentage_scale() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .and(body_partial_json(json!({"image": "aGVsbG8=", "format": "jpeg"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "face_detected": true,
            "label": "happy",
            "confidence": 92.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client_for(&server, 0)
        .classify("aGVsbG8=", "jpeg")
        .await
        .unwrap();

    match outcome {
        EmotionOutcome::Detected { label, confidence } => {
            assert_eq!(label, "happy");
            assert!((confidence - 0.92).abs() < 1e-9);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_classify_no_face() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"face_detected": false})))
        .mount(&server)
        .await;

    let outcome = client_for(&server, 0).classify("eA==", "png").await.unwrap();
    assert_eq!(outcome, EmotionOutcome::NoSubjectDetected);
}

#[tokio::test]
async fn test_classify_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = client_for(&server, 2)
        .classify("eA==", "jpeg")
        .await
        .unwrap_err();
    assert!(matches!(err, MlError::ServiceUnavailable(_)));
}

#[tokio::test]
async fn test_classify_client_error_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad image"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, 2)
        .classify("eA==", "jpeg")
        .await
        .unwrap_err();
    assert!(matches!(err, MlError::RequestFailed(_)));
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    assert!(client_for(&server, 0).health_check().await.unwrap());
}

#[tokio::test]
async fn test_health_check_unreachable_is_false() {
    let client = EmotionClient::new(MlClientConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout: Duration::from_secs(1),
        max_retries: 0,
    })
    .unwrap();
    assert!(!client.health_check().await.unwrap());
}
