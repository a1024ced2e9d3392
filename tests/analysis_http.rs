use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use posecoach::analysis::{AnalysisClient, AnalysisTransport, AnalyzeRequest, HttpTransport};
use posecoach::config::AnalysisConfig;
use posecoach::error::AnalysisError;
use posecoach::frame::{encode_data_url, FrameSample};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral port and return the analyze endpoint URL
async fn spawn_stub(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/analyze_pose", addr)
}

fn analysis_config(endpoint: String) -> AnalysisConfig {
    AnalysisConfig {
        endpoint,
        timeout_ms: 2000,
        image_mime: "image/jpeg".to_string(),
    }
}

fn request() -> AnalyzeRequest {
    AnalyzeRequest {
        frame: encode_data_url("image/jpeg", &[0xFF, 0xD8, 0xFF, 0xD9]),
        pose: "Tree Pose".to_string(),
    }
}

#[tokio::test]
async fn test_posts_frame_and_pose() {
    let app = Router::new().route(
        "/analyze_pose",
        post(|Json(body): Json<Value>| async move {
            let frame = body["frame"].as_str().unwrap_or_default();
            let pose = body["pose"].as_str().unwrap_or_default();
            let ok = frame.starts_with("data:image/jpeg;base64,") && pose == "Tree Pose";
            Json(json!({
                "isCorrect": ok,
                "feedback": ["Raise your arms above your head"],
                "frameWithLandmarks": encode_data_url("image/jpeg", &[1, 2, 3]),
            }))
        }),
    );
    let endpoint = spawn_stub(app).await;

    let transport = HttpTransport::new(&analysis_config(endpoint)).unwrap();
    let response = transport.post_analyze(&request()).await.unwrap();

    assert!(response.is_correct);
    assert_eq!(response.feedback, vec!["Raise your arms above your head"]);
    assert!(response.frame_with_landmarks.is_some());
}

#[tokio::test]
async fn test_empty_object_gets_defaults() {
    let app = Router::new().route("/analyze_pose", post(|| async { Json(json!({})) }));
    let endpoint = spawn_stub(app).await;
    let config = analysis_config(endpoint);

    let transport = HttpTransport::new(&config).unwrap();
    let client = AnalysisClient::new(Arc::new(transport), &config);

    let frame = FrameSample::new(1, vec![0xFF, 0xD8, 0xFF, 0xD9]);
    let result = client.analyze(&frame, "Tree Pose").await.unwrap();

    assert!(!result.is_correct);
    assert!(result.feedback_items.is_empty());
    assert!(result.annotated_image.is_none());
}

#[tokio::test]
async fn test_server_error_is_status_failure() {
    let app = Router::new().route(
        "/analyze_pose",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model crashed").into_response() }),
    );
    let endpoint = spawn_stub(app).await;
    let config = analysis_config(endpoint);

    let transport = HttpTransport::new(&config).unwrap();
    match transport.post_analyze(&request()).await {
        Err(AnalysisError::Status { status }) => assert_eq!(status, 500),
        other => panic!("Expected status error, got {:?}", other),
    }

    let client = AnalysisClient::new(Arc::new(transport), &config);
    let frame = FrameSample::new(7, vec![0]);
    assert!(client.analyze(&frame, "Tree Pose").await.is_none());
}

#[tokio::test]
async fn test_non_object_body_is_decode_failure() {
    let app = Router::new().route("/analyze_pose", post(|| async { Json(json!([1, 2, 3])) }));
    let endpoint = spawn_stub(app).await;

    let transport = HttpTransport::new(&analysis_config(endpoint)).unwrap();
    assert!(matches!(
        transport.post_analyze(&request()).await,
        Err(AnalysisError::Decode { .. })
    ));
}

#[tokio::test]
async fn test_unreachable_service_is_no_result() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = analysis_config(format!("http://{}/analyze_pose", addr));
    let transport = HttpTransport::new(&config).unwrap();
    let client = AnalysisClient::new(Arc::new(transport), &config);

    let frame = FrameSample::new(1, vec![0]);
    assert!(client.analyze(&frame, "Tree Pose").await.is_none());
}
