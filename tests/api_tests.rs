//! Integration tests for the diagnosis HTTP API
//!
//! A stub predictor is injected through `ModelManager::with_predictor`,
//! so no ONNX model file is needed.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::Engine;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method
use xray_diagnosis::{
    image::XrayTensor,
    models::{ModelManager, Predictor},
    web::{create_app, AppState},
    Config, PredictionVector, Result, DISEASE_LABELS,
};

const BOUNDARY: &str = "xray-test-boundary";

/// Test helper: predictor that always returns the same vector
struct FixedPredictor([f32; 15]);

impl Predictor for FixedPredictor {
    fn predict(&self, _tensor: &XrayTensor) -> Result<PredictionVector> {
        PredictionVector::new(self.0)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

fn test_config() -> Config {
    Config::new(
        "127.0.0.1:0".into(),
        "/nonexistent/xray_model.onnx",
        Some(1),
        false,
        false,
    )
    .expect("Should build config")
}

fn setup_app(values: [f32; 15]) -> Router {
    let models = ModelManager::with_predictor(test_config(), Arc::new(FixedPredictor(values)));
    create_app(AppState::new(test_config(), Arc::new(models)))
}

/// Test helper: app whose model file does not exist
fn setup_app_without_model() -> Router {
    let models = ModelManager::new(test_config());
    create_app(AppState::new(test_config(), Arc::new(models)))
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("Should encode PNG");
    buffer.into_inner()
}

fn multipart_request(uri: &str, field: &str, payload: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"xray.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, json: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn extract_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body")
        .to_vec()
}

async fn extract_json(body: Body) -> Value {
    serde_json::from_slice(&extract_bytes(body).await).expect("Should parse JSON")
}

// =============================================================================
// System endpoints
// =============================================================================

#[tokio::test]
async fn test_health_with_loaded_model() {
    let app = setup_app([0.0; 15]);

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_health_without_model_is_unavailable() {
    let app = setup_app_without_model();

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "MODEL_LOAD_ERROR");
}

#[tokio::test]
async fn test_info_lists_labels_in_order() {
    let app = setup_app([0.0; 15]);

    let response = app.oneshot(get_request("/api/info")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let labels: Vec<&str> = body["labels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(labels, DISEASE_LABELS.to_vec());
    assert_eq!(body["model"]["loaded"], true);
    assert_eq!(body["thresholds"]["high"], 60.0);
}

#[tokio::test]
async fn test_index_page() {
    let app = setup_app([0.0; 15]);

    let response = app.oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = String::from_utf8(extract_bytes(response.into_body()).await).unwrap();
    assert!(html.contains("action=\"/diagnose/view\""));
    assert!(html.contains("accept=\".jpg,.jpeg,.png\""));
}

// =============================================================================
// Diagnosis endpoints
// =============================================================================

#[tokio::test]
async fn test_upload_all_zero_predictions() {
    let app = setup_app([0.0; 15]);

    let response = app
        .oneshot(multipart_request("/diagnose/upload", "file", &png_bytes(100, 50)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);

    let findings = body["data"]["findings"].as_array().unwrap();
    assert_eq!(findings.len(), 15);
    for (finding, label) in findings.iter().zip(DISEASE_LABELS.iter()) {
        assert_eq!(finding["label"], *label);
        assert_eq!(finding["tier"], "low");
        assert_eq!(finding["color"], "#5bc0de");
        assert_eq!(finding["display"], "0.00");
    }
    assert_eq!(body["data"]["image"]["width"], 100);
    assert_eq!(body["data"]["image"]["height"], 50);
}

#[tokio::test]
async fn test_upload_tier_boundaries() {
    let mut values = [0.0; 15];
    values[0] = 0.600000;
    values[1] = 0.600001;
    values[2] = 0.300000;
    values[3] = 0.300001;
    let app = setup_app(values);

    let response = app
        .oneshot(multipart_request("/diagnose/upload", "file", &png_bytes(8, 8)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let findings = &body["data"]["findings"];
    assert_eq!(findings[0]["tier"], "medium");
    assert_eq!(findings[0]["color"], "#f0ad4e");
    assert_eq!(findings[1]["tier"], "high");
    assert_eq!(findings[1]["color"], "#d9534f");
    assert_eq!(findings[2]["tier"], "low");
    assert_eq!(findings[3]["tier"], "medium");
    assert_eq!(body["data"]["summary"]["top_label"], "Cardiomegaly");
}

#[tokio::test]
async fn test_upload_non_image_is_decode_error() {
    let app = setup_app([0.0; 15]);

    let response = app
        .oneshot(multipart_request(
            "/diagnose/upload",
            "file",
            b"this is not an image at all",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "IMAGE_DECODE_ERROR");
    assert_eq!(body["error"]["message"], "could not process image");
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = setup_app([0.0; 15]);

    let response = app
        .oneshot(multipart_request("/diagnose/upload", "attachment", &png_bytes(4, 4)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_upload_without_model_is_unavailable() {
    let app = setup_app_without_model();

    let response = app
        .oneshot(multipart_request("/diagnose/upload", "file", &png_bytes(16, 16)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_json_base64_request() {
    let mut values = [0.1; 15];
    values[14] = 0.95;
    let app = setup_app(values);

    let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(32, 32));
    let request = Request::builder()
        .method("POST")
        .uri("/diagnose")
        .header("content-type", "application/json")
        .header("X-Request-ID", "req-42")
        .body(Body::from(
            serde_json::json!({ "image": format!("data:image/png;base64,{encoded}") }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["request_id"], "req-42");
    assert_eq!(body["data"]["findings"][14]["label"], "No Finding");
    assert_eq!(body["data"]["findings"][14]["tier"], "high");
    assert_eq!(body["data"]["summary"]["high_count"], 1);
}

#[tokio::test]
async fn test_json_empty_image_rejected() {
    let app = setup_app([0.0; 15]);

    let response = app
        .oneshot(json_request("/diagnose", serde_json::json!({ "image": "" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_view_renders_bars() {
    let mut values = [0.0; 15];
    values[12] = 0.45;
    let app = setup_app(values);

    let response = app
        .oneshot(multipart_request("/diagnose/view", "file", &png_bytes(20, 20)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = String::from_utf8(extract_bytes(response.into_body()).await).unwrap();
    assert_eq!(html.matches("class=\"bar-container\"").count(), 15);
    assert!(html.contains("Pneumonia: <span style=\"color:#f0ad4e\">45.00%</span>"));
    assert!(html.contains("Atelectasis: <span style=\"color:#5bc0de\">0.00%</span>"));

    let preview = html.find("<img src=\"data:image/png;base64,").expect("Should embed preview");
    assert!(html.contains("Uploaded image"));
    assert!(preview < html.find("class=\"bar-container\"").unwrap());
}

#[tokio::test]
async fn test_view_renders_error_page() {
    let app = setup_app([0.0; 15]);

    let response = app
        .oneshot(multipart_request("/diagnose/view", "file", b"garbage"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let html = String::from_utf8(extract_bytes(response.into_body()).await).unwrap();
    assert!(html.contains("could not process image"));
}
