//! End-to-end tests for the HTTP boundary.
//!
//! The Ready path uses a zero-initialized classifier: every logit comes out
//! zero, so the softmax is uniform over the label set and the argmax
//! tie-break lands on the first label. That exercises the whole
//! upload/preprocess/forward/postprocess path without a weights fixture.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use candle_core::{DType, Device as CandleDevice};
use candle_nn::VarBuilder;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use tower::ServiceExt;

use dermascan::config::ModelConfig;
use dermascan::inference::{Classifier, Variant};
use dermascan::labels::{ClassLabels, CLASS_NAMES};
use dermascan::server::{boot, router, AppState, ModelState, WELCOME_MESSAGE};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const BOUNDARY: &str = "dermascan-test-boundary";

fn degraded_app() -> Router {
    let state = AppState::new(ModelState::Degraded(
        "File not found: weights.safetensors".to_string(),
    ));
    router(state, MAX_UPLOAD_BYTES)
}

fn ready_app() -> Router {
    let vb = VarBuilder::zeros(DType::F32, &CandleDevice::Cpu);
    let classifier = Classifier::from_var_builder(
        vb,
        Variant::B0,
        CandleDevice::Cpu,
        ClassLabels::default(),
    )
    .expect("zero-initialized classifier should build");
    router(AppState::new(ModelState::Ready(classifier)), MAX_UPLOAD_BYTES)
}

fn multipart_request(filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn encode(image: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn welcome_succeeds_regardless_of_model_state() {
    for app in [degraded_app(), ready_app()] {
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], WELCOME_MESSAGE);
    }
}

#[tokio::test]
async fn degraded_predict_reports_unavailable() {
    let png = encode(RgbImage::from_pixel(64, 64, Rgb([90, 50, 50])), ImageFormat::Png);
    let response = degraded_app()
        .oneshot(multipart_request("lesion.png", &png))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("Model unavailable"), "detail: {detail}");
}

#[tokio::test]
async fn boot_with_missing_weights_degrades() {
    let config = ModelConfig {
        weights_path: "/no/such/weights.safetensors".to_string(),
        variant: "b0".to_string(),
        device: "cpu".to_string(),
    };
    let state = boot(&config);
    assert!(matches!(state, ModelState::Degraded(_)));

    let app = router(AppState::new(state), MAX_UPLOAD_BYTES);
    let png = encode(RgbImage::from_pixel(32, 32, Rgb([0, 0, 0])), ImageFormat::Png);
    let response = app
        .oneshot(multipart_request("any.png", &png))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn predict_classifies_jpeg_upload() {
    let jpeg = encode(
        RgbImage::from_fn(512, 512, |x, y| Rgb([x as u8, y as u8, 128])),
        ImageFormat::Jpeg,
    );
    let response = ready_app()
        .oneshot(multipart_request("lesion.jpg", &jpeg))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    let disease = body["disease"].as_str().unwrap();
    assert!(CLASS_NAMES.contains(&disease), "unknown label: {disease}");

    let confidence = body["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence), "confidence: {confidence}");
}

#[tokio::test]
async fn zero_weights_yield_uniform_distribution_and_first_label() {
    // All logits are zero, so softmax is uniform and the tie-break picks
    // output index 0.
    let png = encode(RgbImage::from_pixel(224, 224, Rgb([120, 80, 60])), ImageFormat::Png);
    let response = ready_app()
        .oneshot(multipart_request("lesion.png", &png))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["disease"], CLASS_NAMES[0]);

    let confidence = body["confidence"].as_f64().unwrap();
    let uniform = 1.0 / CLASS_NAMES.len() as f64;
    assert!(
        (confidence - uniform).abs() < 1e-4,
        "confidence {confidence} not uniform"
    );
}

#[tokio::test]
async fn text_upload_with_image_extension_is_rejected() {
    let response = ready_app()
        .oneshot(multipart_request("renamed.jpg", b"definitely not an image"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("Invalid image file"), "detail: {detail}");
}

#[tokio::test]
async fn missing_file_field_is_rejected() {
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"comment\"\r\n\r\nhello\r\n--{BOUNDARY}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = ready_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("Invalid request"), "detail: {detail}");
    assert!(!detail.contains("Invalid image"), "detail: {detail}");
}
