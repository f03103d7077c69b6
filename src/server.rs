//! HTTP boundary for the prediction service.
//!
//! Exposes a liveness endpoint and the prediction endpoint, and owns the
//! two-state serving model: the startup load either yields a Ready state
//! with a usable classifier or a Degraded state that answers every
//! prediction with "unavailable" until the process is restarted.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::{Config, ModelConfig};
use crate::error::{DermascanError, Result};
use crate::inference::{Classifier, Device, Variant};
use crate::labels::ClassLabels;
use crate::preprocess;

/// Static payload returned by the liveness endpoint.
pub const WELCOME_MESSAGE: &str = "Welcome to the dermascan prediction API!";

/// Outcome of the startup model load, fixed for the process lifetime.
pub enum ModelState {
    /// Model loaded; `/predict` serves predictions.
    Ready(Classifier),
    /// Load failed for the recorded reason; `/predict` reports the service
    /// unavailable until a restart.
    Degraded(String),
}

/// Shared request-handler state.
#[derive(Clone)]
pub struct AppState {
    model: Arc<ModelState>,
}

impl AppState {
    /// Wrap a boot outcome for injection into the router.
    pub fn new(model: ModelState) -> Self {
        Self {
            model: Arc::new(model),
        }
    }
}

/// Successful prediction payload.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Predicted disease label.
    pub disease: String,
    /// Probability mass assigned to the predicted class, in [0,1].
    pub confidence: f32,
}

/// Attempt the startup model load.
///
/// A failure does not abort the process: the outcome is captured as a
/// Degraded state so the liveness endpoint stays up for operational
/// inspection, and every load step is logged.
pub fn boot(config: &ModelConfig) -> ModelState {
    match try_load(config) {
        Ok(classifier) => {
            info!("Model loaded; service ready");
            ModelState::Ready(classifier)
        }
        Err(e) => {
            error!("Model load failed: {}", e);
            error!("Serving degraded: /predict is unavailable until the process restarts");
            ModelState::Degraded(e.to_string())
        }
    }
}

fn try_load(config: &ModelConfig) -> Result<Classifier> {
    let device: Device = config.device.parse()?;
    let variant: Variant = config.variant.parse()?;
    let labels = ClassLabels::default();

    info!(
        "Initializing EfficientNet-{} with {} output classes",
        variant,
        labels.len()
    );
    info!("Loading weights from '{}'", config.weights_path);
    let classifier = Classifier::load(&config.weights_path, variant, &device, labels)?;
    info!("Model bound to device '{}'", device);
    Ok(classifier)
}

/// Build the service router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/predict", post(predict))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind the configured address and serve requests until shutdown.
pub async fn serve(config: &Config, state: AppState) -> Result<()> {
    let app = router(state, config.server.max_upload_bytes);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| DermascanError::config(format!("invalid bind address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Liveness endpoint; succeeds regardless of model state.
async fn welcome() -> Json<serde_json::Value> {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

/// Prediction endpoint: multipart image upload in, label plus confidence out.
async fn predict(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> std::result::Result<Json<PredictResponse>, DermascanError> {
    let classifier = match state.model.as_ref() {
        ModelState::Ready(classifier) => classifier,
        ModelState::Degraded(_) => {
            return Err(DermascanError::unavailable(
                "model is not loaded or failed to load; check the server logs",
            ))
        }
    };

    let (filename, bytes) = read_upload(&mut multipart).await?;
    let tensor = preprocess::image_to_tensor(&bytes)?;
    let prediction = classifier.predict(&tensor)?;

    info!(
        "Prediction for '{}': {} (confidence {:.4})",
        filename, prediction.label, prediction.confidence
    );

    Ok(Json(PredictResponse {
        disease: prediction.label,
        confidence: prediction.confidence,
    }))
}

/// Pull the uploaded file out of the multipart body.
///
/// Accepts the `file` field or, failing that, the first field carrying a
/// filename.
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Bytes)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DermascanError::invalid_request(format!("malformed multipart body: {}", e)))?
    {
        if field.name() == Some("file") || field.file_name().is_some() {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await.map_err(|e| {
                DermascanError::invalid_request(format!("failed to read upload: {}", e))
            })?;
            return Ok((filename, bytes));
        }
    }
    Err(DermascanError::invalid_request("no file field in multipart body"))
}

impl IntoResponse for DermascanError {
    fn into_response(self) -> Response {
        let status = match &self {
            DermascanError::InvalidImage(_) | DermascanError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
