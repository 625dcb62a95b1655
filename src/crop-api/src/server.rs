use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use log::{error, info};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crop_serve::{
    recommend_crop, recommend_fertilizer, AdvisoryClient, CropFeatures, DiseaseClassifier,
    FertilizerFeatures, ASSISTANT_FALLBACK, DISEASE_FALLBACK,
};

/// Uploads above this size are rejected outright.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub struct AppState {
    pub classifier: Arc<DiseaseClassifier>,
    pub advisor: Option<AdvisoryClient>,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/test", get(test_endpoint))
        .route("/api/detect", post(detect))
        .route("/api/recommend-crop", post(crop_recommendation))
        .route("/api/recommend-fertilizer", post(fertilizer_recommendation))
        .route("/api/ask-assistant", post(ask_assistant))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn home() -> &'static str {
    info!("Home endpoint was reached.");

    "Welcome to the Crop Disease Detection API! Use the /api/detect endpoint to make predictions."
}

async fn test_endpoint() -> &'static str {
    "Test endpoint is working!"
}

#[derive(Serialize)]
struct DetectResponse {
    disease: String,
    confidence: f32,
    gemini_details: String,
}

async fn detect(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    info!("Received request at /api/detect");

    let Ok(mut multipart) = multipart else {
        return err_json(StatusCode::BAD_REQUEST, "No image file found in request");
    };

    let data = match image_field(&mut multipart).await {
        Ok(Some(data)) => data,
        Ok(None) => {
            return err_json(StatusCode::BAD_REQUEST, "No image file found in request");
        }
        Err(e) => {
            error!("Error reading upload: {}", e);
            return err_json(StatusCode::BAD_REQUEST, "Could not read the uploaded image");
        }
    };

    let classifier = state.classifier.clone();
    let prediction = match tokio::task::spawn_blocking(move || classifier.classify(&data)).await {
        Ok(Ok(prediction)) => prediction,
        Ok(Err(e)) => {
            error!("Error during prediction: {}", e);
            return err_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
        Err(e) => {
            error!("Classification task failed: {}", e);
            return err_json(StatusCode::INTERNAL_SERVER_ERROR, "Classification task failed");
        }
    };

    let gemini_details = match &state.advisor {
        Some(advisor) => advisor.disease_advisory(&prediction.label).await,
        None => DISEASE_FALLBACK.to_owned(),
    };

    info!(
        "Prediction result: {} ({}%)",
        prediction.label, prediction.confidence
    );

    Json(DetectResponse {
        disease: prediction.label,
        confidence: prediction.confidence,
        gemini_details,
    })
    .into_response()
}

/// Bytes of the multipart field named `image`. A missing field is `Ok(None)`,
/// a field that cannot be read is an error.
async fn image_field(multipart: &mut Multipart) -> Result<Option<Bytes>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("image") {
            return Ok(Some(field.bytes().await?));
        }
    }

    Ok(None)
}

async fn crop_recommendation(body: Bytes) -> Response {
    let Some(data) = parse_payload(&body) else {
        return err_json(StatusCode::BAD_REQUEST, "No data provided");
    };

    let features: CropFeatures = match serde_json::from_value(data) {
        Ok(features) => features,
        Err(_) => return err_json(StatusCode::BAD_REQUEST, "Invalid or incomplete input data."),
    };

    Json(json!({ "recommendation": recommend_crop(&features) })).into_response()
}

async fn fertilizer_recommendation(body: Bytes) -> Response {
    let Some(data) = parse_payload(&body) else {
        return err_json(StatusCode::BAD_REQUEST, "No data provided");
    };

    let features: FertilizerFeatures = match serde_json::from_value(data) {
        Ok(features) => features,
        Err(_) => return err_json(StatusCode::BAD_REQUEST, "Invalid or incomplete input data."),
    };

    Json(json!({ "recommendation": recommend_fertilizer(&features) })).into_response()
}

async fn ask_assistant(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let Some(data) = parse_payload(&body) else {
        return err_json(StatusCode::BAD_REQUEST, "No question provided");
    };
    let Some(question) = data.get("question") else {
        return err_json(StatusCode::BAD_REQUEST, "No question provided");
    };

    let question = match question {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let answer = match &state.advisor {
        Some(advisor) => advisor.assistant_answer(&question).await,
        None => ASSISTANT_FALLBACK.to_owned(),
    };

    Json(json!({ "answer": answer })).into_response()
}

/// Body as a JSON value, unless it is unparseable or empty in spirit.
fn parse_payload(body: &[u8]) -> Option<Value> {
    let value: Value = serde_json::from_slice(body).ok()?;

    if is_falsy(&value) {
        None
    } else {
        Some(value)
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn err_json(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
