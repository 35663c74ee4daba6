//! HTTP routes and handlers

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        Path, State,
    },
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cropcheck_advisory::DosageRequest;
use cropcheck_classifiers::{rank, LeafClassifier};
use cropcheck_core::{Error, Severity};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, Instrument};
use uuid::Uuid;

use crate::config::{CorsConfig, ServerConfig};
use crate::error::AppError;
use crate::state::AppState;

const SERVICE_NAME: &str = "CropCheck Plant Disease Advisor";

pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/predict", post(predict))
        .route("/dosage", post(dosage))
        .route("/diseases/:label", get(disease))
        .fallback(fallback)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.cors))
                .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allows_any() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let classifier = state.classifier.as_ref().map(|d| d.classifier());

    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "model_loaded": classifier.is_some(),
        "model": state.model_source,
        "classes": state.class_names.len(),
        "input_shape": classifier.map(|c| c.input_shape()),
        "output_shape": classifier.map(|c| c.output_shape()),
    }))
}

async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics_handle {
        Some(handle) => handle.render().into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics exporter not installed\n",
        )
            .into_response(),
    }
}

/// Fields collected from a /predict upload
#[derive(Default)]
struct PredictUpload {
    image: Option<Vec<u8>>,
    area_sqft: Option<String>,
    severity: Option<String>,
}

impl PredictUpload {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut upload = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid upload: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    let bytes = field.bytes().await.map_err(|e| {
                        AppError::BadRequest(format!("Invalid image field: {}", e))
                    })?;
                    upload.image = Some(bytes.to_vec());
                }
                "area_sqft" | "severity" => {
                    let text = field.text().await.map_err(|e| {
                        AppError::BadRequest(format!("Invalid {} field: {}", name, e))
                    })?;
                    if name == "area_sqft" {
                        upload.area_sqft = Some(text);
                    } else {
                        upload.severity = Some(text);
                    }
                }
                other => debug!(field = other, "ignoring unknown upload field"),
            }
        }

        Ok(upload)
    }

    /// Dosage request, validated so a bad area fails before inference
    fn dosage_request(&self) -> Result<Option<DosageRequest>, AppError> {
        let raw = self.area_sqft.as_deref().map(str::trim);
        let Some(raw) = raw.filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        let area_sqft = parse_area(raw)?;
        let severity = self
            .severity
            .as_deref()
            .map(Severity::parse_lenient)
            .unwrap_or_default();

        Ok(Some(DosageRequest {
            area_sqft,
            severity,
        }))
    }
}

fn parse_area(raw: &str) -> Result<f64, AppError> {
    let area: f64 = raw
        .parse()
        .map_err(|_| Error::input(format!("area_sqft must be a number, got '{}'", raw)))?;

    if !area.is_finite() || area <= 0.0 {
        let msg = format!("area_sqft must be a positive number, got {}", raw);
        return Err(Error::input(msg).into());
    }

    Ok(area)
}

/// Classify an uploaded leaf image and return the full recommendation
async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let request_id = Uuid::new_v4();
    metrics::counter!("cropcheck_requests_total", "endpoint" => "predict").increment(1);

    run_prediction(state, multipart)
        .instrument(tracing::info_span!("predict", %request_id))
        .await
}

async fn run_prediction(
    state: AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let dispatcher = state
        .classifier
        .as_ref()
        .ok_or_else(|| Error::unavailable("Model not loaded"))?;

    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let upload = PredictUpload::read(multipart).await?;

    let dosage = upload.dosage_request()?;
    let image = match upload.image {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return Err(Error::input("No image provided").into()),
    };

    info!(stage = "classify", bytes = image.len(), "image received");
    let output = dispatcher.classify(image).await?;
    let ranking = rank(&output.probabilities, state.class_names.as_slice())?;
    let prediction = state.advisor.advise(&ranking, dosage)?;

    info!(
        stage = "respond",
        canonical_key = %prediction.primary_disease.key,
        latency_us = output.latency_us,
        "prediction complete"
    );

    Ok(Json(json!({
        "success": true,
        "prediction": prediction,
    })))
}

#[derive(Debug, Deserialize)]
struct DosageBody {
    disease_name: String,
    area_sqft: f64,
    #[serde(default)]
    severity: Option<String>,
}

/// Pesticide estimate for a named disease
async fn dosage(
    State(state): State<AppState>,
    body: Result<Json<DosageBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    metrics::counter!("cropcheck_requests_total", "endpoint" => "dosage").increment(1);

    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let severity = body
        .severity
        .as_deref()
        .map(Severity::parse_lenient)
        .unwrap_or_default();

    let report = state
        .advisor
        .dosage(&body.disease_name, body.area_sqft, severity)?;

    let Some(estimate) = report.estimate else {
        return Err(AppError::NoPesticideData {
            disease_key: report.disease_key,
        });
    };

    Ok(Json(json!({
        "success": true,
        "disease_key": report.disease_key,
        "area_sqft": report.area_sqft,
        "severity": report.severity,
        "dosage": estimate,
    })))
}

/// Knowledge-base record for any label
async fn disease(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> Json<serde_json::Value> {
    metrics::counter!("cropcheck_requests_total", "endpoint" => "diseases").increment(1);

    let view = state.advisor.describe(&label);
    Json(json!({
        "success": true,
        "key": view.key,
        "curated": view.curated,
        "disease": view.record.as_ref(),
    }))
}

async fn fallback() -> AppError {
    AppError::RouteNotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_area() {
        assert_eq!(parse_area("1000").unwrap(), 1000.0);
        assert_eq!(parse_area("12.5").unwrap(), 12.5);

        for bad in ["0", "-3", "abc", "NaN", "inf"] {
            let err = parse_area(bad).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{}", bad);
        }
    }

    #[test]
    fn test_dosage_request_from_upload() {
        let upload = PredictUpload {
            image: Some(vec![1]),
            area_sqft: Some(" 2000 ".to_string()),
            severity: Some("SEVERE".to_string()),
        };
        let request = upload.dosage_request().unwrap().unwrap();
        assert_eq!(request.area_sqft, 2000.0);
        assert_eq!(request.severity, Severity::Severe);

        let no_area = PredictUpload {
            severity: Some("mild".to_string()),
            ..Default::default()
        };
        assert!(no_area.dosage_request().unwrap().is_none());

        let default_severity = PredictUpload {
            area_sqft: Some("500".to_string()),
            ..Default::default()
        };
        assert_eq!(
            default_severity.dosage_request().unwrap().unwrap().severity,
            Severity::Moderate
        );
    }
}
