use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use ingest::DocumentArtifact;
use judge::{
    default_criteria, AbortedRun, Criterion, Digest, EvaluationOutcome, Pipeline, RunState,
    SubmissionInput, VideoArtifact,
};

use crate::config::AppConfig;
use crate::metrics::{Metrics, MetricsSnapshot, TimedOperation};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub metrics: Arc<Metrics>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(pipeline: Pipeline, config: AppConfig) -> Self {
        Self {
            pipeline: pipeline.with_scoring(config.scoring),
            metrics: Metrics::new(),
            config,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/rubric/default", get(default_rubric))
        .route("/evaluate", post(evaluate))
        .route("/metrics", get(get_metrics))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model: String,
}

/// A file uploaded inline as standard base64.
#[derive(Debug, Deserialize)]
pub struct UploadedFile {
    #[serde(default)]
    pub name: Option<String>,
    pub data: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EvaluateRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub code_snippet: Option<String>,
    #[serde(default)]
    pub document: Option<UploadedFile>,
    #[serde(default)]
    pub video: Option<UploadedFile>,
    /// Falls back to the default rubric when omitted.
    #[serde(default)]
    pub criteria: Option<Vec<Criterion>>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_in: Option<RunState>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<RunState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
}

enum ApiError {
    BadUpload(String),
    Aborted(AbortedRun),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadUpload(message) => {
                let body = ErrorResponse {
                    run_id: None,
                    kind: "bad_upload".to_string(),
                    message,
                    failed_in: None,
                    trace: Vec::new(),
                    warning: None,
                    digest: None,
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::Aborted(aborted) => {
                let kind = aborted.error.kind();
                let status = if kind.is_input_error() {
                    StatusCode::UNPROCESSABLE_ENTITY
                } else {
                    StatusCode::BAD_GATEWAY
                };
                let body = ErrorResponse {
                    run_id: Some(aborted.run_id),
                    kind: kind.as_str().to_string(),
                    message: aborted.error.user_message(),
                    failed_in: Some(aborted.failed_in),
                    trace: aborted.trace,
                    warning: aborted.warning,
                    digest: aborted.digest,
                };
                (status, Json(body)).into_response()
            }
        }
    }
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.pipeline.model_name().to_string(),
    })
}

async fn default_rubric() -> Json<Vec<Criterion>> {
    Json(default_criteria())
}

async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

fn decode_upload(field: &str, upload: &UploadedFile) -> Result<Vec<u8>, ApiError> {
    STANDARD
        .decode(upload.data.trim())
        .map_err(|e| ApiError::BadUpload(format!("{field} is not valid base64: {e}")))
}

impl EvaluateRequest {
    fn into_input(self) -> Result<(SubmissionInput, Vec<Criterion>), ApiError> {
        let document = match &self.document {
            Some(upload) => {
                let bytes = decode_upload("document", upload)?;
                let name = upload.name.clone().unwrap_or_else(|| "document".to_string());
                Some(DocumentArtifact::new(name, bytes))
            }
            None => None,
        };

        let video = match &self.video {
            Some(upload) => {
                let bytes = decode_upload("video", upload)?;
                Some(VideoArtifact::new(upload.name.clone(), bytes))
            }
            None => None,
        };

        let input = SubmissionInput {
            description: self.description,
            code_snippet: self.code_snippet,
            document,
            video,
        };
        let criteria = self.criteria.unwrap_or_else(default_criteria);
        Ok((input, criteria))
    }
}

async fn evaluate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluationOutcome>, ApiError> {
    let (input, criteria) = req.into_input()?;

    let timer = TimedOperation::start();
    match state.pipeline.evaluate(input, &criteria).await {
        Ok(outcome) => {
            state.metrics.record_completed(timer.elapsed());
            tracing::info!(
                run_id = %outcome.run_id,
                elapsed_ms = timer.elapsed().as_millis() as u64,
                "Evaluation completed"
            );
            Ok(Json(outcome))
        }
        Err(aborted) => {
            state
                .metrics
                .record_aborted(timer.elapsed(), aborted.error.kind());
            Err(ApiError::Aborted(aborted))
        }
    }
}
