use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use api::{router, AppConfig, AppState};
use judge::Pipeline;
use llm::testing::{ScriptedModel, Step};

fn app_with(model: Arc<ScriptedModel>) -> Router {
    router(AppState::new(Pipeline::new(model), AppConfig::default()))
}

fn full_submission() -> Value {
    json!({
        "description": "A todo app",
        "code_snippet": "print('hello')",
        "document": { "name": "report.txt", "data": STANDARD.encode("This app uses a REST API.") },
        "video": { "name": "demo.mp4", "data": STANDARD.encode([0u8, 0, 0, 0x18]) },
        "criteria": [
            { "name": "Originality", "weight": 50 },
            { "name": "Impact", "weight": 50 }
        ]
    })
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_reports_model() {
    let (status, body) = get_json(app_with(Arc::new(ScriptedModel::new())), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "scripted");
}

#[tokio::test]
async fn test_default_rubric_sums_to_100() {
    let (status, body) =
        get_json(app_with(Arc::new(ScriptedModel::new())), "/rubric/default").await;
    assert_eq!(status, StatusCode::OK);

    let criteria = body.as_array().unwrap();
    assert_eq!(criteria.len(), 5);
    let total: u64 = criteria.iter().map(|c| c["weight"].as_u64().unwrap()).sum();
    assert_eq!(total, 100);
}

#[tokio::test]
async fn test_evaluate_returns_report() {
    let model = Arc::new(ScriptedModel::new());
    let (status, body) = post_json(app_with(model.clone()), "/evaluate", full_submission()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["report"].as_str().unwrap().contains("50.0/100.0"));
    assert!(body["digest"].as_str().unwrap().contains("TECHNICAL SUMMARY"));
    assert_eq!(body["trace"].as_array().unwrap().last().unwrap(), "done");
    assert_eq!(model.total_calls(), 3);
}

#[tokio::test]
async fn test_bad_weight_total_is_unprocessable() {
    let model = Arc::new(ScriptedModel::new());
    let mut submission = full_submission();
    submission["criteria"][1]["weight"] = json!(45);

    let (status, body) = post_json(app_with(model.clone()), "/evaluate", submission).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "invalid_weight_total");
    assert!(body["message"].as_str().unwrap().contains("Current sum: 95%"));
    assert_eq!(body["failed_in"], "validating");
    assert_eq!(model.total_calls(), 0);
}

#[tokio::test]
async fn test_missing_video_is_unprocessable() {
    let mut submission = full_submission();
    submission.as_object_mut().unwrap().remove("video");

    let (status, body) =
        post_json(app_with(Arc::new(ScriptedModel::new())), "/evaluate", submission).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "missing_input");
    assert!(body["message"].as_str().unwrap().contains("demo video"));
}

#[tokio::test]
async fn test_bad_base64_is_bad_request() {
    let mut submission = full_submission();
    submission["video"]["data"] = json!("%%% not base64 %%%");

    let (status, body) =
        post_json(app_with(Arc::new(ScriptedModel::new())), "/evaluate", submission).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "bad_upload");
}

#[tokio::test]
async fn test_model_failure_is_bad_gateway_and_counted() {
    let model = Arc::new(ScriptedModel::new().judge_with(Step::Timeout));
    let app = app_with(model);

    let (status, body) = post_json(app.clone(), "/evaluate", full_submission()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "judging_failed");
    assert_eq!(body["failed_in"], "judging");
    assert!(body["digest"].is_string());

    let (_, metrics) = get_json(app, "/metrics").await;
    assert_eq!(metrics["total_runs"], 1);
    assert_eq!(metrics["aborted_runs"], 1);
    assert_eq!(metrics["aborted_by_kind"]["judging_failed"], 1);
}
