use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use gh_client::Credential;
use runner::{RunRequest, RunStatus, Runner};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct ApiState {
    pub runner: Arc<Runner>,
}

pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/runs", post(trigger_run))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// No Debug derive: the token must never reach log output.
#[derive(Deserialize)]
struct RunBody {
    owner: String,
    repo: String,
    #[serde(default)]
    token: String,
}

#[derive(Serialize)]
struct RunResponse {
    status: &'static str,
    output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[instrument(skip_all, fields(owner = %body.owner, repo = %body.repo))]
async fn trigger_run(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<RunBody>,
) -> Json<RunResponse> {
    let report = state
        .runner
        .run(RunRequest {
            owner: body.owner,
            repo: body.repo,
            credential: Credential::new(body.token),
        })
        .await;

    let status = match report.status {
        RunStatus::Succeeded => "success",
        RunStatus::Failed | RunStatus::TimedOut => "failure",
    };
    Json(RunResponse {
        status,
        output: report.output,
        error: report.error,
    })
}

#[instrument]
async fn metrics() -> ApiResult<impl IntoResponse> {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    let content_type = encoder.format_type().to_string();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok((
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, content_type)],
        buffer,
    ))
}
