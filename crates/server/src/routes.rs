use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::error;

use cloudwarden_agent::AuditOrchestrator;
use cloudwarden_core::audit::{DomainAuditor, RunMode, report_or_error};
use cloudwarden_core::domain::{Domain, DomainReport, RouterDecision};

#[derive(Clone)]
pub struct AppState {
    pub compute: Arc<dyn DomainAuditor>,
    pub storage: Arc<dyn DomainAuditor>,
    pub keys: Arc<dyn DomainAuditor>,
    pub orchestrator: Arc<AuditOrchestrator>,
    pub dry_run: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ec2", get(ec2_audit))
        .route("/s3", get(s3_audit))
        .route("/kms", get(kms_audit))
        .route("/ec2/state", get(ec2_state))
        .route("/s3/state", get(s3_state))
        .route("/kms/state", get(kms_state))
        .route("/chat", get(chat))
        .route("/router/debug", post(router_debug))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    pub service: &'static str,
    pub result: DomainReport,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub service: &'static str,
    pub state: DomainReport,
}

#[derive(Debug, Deserialize)]
pub struct ChatParams {
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default = "default_use_ai")]
    pub use_ai: bool,
}

fn default_prompt() -> String {
    "Audit my cloud resources".to_string()
}

fn default_use_ai() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub status: &'static str,
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct RouterDebugRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct RouterDebugResponse {
    pub prompt: String,
    pub router_decision: RouterDecision,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub dry_run: bool,
    pub checked_at: String,
}

async fn run_domain(auditor: &dyn DomainAuditor, mode: RunMode) -> DomainReport {
    report_or_error(auditor.run(mode).await)
}

pub async fn ec2_audit(State(state): State<AppState>) -> Json<ServiceResponse> {
    let result = run_domain(state.compute.as_ref(), RunMode::Remediate).await;
    Json(ServiceResponse { service: Domain::Compute.service_name(), result })
}

pub async fn s3_audit(State(state): State<AppState>) -> Json<ServiceResponse> {
    let result = run_domain(state.storage.as_ref(), RunMode::Remediate).await;
    Json(ServiceResponse { service: Domain::Storage.service_name(), result })
}

pub async fn kms_audit(State(state): State<AppState>) -> Json<ServiceResponse> {
    let result = run_domain(state.keys.as_ref(), RunMode::Remediate).await;
    Json(ServiceResponse { service: Domain::KeyManagement.service_name(), result })
}

pub async fn ec2_state(State(state): State<AppState>) -> Json<StateResponse> {
    let report = run_domain(state.compute.as_ref(), RunMode::Inspect).await;
    Json(StateResponse { service: Domain::Compute.service_name(), state: report })
}

pub async fn s3_state(State(state): State<AppState>) -> Json<StateResponse> {
    let report = run_domain(state.storage.as_ref(), RunMode::Inspect).await;
    Json(StateResponse { service: Domain::Storage.service_name(), state: report })
}

pub async fn kms_state(State(state): State<AppState>) -> Json<StateResponse> {
    let report = run_domain(state.keys.as_ref(), RunMode::Inspect).await;
    Json(StateResponse { service: Domain::KeyManagement.service_name(), state: report })
}

pub async fn chat(
    State(state): State<AppState>,
    Query(params): Query<ChatParams>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.orchestrator.run_audit(&params.prompt, params.use_ai).await {
        Ok(run) => Ok(Json(ChatResponse { status: "success", summary: run.summary })),
        Err(error) => {
            error!(
                event_name = "http.chat.summarize_failed",
                error = %error,
                "audit ran but summary generation failed"
            );
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse { status: "error", error: error.to_string() }),
            ))
        }
    }
}

pub async fn router_debug(
    State(state): State<AppState>,
    Json(request): Json<RouterDebugRequest>,
) -> Json<RouterDebugResponse> {
    let decision = state.orchestrator.router().decide(&request.prompt).await;
    Json(RouterDebugResponse { prompt: request.prompt, router_decision: decision })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ready",
        dry_run: state.dry_run,
        checked_at: Utc::now().to_rfc3339(),
    })
}
