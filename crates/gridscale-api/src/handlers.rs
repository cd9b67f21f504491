//! REST API handlers.
//!
//! Each handler reads/writes via `PolicyStore` (or the scaling target
//! for service info) and returns JSON responses.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::warn;

use gridscale_policy::{PolicyError, ScalingPolicy};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn policy_error_response(err: PolicyError) -> axum::response::Response {
    let status = match &err {
        PolicyError::Validation(_) => StatusCode::BAD_REQUEST,
        PolicyError::NotFound(_) => StatusCode::NOT_FOUND,
    };
    error_response(&err.to_string(), status).into_response()
}

// ── Health ─────────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    ApiResponse::ok("ok")
}

// ── Policies ───────────────────────────────────────────────────

/// GET /api/v1/policies
pub async fn list_policies(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.store.list_status().await)
}

/// POST /api/v1/policies
pub async fn register_policy(
    State(state): State<ApiState>,
    Json(policy): Json<ScalingPolicy>,
) -> impl IntoResponse {
    match state.store.register(policy).await {
        Ok(stored) => (StatusCode::CREATED, ApiResponse::ok(stored)).into_response(),
        Err(e) => policy_error_response(e),
    }
}

/// GET /api/v1/policies/{service}
pub async fn get_policy(
    State(state): State<ApiState>,
    Path(service): Path<String>,
) -> impl IntoResponse {
    match state.store.get(&service).await {
        Some(policy) => ApiResponse::ok(policy).into_response(),
        None => error_response("policy not found", StatusCode::NOT_FOUND).into_response(),
    }
}

/// DELETE /api/v1/policies/{service}
pub async fn delete_policy(
    State(state): State<ApiState>,
    Path(service): Path<String>,
) -> impl IntoResponse {
    if state.store.remove(&service).await {
        ApiResponse::ok("deleted").into_response()
    } else {
        error_response("policy not found", StatusCode::NOT_FOUND).into_response()
    }
}

/// GET /api/v1/policies/{service}/status
pub async fn policy_status(
    State(state): State<ApiState>,
    Path(service): Path<String>,
) -> impl IntoResponse {
    match state.store.status(&service).await {
        Ok(status) => ApiResponse::ok(status).into_response(),
        Err(e) => policy_error_response(e),
    }
}

/// POST /api/v1/policies/{service}/enable
pub async fn enable_policy(
    State(state): State<ApiState>,
    Path(service): Path<String>,
) -> impl IntoResponse {
    match state.store.set_enabled(&service, true).await {
        Ok(()) => ApiResponse::ok("enabled").into_response(),
        Err(e) => policy_error_response(e),
    }
}

/// POST /api/v1/policies/{service}/disable
pub async fn disable_policy(
    State(state): State<ApiState>,
    Path(service): Path<String>,
) -> impl IntoResponse {
    match state.store.set_enabled(&service, false).await {
        Ok(()) => ApiResponse::ok("disabled").into_response(),
        Err(e) => policy_error_response(e),
    }
}

// ── Services ───────────────────────────────────────────────────

/// GET /api/v1/services/{service}
pub async fn get_service(
    State(state): State<ApiState>,
    Path(service): Path<String>,
) -> impl IntoResponse {
    match state.target.service_info(&service).await {
        Ok(info) => ApiResponse::ok(info).into_response(),
        Err(e) => {
            warn!(service = %service, error = %e, "service info lookup failed");
            error_response(&e.to_string(), StatusCode::BAD_GATEWAY).into_response()
        }
    }
}
