//! HTTP 处理器

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use shelf_errors::AppResult;
use shelf_telemetry::HealthStatus;

use super::context::CurrentIdentity;
use super::dto::{
    ActivateRequest, ActivateResponse, LoginRequest, LoginResponse, MeResponse, RegisterRequest,
};
use super::routes::AppState;

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<StatusCode> {
    state.auth.register(req.into()).await?;
    Ok(StatusCode::ACCEPTED)
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let token = state.auth.login(req.into()).await?;
    Ok(Json(LoginResponse { token }))
}

/// POST /auth/activate
pub async fn activate(
    State(state): State<AppState>,
    Json(req): Json<ActivateRequest>,
) -> AppResult<Json<ActivateResponse>> {
    state.auth.activate(&req.code).await?;
    Ok(Json(ActivateResponse { activated: true }))
}

/// GET /api/me
pub async fn me(CurrentIdentity(identity): CurrentIdentity) -> Json<MeResponse> {
    Json(identity.into())
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mut status = HealthStatus::new();

    match &state.pool {
        Some(pool) => match shelf_adapter_postgres::check_connection(pool).await {
            Ok(()) => status.add_check("postgres", true, None),
            Err(e) => status.add_check("postgres", false, Some(e.to_string())),
        },
        None => status.add_check("storage", true, Some("in-memory".to_string())),
    }

    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}
