//! Authentication Handlers

use axum::{Json, extract::State};
use shared::client::{AuthPayload, LoginRequest, RefreshRequest, SignupRequest};
use shared::error::{ApiResponse, AppError};
use shared::models::PublicUser;

use crate::api::{ValidJson, run_blocking};
use crate::auth::CurrentUser;
use crate::core::ServerState;

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<ServerState>,
    ValidJson(req): ValidJson<SignupRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let auth = state.auth.clone();
    run_blocking(move || auth.signup(req)).await?;
    Ok(Json(ApiResponse::success_with_message("Account created", ())))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<ServerState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthPayload>>, AppError> {
    let auth = state.auth.clone();
    let payload = run_blocking(move || auth.login(&req.email, &req.password)).await?;
    Ok(Json(ApiResponse::success(payload)))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<ServerState>,
    ValidJson(req): ValidJson<RefreshRequest>,
) -> Result<Json<ApiResponse<AuthPayload>>, AppError> {
    let auth = state.auth.clone();
    let payload = run_blocking(move || auth.refresh(&req.refresh_token)).await?;
    Ok(Json(ApiResponse::success(payload)))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<PublicUser>>, AppError> {
    let auth = state.auth.clone();
    let profile = run_blocking(move || auth.current_user(&user)).await?;
    Ok(Json(ApiResponse::success(profile)))
}
