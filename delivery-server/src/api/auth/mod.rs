//! Authentication Routes

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

/// Build authentication router
/// - /api/auth/login, /api/auth/signup, /api/auth/refresh: anonymous
/// - /api/auth/me: requires an access token (global require_auth middleware)
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/auth/login", post(handler::login))
        .route("/api/auth/signup", post(handler::signup))
        .route("/api/auth/refresh", post(handler::refresh))
        .route("/api/auth/refreshToken", post(handler::refresh))
        .route("/api/auth/me", get(handler::me))
}
