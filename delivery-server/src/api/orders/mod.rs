//! Order API Module
//!
//! All mutations go through OrdersManager.

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    // 角色检查在 OrdersManager 内部完成
    Router::new()
        .route("/", post(handler::create))
        .route("/customer", get(handler::customer_orders))
        .route("/delivery", get(handler::delivery_orders))
        .route("/pending", get(handler::pending_orders))
        .route("/status/{status}", get(handler::orders_by_status))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", patch(handler::update_status))
}
