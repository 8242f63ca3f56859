//! Order Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{CreateOrderInput, Order, OrderStatus, UpdateOrderStatusRequest};

use crate::api::{ValidJson, run_blocking};
use crate::auth::CurrentUser;
use crate::core::ServerState;

type OrderResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// POST /api/orders (Customer)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    ValidJson(input): ValidJson<CreateOrderInput>,
) -> OrderResult<Order> {
    let orders = state.orders.clone();
    let order = run_blocking(move || Ok(orders.create(input, &user)?)).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// PATCH /api/orders/{id}/status (Delivery)
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateOrderStatusRequest>,
) -> OrderResult<Order> {
    let orders = state.orders.clone();
    let order = run_blocking(move || Ok(orders.update_status(&id, req.status, &user)?)).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// GET /api/orders/{id} (any authenticated role)
pub async fn get_by_id(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> OrderResult<Order> {
    let orders = state.orders.clone();
    let order = run_blocking(move || {
        orders
            .get_by_id(&id)?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("orderId", id))
    })
    .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// GET /api/orders/customer (Customer)
pub async fn customer_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> OrderResult<Vec<Order>> {
    let orders = state.orders.clone();
    let list = run_blocking(move || Ok(orders.customer_orders(&user)?)).await?;
    Ok(Json(ApiResponse::success(list)))
}

/// GET /api/orders/delivery (Delivery)
pub async fn delivery_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> OrderResult<Vec<Order>> {
    let orders = state.orders.clone();
    let list = run_blocking(move || Ok(orders.delivery_orders(&user)?)).await?;
    Ok(Json(ApiResponse::success(list)))
}

/// GET /api/orders/pending (Delivery)
pub async fn pending_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> OrderResult<Vec<Order>> {
    let orders = state.orders.clone();
    let list = run_blocking(move || Ok(orders.pending_orders(&user)?)).await?;
    Ok(Json(ApiResponse::success(list)))
}

/// GET /api/orders/status/{status} (Delivery)
pub async fn orders_by_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(status): Path<String>,
) -> OrderResult<Vec<Order>> {
    let status = parse_status(&status)?;
    let orders = state.orders.clone();
    let list = run_blocking(move || Ok(orders.orders_by_status(status, &user)?)).await?;
    Ok(Json(ApiResponse::success(list)))
}

fn parse_status(value: &str) -> Result<OrderStatus, AppError> {
    OrderStatus::ALL
        .into_iter()
        .find(|s| s.as_str() == value)
        .ok_or_else(|| AppError::invalid_field("status", format!("Unknown order status: {value}")))
}
