//! Order API Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use shared::models::{Order, OrderCreate};

use crate::core::ServerState;
use crate::utils::{ok, ok_with_message, ApiResponse, AppResult};

/// POST /api/orders - checkout
pub async fn create(
    State(state): State<ServerState>,
    Json(data): Json<OrderCreate>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.checkout.place_order(data).await?;
    Ok(ok_with_message(order, "Order placed"))
}

/// GET /api/orders
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    Ok(ok(state.checkout.list().await?))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(ok(state.checkout.get(&id).await?))
}
