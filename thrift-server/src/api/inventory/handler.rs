//! Inventory API Handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::models::{InventoryItem, ItemCreate, ItemUpdate};
use validator::Validate;

use crate::core::ServerState;
use crate::db::repository::item as item_repo;
use crate::utils::{ok, ok_with_message, ApiResponse, AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct InventoryQuery {
    /// Only items not assigned to any drop (drop editor picker)
    #[serde(default)]
    unassigned: bool,
    /// Only items still for sale (storefront)
    #[serde(default)]
    available: bool,
}

/// GET /api/inventory
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<InventoryQuery>,
) -> AppResult<Json<ApiResponse<Vec<InventoryItem>>>> {
    let items = if query.unassigned {
        item_repo::find_unassigned(&state.db.pool).await?
    } else {
        item_repo::find_all(&state.db.pool).await?
    };
    let items = if query.available {
        items.into_iter().filter(|i| i.available).collect()
    } else {
        items
    };
    Ok(ok(items))
}

/// GET /api/inventory/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<InventoryItem>>> {
    let item = item_repo::find_by_id(&state.db.pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {id} not found")))?;
    Ok(ok(item))
}

/// POST /api/inventory
pub async fn create(
    State(state): State<ServerState>,
    Json(data): Json<ItemCreate>,
) -> AppResult<Json<ApiResponse<InventoryItem>>> {
    data.validate()?;
    let item = item_repo::create(&state.db.pool, data).await?;
    Ok(ok_with_message(item, "Item created"))
}

/// PUT /api/inventory/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(data): Json<ItemUpdate>,
) -> AppResult<Json<ApiResponse<InventoryItem>>> {
    let item = item_repo::update(&state.db.pool, &id, data).await?;
    Ok(ok_with_message(item, "Item updated"))
}

/// POST /api/inventory/{id}/sold
pub async fn mark_sold(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<InventoryItem>>> {
    item_repo::set_available(&state.db.pool, &id, false).await?;
    let item = item_repo::find_by_id(&state.db.pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {id} not found")))?;
    Ok(ok_with_message(item, "Item marked sold"))
}

/// POST /api/inventory/{id}/available
pub async fn mark_available(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<InventoryItem>>> {
    item_repo::set_available(&state.db.pool, &id, true).await?;
    let item = item_repo::find_by_id(&state.db.pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {id} not found")))?;
    Ok(ok_with_message(item, "Item marked available"))
}

/// DELETE /api/inventory/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    item_repo::delete(&state.db.pool, &id).await?;
    Ok(ok_with_message((), "Item deleted"))
}
