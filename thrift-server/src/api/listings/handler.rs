//! Marketplace Listing Handlers

use axum::{extract::State, Json};

use crate::core::ServerState;
use crate::providers::Listing;
use crate::utils::{ok, ApiResponse, AppResult};

/// GET /api/listings - external marketplace listings
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<Vec<Listing>>>> {
    Ok(ok(state.listings.fetch_listings().await?))
}
