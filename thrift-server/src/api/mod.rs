//! HTTP API
//!
//! One module per resource; each nests its own `/api/...` prefix and every
//! handler answers with the `{code, message, data}` envelope.

pub mod drops;
pub mod health;
pub mod inventory;
pub mod listings;
pub mod orders;
pub mod submissions;

use axum::Router;

use crate::core::ServerState;

pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .merge(inventory::router())
        .merge(drops::router())
        .merge(submissions::router())
        .merge(orders::router())
        .merge(listings::router())
        .merge(health::router())
        .with_state(state)
}
