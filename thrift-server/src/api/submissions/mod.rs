//! Submission API

mod handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/submissions", submission_routes())
}

fn submission_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/review", post(handler::review))
        .route("/{id}/approve", post(handler::approve))
        .route("/{id}/reject", post(handler::reject))
}
