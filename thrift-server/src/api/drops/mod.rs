//! Drop API

mod handler;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/drops", drop_routes())
}

fn drop_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/countdowns", get(handler::countdowns))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/activate", post(handler::activate))
        .route("/{id}/complete", post(handler::complete))
        .route("/{id}/cancel-schedule", post(handler::cancel_schedule))
        .route(
            "/{id}/schedule",
            post(handler::schedule).put(handler::reschedule),
        )
        .route("/{id}/countdown", get(handler::countdown))
}
