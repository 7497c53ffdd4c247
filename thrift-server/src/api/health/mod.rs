//! Health Check

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::core::ServerState;
use crate::utils::{ok, ApiResponse};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

async fn health() -> Json<ApiResponse<HealthStatus>> {
    ok(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
