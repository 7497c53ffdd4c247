//! HTTP Server
//!
//! Binds the API router, runs the drop scheduler alongside it, and tears
//! both down on Ctrl-C.

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api;
use crate::drops::scheduler::DropScheduler;
use crate::utils::{AppError, AppResult};

use super::config::Config;
use super::state::ServerState;
use super::tasks::{BackgroundTasks, TaskKind};

pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    pub fn new(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    pub async fn run(self) -> AppResult<()> {
        let mut tasks = BackgroundTasks::new();
        let scheduler = DropScheduler::new(
            self.state.db.pool.clone(),
            self.state.countdowns.clone(),
        );
        tasks.spawn(
            "drop_scheduler",
            TaskKind::Periodic,
            scheduler.run(tasks.shutdown_token()),
        );

        let cors = match self.config.cors_origin.as_str() {
            "*" => CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
            origin => match origin.parse::<HeaderValue>() {
                Ok(value) => CorsLayer::new()
                    .allow_origin(value)
                    .allow_methods(Any)
                    .allow_headers(Any),
                Err(_) => {
                    warn!(origin, "Invalid CORS_ORIGIN, allowing any origin");
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any)
                }
            },
        };

        let app = api::create_router(self.state)
            .layer(TraceLayer::new_for_http())
            .layer(cors);

        let addr = format!("0.0.0.0:{}", self.config.http_port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind {addr}: {e}")))?;
        info!(addr = %addr, "HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::Internal(format!("Server error: {e}")))?;

        tasks.shutdown().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
