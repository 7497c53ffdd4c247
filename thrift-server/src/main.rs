use thrift_server::core::{Config, Server, ServerState};
use thrift_server::utils::logger;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    logger::init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.http_port,
        database = %config.database_path,
        "Starting Hokies Thrift server"
    );

    let state = match ServerState::initialize(&config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize server state");
            std::process::exit(1);
        }
    };

    if let Err(e) = Server::new(config, state).run().await {
        tracing::error!(error = %e, "Server exited with error");
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
