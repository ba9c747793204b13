pub mod auth;
pub mod booking;
pub mod catalog;
pub mod config;
pub mod contact;
pub mod error;
pub mod health;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod seed;
pub mod shutdown;
pub mod slug;
pub mod state;
pub mod store;

pub use config::{CliArgs, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use logging::{LoggingConfig, init_logging};
pub use shutdown::ShutdownCoordinator;
pub use state::AppState;

use anyhow::Result;
use std::{future::IntoFuture, sync::Arc};
use tokio::net::TcpListener;

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let shutdown_timeout = config.graceful_shutdown_timeout_secs;
    let state = Arc::new(AppState::new(config)?);

    tracing::info!(
        bind = %state.config.http_bind_address,
        default_location = %state.config.default_location,
        ephemeral = state.config.ephemeral,
        "starting servicemart server",
    );

    let coordinator = Arc::new(ShutdownCoordinator::new(shutdown_timeout));

    let router = http::router(state.clone());
    let listener = TcpListener::bind(state.config.http_bind_address).await?;
    let actual_addr = listener.local_addr()?;
    tracing::info!(bind = %actual_addr, "listening");

    let shutdown_coordinator = coordinator.clone();
    let server_future = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_coordinator.wait_for_signal().await;
        })
        .into_future();

    tokio::pin!(server_future);
    let server_result = server_future.await;

    tracing::info!("server stopped, flushing state");
    if let Err(e) = coordinator.finalize(state).await {
        tracing::error!("error during shutdown: {}", e);
    }

    server_result.map_err(anyhow::Error::from)
}
