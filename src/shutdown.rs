//! Graceful shutdown coordination.
//!
//! Listens for SIGINT/SIGTERM, cancels a shared token so in-flight work can
//! wind down, and flushes the store snapshot before exit.

use crate::state::AppState;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct ShutdownCoordinator {
    shutdown_token: CancellationToken,
    timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            shutdown_token: CancellationToken::new(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Token async tasks can watch for cancellation.
    pub fn token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Wait for a shutdown signal (SIGTERM or SIGINT), then cancel the token.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("received SIGINT (Ctrl+C), initiating graceful shutdown");
            },
            _ = terminate => {
                info!("received SIGTERM, initiating graceful shutdown");
            },
        }
        self.shutdown_token.cancel();
    }

    /// Flush durable state, bounded by the configured shutdown budget.
    pub async fn finalize(&self, state: Arc<AppState>) -> Result<()> {
        info!("flushing store before exit");
        let flush = tokio::task::spawn_blocking(move || state.store.flush());
        match timeout(self.timeout, flush).await {
            Ok(joined) => joined??,
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "store flush exceeded shutdown budget"
                );
            }
        }
        info!("graceful shutdown complete");
        Ok(())
    }
}
