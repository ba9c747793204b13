//! Shared application state handed to every HTTP handler.

use crate::auth::SessionRegistry;
use crate::config::ServerConfig;
use crate::store::Store;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub store: Arc<Store>,
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Open the store, bootstrap the configured admin account, and assemble
    /// the shared state.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let store = if config.ephemeral {
            info!("running with an ephemeral in-memory store");
            Store::in_memory()
        } else {
            let path = config.snapshot_path();
            info!(path = ?path, "opening store snapshot");
            Store::open(path)?
        };

        crate::auth::ensure_admin(&store, &config.admin_username, &config.admin_password)?;

        let sessions = SessionRegistry::new(config.session_ttl_secs);
        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            sessions,
        })
    }

    /// Test constructor: in-memory store, short sessions.
    #[cfg(test)]
    pub fn for_tests() -> Arc<Self> {
        let config = ServerConfig::from_args(crate::config::CliArgs {
            ephemeral: true,
            admin_password: Some("admin123".into()),
            ..crate::config::CliArgs::default()
        })
        .expect("test config");
        Arc::new(Self::new(config).expect("test state"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_bootstraps_admin() {
        let state = AppState::for_tests();
        let admin = state
            .store
            .read(|s| s.admin_by_username("admin").cloned())
            .unwrap();
        assert!(crate::auth::verify_password("admin123", &admin.password_digest));
    }

    #[test]
    fn ephemeral_store_has_no_path() {
        let state = AppState::for_tests();
        assert!(state.store.path().is_none());
    }
}
