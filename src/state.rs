use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::db::DocumentStore;

/// Shared handles passed to every handler. Owned by `run()`; dropped on shutdown.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_secs);
        Self {
            config: Arc::new(config),
            store,
            tokens: Arc::new(tokens),
        }
    }
}
