//! Shared application state for all routes.

use crate::auth::AuthProvider;
use crate::config::AppConfig;
use crate::service::Services;
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    /// Same store the services use; kept for readiness checks.
    pub store: Arc<dyn Store>,
    pub auth: Arc<dyn AuthProvider>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, auth: Arc<dyn AuthProvider>, config: AppConfig) -> Self {
        AppState {
            services: Services::new(store.clone()),
            store,
            auth,
            config: Arc::new(config),
        }
    }
}
