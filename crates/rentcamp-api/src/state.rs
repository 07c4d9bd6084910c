//! Application state

use metrics_exporter_prometheus::PrometheusHandle;
use rentcamp_auth::{AuthError, CredentialHasher, TokenService};
use rentcamp_core::CartManager;
use rentcamp_db::Database;
use std::sync::Arc;

/// Handle used to render the Prometheus exposition
pub type MetricsHandle = PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub carts: Arc<CartManager>,
    pub tokens: Arc<TokenService>,
    pub hasher: Arc<CredentialHasher>,
    /// Verified against when a login names an unknown user
    pub dummy_hash: Arc<str>,
}

impl AppState {
    pub fn new(
        db: Database,
        tokens: Arc<TokenService>,
        hasher: Arc<CredentialHasher>,
    ) -> Result<Self, AuthError> {
        let dummy_hash = hasher.hash("rentcamp-timing-dummy")?;
        Ok(Self {
            carts: Arc::new(CartManager::new(db.clone())),
            db,
            tokens,
            hasher,
            dummy_hash: Arc::from(dummy_hash),
        })
    }
}
