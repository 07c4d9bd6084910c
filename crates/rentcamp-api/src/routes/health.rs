//! Liveness and readiness endpoints

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<bool>,
}

/// GET /health: the process is up and the database answers
async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    metrics::counter!("rentcamp_health_checks_total").increment(1);

    let database = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Health check: database unreachable: {}", e);
            false
        }
    };
    let (code, status) = if database {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database: Some(database),
        }),
    )
}

/// GET /healthz
async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive",
        version: env!("CARGO_PKG_VERSION"),
        database: None,
    })
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(readiness))
        .route("/healthz", get(liveness))
}
