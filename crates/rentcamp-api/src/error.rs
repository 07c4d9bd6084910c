//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rentcamp_auth::AuthError;
use rentcamp_core::CoreError;
use rentcamp_db::DbError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

impl ApiError {
    /// HTTP status, stable error code and client-facing message
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                self.to_string(),
            ),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string()),
            ApiError::Core(e) => match e {
                CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
                CoreError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
                CoreError::Persistence(db) => database_parts(db),
            },
            ApiError::Database(e) => database_parts(e),
            ApiError::Auth(e) => {
                let (status, code) = e.status_and_code();
                (status, code, e.to_string())
            }
        }
    }
}

fn database_parts(e: &DbError) -> (StatusCode, &'static str, String) {
    match e {
        DbError::Duplicate(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        DbError::Connection(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "DATABASE_ERROR",
            e.to_string(),
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        // Storage details stay in the log
        let message = if status.is_server_error() {
            error!("Request failed: {}", message);
            "Internal server error".to_string()
        } else {
            message
        };

        let body = axum::Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
