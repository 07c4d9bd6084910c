//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingAuthHeader,

    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Token is not a {0} token")]
    WrongTokenKind(&'static str),

    #[error("Token expired")]
    TokenExpired,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Signing secret for {0} tokens is not configured")]
    MissingSecret(&'static str),

    #[error("Invalid token configuration: {0}")]
    InvalidConfig(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// HTTP status and stable error code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidSignature
            | AuthError::MalformedToken
            | AuthError::WrongTokenKind(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            AuthError::InsufficientPermissions => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AuthError::MissingSecret(_)
            | AuthError::InvalidConfig(_)
            | AuthError::PasswordHash(_)
            | AuthError::Jwt(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if status.is_server_error() {
            "Internal error".to_string()
        } else {
            self.to_string()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_is_distinguished_from_rejection() {
        let (expired_status, expired_code) = AuthError::TokenExpired.status_and_code();
        let (invalid_status, invalid_code) = AuthError::InvalidSignature.status_and_code();
        let (forbidden_status, forbidden_code) =
            AuthError::InsufficientPermissions.status_and_code();

        assert_eq!(expired_status, StatusCode::UNAUTHORIZED);
        assert_eq!(invalid_status, StatusCode::UNAUTHORIZED);
        assert_eq!(forbidden_status, StatusCode::FORBIDDEN);
        assert_ne!(expired_code, invalid_code);
        assert_ne!(invalid_code, forbidden_code);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let response = AuthError::PasswordHash("salt failure".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
