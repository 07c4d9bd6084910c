//! Authentication middleware for Axum

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use rentcamp_db::UserRole;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::jwt::{Claims, TokenKind, TokenService};

/// Authenticated user information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
}

impl TryFrom<Claims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims.sub.parse().map_err(|_| AuthError::MalformedToken)?;
        Ok(Self {
            id,
            username: claims.username,
            role: claims.role,
        })
    }
}

/// Extract bearer token from authorization header
fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    match header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

/// Resolve the caller of a request from its headers
///
/// Only access tokens are accepted here.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<AuthUser, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = extract_bearer_token(header)?;
    let claims = tokens.validate(token, TokenKind::Access)?;
    AuthUser::try_from(claims)
}

/// Authentication middleware
///
/// Rejects the request before the handler runs unless it carries a valid
/// access token. On success the `AuthUser` is added to request extensions.
pub async fn require_auth(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = authenticate(request.headers(), &tokens).inspect_err(|e| {
        debug!("Rejected request to {}: {}", request.uri().path(), e);
    })?;

    debug!("Authenticated user: {} ({})", user.username, user.role);

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Middleware to require admin role
///
/// Must run after `require_auth`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuthHeader)?;

    if !user.role.is_admin() {
        warn!("User {} denied admin access to {}", user.username, request.uri().path());
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Allow the caller if they own the resource or hold the required role
pub fn enforce_owner_or_role(
    user: &AuthUser,
    required: UserRole,
    owner_id: i64,
) -> Result<(), AuthError> {
    if user.id == owner_id || user.role == required {
        return Ok(());
    }
    debug!(
        "User {} is neither owner {} nor {}",
        user.id, owner_id, required
    );
    Err(AuthError::InsufficientPermissions)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}
