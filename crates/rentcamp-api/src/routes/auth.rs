//! Registration, login and token refresh

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use rentcamp_auth::{AuthError, TokenKind};
use rentcamp_db::{NewUser, User, UserRole};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{LoginRequest, RefreshRequest, RegisterRequest, TokenResponse, UserInfo};
use super::validation::{validate_email, validate_password, validate_text, validate_username};

fn token_response(state: &AppState, user: &User) -> Result<TokenResponse, ApiError> {
    let tokens = state.tokens.issue(user.id, &user.username, user.role)?;
    Ok(TokenResponse {
        tokens,
        token_type: "Bearer",
        info: UserInfo::from(user),
    })
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    validate_username(&request.username)?;
    validate_password(&request.password)?;
    validate_text("Name", &request.name)?;
    validate_email(&request.email)?;
    validate_text("Phone", &request.phone)?;
    validate_text("Address", &request.address)?;

    debug!("Registering user: {}", request.username);

    let password_hash = state.hasher.hash(&request.password)?;
    let user = state
        .db
        .insert_user(NewUser {
            name: request.name,
            username: request.username,
            password_hash,
            email: request.email,
            phone: request.phone,
            address: request.address,
            gender: request.gender,
            role: UserRole::User,
        })
        .await?;

    info!("Registered user: {}", user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    validate_username(&request.username).map_err(|_| ApiError::Unauthorized)?;

    debug!("Login attempt for user: {}", request.username);

    let user = state.db.get_user_by_username(&request.username).await?;

    // Verify against a dummy hash when the user is missing so both paths cost the same
    let hash_to_verify = match &user {
        Some(u) => u.password_hash.as_str(),
        None => &*state.dummy_hash,
    };
    let password_valid = state.hasher.verify(&request.password, hash_to_verify)?;

    let user = match (user, password_valid) {
        (Some(u), true) => u,
        _ => {
            warn!("Failed login for user: {}", request.username);
            metrics::counter!("rentcamp_logins_total", "outcome" => "failure").increment(1);
            return Err(ApiError::Unauthorized);
        }
    };

    let response = token_response(&state, &user)?;

    info!("User {} logged in successfully", user.username);
    metrics::counter!("rentcamp_logins_total", "outcome" => "success").increment(1);

    Ok(Json(response))
}

/// POST /api/v1/auth/refresh
async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let claims = state.tokens.validate(&request.refresh_token, TokenKind::Refresh)?;
    let id: i64 = claims.sub.parse().map_err(|_| AuthError::MalformedToken)?;

    // Role and username come from the account, not the old token
    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    debug!("Refreshing tokens for user: {}", user.username);
    Ok(Json(token_response(&state, &user)?))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/refresh", post(refresh))
}
