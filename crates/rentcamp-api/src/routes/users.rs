//! User management routes

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::get,
};
use rentcamp_auth::{AuthUser, enforce_owner_or_role, require_admin, require_auth};
use rentcamp_db::{NewUser, UpdateUser, User, UserQuery, UserRole};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{CreateUserRequest, ListQuery, UpdateUserRequest, UserListResponse};
use super::validation::{validate_email, validate_password, validate_text, validate_username};

// ==================== User Routes ====================

/// GET /api/v1/users (Admin only)
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let limit = query.limit.unwrap_or(0).max(0);
    let page = query.page.unwrap_or(1).max(1);
    let (users, total) = state
        .db
        .list_users(UserQuery {
            name: query.name.filter(|n| !n.is_empty()),
            offset: (page - 1).saturating_mul(limit),
            limit,
        })
        .await?;

    Ok(Json(UserListResponse { users, total }))
}

/// POST /api/v1/users (Admin only)
async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    validate_username(&request.username)?;
    validate_password(&request.password)?;
    validate_text("Name", &request.name)?;
    validate_email(&request.email)?;
    validate_text("Phone", &request.phone)?;
    validate_text("Address", &request.address)?;

    debug!("Creating user: {}", request.username);

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
            role: request.role,
        })
        .await?;

    info!("Created user: {} ({})", user.username, user.role);
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/users/{id} (owner or admin)
async fn get_user(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    enforce_owner_or_role(&caller, UserRole::Admin, id)?;

    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    Ok(Json(user))
}

/// PUT /api/v1/users/{id} (owner or admin)
async fn update_user(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    enforce_owner_or_role(&caller, UserRole::Admin, id)?;

    if request.role.is_some() && !caller.role.is_admin() {
        warn!("User {} tried to change the role of user {}", caller.username, id);
        return Err(ApiError::Forbidden);
    }

    debug!("Updating user: {}", id);

    if let Some(username) = &request.username {
        validate_username(username)?;
    }
    if let Some(email) = &request.email {
        validate_email(email)?;
    }
    for (field, value) in [
        ("Name", &request.name),
        ("Phone", &request.phone),
        ("Address", &request.address),
    ] {
        if let Some(value) = value {
            validate_text(field, value)?;
        }
    }
    let password_hash = match &request.password {
        Some(password) => {
            validate_password(password)?;
            Some(state.hasher.hash(password)?)
        }
        None => None,
    };

    let update = UpdateUser {
        name: request.name,
        username: request.username,
        password_hash,
        email: request.email,
        phone: request.phone,
        address: request.address,
        gender: request.gender,
        role: request.role,
    };
    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let user = state
        .db
        .update_user(id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    info!("Updated user: {}", user.username);
    Ok(Json(user))
}

/// DELETE /api/v1/users/{id} (owner or admin)
async fn delete_user(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    enforce_owner_or_role(&caller, UserRole::Admin, id)?;

    if !state.db.delete_user(id).await? {
        return Err(ApiError::NotFound(format!("User: {}", id)));
    }

    info!("Deleted user {} (by {})", id, caller.username);
    Ok(StatusCode::NO_CONTENT)
}

/// Create user routes
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/users",
            get(list_users)
                .post(create_user)
                .route_layer(middleware::from_fn(require_admin)),
        )
        .route(
            "/api/v1/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            require_auth,
        ))
}
