//! Shopping cart routes
//!
//! Every route needs an access token. Routes addressing a cart load it first
//! and allow only its owner or an admin.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, put},
};
use rentcamp_auth::{AuthUser, enforce_owner_or_role, require_auth};
use rentcamp_core::CartWithItems;
use rentcamp_db::{Cart, CartItem, CartItemDetail, UserRole};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{AddItemRequest, CartTotalResponse, UpdateItemRequest};

/// Load a cart the caller may act on
async fn authorized_cart(
    state: &AppState,
    caller: &AuthUser,
    cart_id: i64,
) -> Result<Cart, ApiError> {
    let cart = state.carts.find_cart(cart_id).await?;
    enforce_owner_or_role(caller, UserRole::Admin, cart.user_id)?;
    Ok(cart)
}

/// POST /api/v1/carts
async fn create_cart(
    caller: AuthUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Cart>), ApiError> {
    // Owner always comes from the token
    let cart = state.carts.create_cart(caller.id).await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

/// GET /api/v1/carts
async fn list_carts(
    caller: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Cart>>, ApiError> {
    Ok(Json(state.carts.list_carts_for_user(caller.id).await?))
}

/// GET /api/v1/carts/{cart_id}
async fn get_cart(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(cart_id): Path<i64>,
) -> Result<Json<CartWithItems>, ApiError> {
    authorized_cart(&state, &caller, cart_id).await?;
    Ok(Json(state.carts.get_cart(cart_id).await?))
}

/// GET /api/v1/carts/{cart_id}/items
async fn list_items(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(cart_id): Path<i64>,
) -> Result<Json<Vec<CartItemDetail>>, ApiError> {
    authorized_cart(&state, &caller, cart_id).await?;
    Ok(Json(state.carts.list_items(cart_id).await?))
}

/// POST /api/v1/carts/{cart_id}/items
async fn add_item(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(cart_id): Path<i64>,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartItem>), ApiError> {
    authorized_cart(&state, &caller, cart_id).await?;

    // The cart manager does not look products up, so check here
    if state.db.get_product_by_id(request.product_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Product: {}", request.product_id)));
    }

    let item = state
        .carts
        .add_item(cart_id, request.product_id, request.quantity)
        .await?;

    debug!("User {} added item {} to cart {}", caller.id, item.id, cart_id);
    Ok((StatusCode::CREATED, Json(item)))
}

/// DELETE /api/v1/carts/{cart_id}/items
async fn clear_cart(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(cart_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    authorized_cart(&state, &caller, cart_id).await?;

    if !state.carts.clear_cart(cart_id).await? {
        return Err(ApiError::NotFound(format!("Cart {} has no items", cart_id)));
    }

    info!("Cleared cart {}", cart_id);
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/carts/{cart_id}/items/{item_id}
async fn update_item(
    caller: AuthUser,
    State(state): State<AppState>,
    Path((cart_id, item_id)): Path<(i64, i64)>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<CartItem>, ApiError> {
    authorized_cart(&state, &caller, cart_id).await?;
    let item = state
        .carts
        .update_item(cart_id, item_id, request.quantity)
        .await?;
    Ok(Json(item))
}

/// DELETE /api/v1/carts/{cart_id}/items/{item_id}
async fn remove_item(
    caller: AuthUser,
    State(state): State<AppState>,
    Path((cart_id, item_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    authorized_cart(&state, &caller, cart_id).await?;

    if !state.carts.remove_item(cart_id, item_id).await? {
        return Err(ApiError::NotFound(format!(
            "Item {} in cart {}",
            item_id, cart_id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/carts/{cart_id}/total
async fn cart_total(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(cart_id): Path<i64>,
) -> Result<Json<CartTotalResponse>, ApiError> {
    authorized_cart(&state, &caller, cart_id).await?;

    Ok(Json(CartTotalResponse {
        cart_id,
        total_price: state.carts.total_price(cart_id).await?,
        item_count: state.carts.item_count(cart_id).await?,
    }))
}

/// Create cart routes
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/carts", get(list_carts).post(create_cart))
        .route("/api/v1/carts/{cart_id}", get(get_cart))
        .route(
            "/api/v1/carts/{cart_id}/items",
            get(list_items).post(add_item).delete(clear_cart),
        )
        .route(
            "/api/v1/carts/{cart_id}/items/{item_id}",
            put(update_item).delete(remove_item),
        )
        .route("/api/v1/carts/{cart_id}/total", get(cart_total))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            require_auth,
        ))
}
