//! Product catalog routes
//!
//! Reads are public. Mutations go through the admin guard.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{MethodRouter, get, post, put},
};
use rentcamp_auth::{AuthUser, require_admin, require_auth};
use rentcamp_db::{NewProduct, Product, ProductQuery, UpdateProduct};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{CreateProductRequest, ListQuery, ProductListResponse, UpdateProductRequest};
use super::validation::{validate_amount, validate_image_url, validate_text};

/// GET /api/v1/products
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let query = ProductQuery::page(page, query.limit.unwrap_or(0), query.name);
    let limit = query.limit;

    let (products, total) = state.db.list_products(query).await?;

    Ok(Json(ProductListResponse {
        products,
        total,
        page,
        limit,
    }))
}

/// GET /api/v1/products/{id}
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .db
        .get_product_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product: {}", id)))?;

    Ok(Json(product))
}

/// POST /api/v1/products (Admin only)
async fn create_product(
    admin: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    validate_text("Name", &request.name)?;
    validate_amount("Price", request.price)?;
    validate_amount("Stock", request.stock)?;
    if let Some(image) = &request.image {
        validate_image_url(image)?;
    }

    debug!("Creating product: {}", request.name);

    let product = state
        .db
        .insert_product(NewProduct {
            name: request.name,
            description: request.description,
            price: request.price,
            stock: request.stock,
            image: request.image,
            admin_id: admin.id,
        })
        .await?;

    info!("Created product {} ({}) by {}", product.id, product.name, admin.username);
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/v1/products/{id} (Admin only)
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    if let Some(name) = &request.name {
        validate_text("Name", name)?;
    }
    if let Some(price) = request.price {
        validate_amount("Price", price)?;
    }
    if let Some(stock) = request.stock {
        validate_amount("Stock", stock)?;
    }
    if let Some(image) = &request.image {
        validate_image_url(image)?;
    }

    let update = UpdateProduct {
        name: request.name,
        description: request.description,
        price: request.price,
        stock: request.stock,
        image: request.image,
    };
    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let product = state
        .db
        .update_product(id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product: {}", id)))?;

    info!("Updated product: {}", product.id);
    Ok(Json(product))
}

/// DELETE /api/v1/products/{id} (Admin only)
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !state.db.delete_product(id).await? {
        return Err(ApiError::NotFound(format!("Product: {}", id)));
    }

    info!("Deleted product: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Create product routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let admin_only = |methods: MethodRouter<AppState>| {
        methods
            .route_layer(middleware::from_fn(require_admin))
            .route_layer(middleware::from_fn_with_state(
                state.tokens.clone(),
                require_auth,
            ))
    };

    Router::new()
        .route(
            "/api/v1/products",
            get(list_products).merge(admin_only(post(create_product))),
        )
        .route(
            "/api/v1/products/{id}",
            get(get_product).merge(admin_only(put(update_product).delete(delete_product))),
        )
}
