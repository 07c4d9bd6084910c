//! Request/Response DTOs

use rentcamp_auth::TokenPair;
use rentcamp_db::{Gender, Product, User, UserRole};
use serde::{Deserialize, Serialize};

// ==================== Auth Types ====================

/// Self-service registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub gender: Gender,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Identity returned next to a token pair
#[derive(Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub role: UserRole,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Login and refresh response
#[derive(Serialize)]
pub struct TokenResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub token_type: &'static str,
    pub info: UserInfo,
}

// ==================== User Types ====================

/// Create user request (admin)
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub gender: Gender,
    pub role: UserRole,
}

/// Update user request
#[derive(Deserialize, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gender: Option<Gender>,
    pub role: Option<UserRole>,
}

/// Paginated user list
#[derive(Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub total: i64,
}

// ==================== Listing ====================

/// Query parameters shared by list endpoints
#[derive(Deserialize, Default)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub name: Option<String>,
}

// ==================== Product Types ====================

/// Create product request
#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub stock: i64,
    pub image: Option<String>,
}

/// Update product request
#[derive(Deserialize, Default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i64>,
    pub image: Option<String>,
}

/// Paginated product list
#[derive(Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ==================== Cart Types ====================

/// Add item request
#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}

/// Update item request
#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

/// Cart total response
#[derive(Serialize)]
pub struct CartTotalResponse {
    pub cart_id: i64,
    pub total_price: i64,
    pub item_count: i64,
}
