//! API routes

mod auth;
mod carts;
mod health;
pub mod metrics;
mod products;
mod types;
mod users;
mod validation;

use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(users::routes(&state))
        .merge(products::routes(&state))
        .merge(carts::routes(&state))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use chrono::{Duration, Utc};
    use http::{Request, StatusCode, header};
    use rentcamp_auth::{CredentialHasher, TokenService};
    use rentcamp_db::{Database, Gender, NewProduct, NewUser, Product, User, UserRole};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        state: AppState,
    }

    impl TestApp {
        async fn new() -> Self {
            let db = Database::in_memory().await.unwrap();
            let tokens =
                Arc::new(TokenService::new("api-access", "api-refresh", 900, 86_400).unwrap());
            let hasher = Arc::new(CredentialHasher::with_params(1024, 1, 1).unwrap());
            let state = AppState::new(db, tokens, hasher).unwrap();
            Self {
                router: create_router(state.clone(), None),
                state,
            }
        }

        async fn seed_user(&self, username: &str, role: UserRole) -> (User, String) {
            let user = self
                .state
                .db
                .insert_user(NewUser {
                    name: format!("{} name", username),
                    username: username.to_string(),
                    password_hash: self.state.hasher.hash("password123").unwrap(),
                    email: format!("{}@example.com", username),
                    phone: "0811111111".to_string(),
                    address: "Jl. Dago 10".to_string(),
                    gender: Gender::Male,
                    role,
                })
                .await
                .unwrap();
            let token = self
                .state
                .tokens
                .issue(user.id, &user.username, user.role)
                .unwrap()
                .access_token;
            (user, token)
        }

        async fn seed_product(&self, name: &str, price: i64) -> Product {
            self.state
                .db
                .insert_product(NewProduct {
                    name: name.to_string(),
                    description: String::new(),
                    price,
                    stock: 3,
                    image: None,
                    admin_id: 1,
                })
                .await
                .unwrap()
        }

        async fn send(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (status, value)
        }
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new().await;
        let (status, body) = app.send("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn test_health_reports_unreachable_database() {
        let app = TestApp::new().await;
        app.state.db.pool().close().await;

        let (status, body) = app.send("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["database"], false);

        // Liveness does not depend on storage
        let (status, body) = app.send("GET", "/healthz", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "alive");
    }

    #[tokio::test]
    async fn test_register_login_and_refresh() {
        let app = TestApp::new().await;

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "name": "Gita Savitri",
                    "username": "gita",
                    "password": "camping123",
                    "email": "gita@example.com",
                    "phone": "0812345678",
                    "address": "Jl. Riau 5",
                    "gender": "f"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "user");
        assert!(body.get("password_hash").is_none());

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"username": "gita", "password": "wrong-password"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"username": "nobody", "password": "camping123"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"username": "gita", "password": "camping123"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["info"]["username"], "gita");
        assert_eq!(body["expires_in"], 900);
        let access = body["access_token"].as_str().unwrap().to_string();
        let refresh = body["refresh_token"].as_str().unwrap().to_string();

        // An access token is not accepted as a refresh token
        let (status, _) = app
            .send(
                "POST",
                "/api/v1/auth/refresh",
                None,
                Some(json!({ "refresh_token": access })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/auth/refresh",
                None,
                Some(json!({ "refresh_token": refresh })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["access_token"].is_string());
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let app = TestApp::new().await;
        app.seed_user("hadi", UserRole::User).await;

        let (status, body) = app
            .send(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "name": "Hadi",
                    "username": "hadi",
                    "password": "camping123",
                    "email": "hadi@example.com",
                    "phone": "0812345678",
                    "address": "Jl. Riau 5",
                    "gender": "m"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_user_routes_owner_or_admin() {
        let app = TestApp::new().await;
        let (owner, owner_token) = app.seed_user("indra", UserRole::User).await;
        let (_, other_token) = app.seed_user("joko", UserRole::User).await;
        let (_, admin_token) = app.seed_user("root", UserRole::Admin).await;
        let uri = format!("/api/v1/users/{}", owner.id);

        let (status, _) = app.send("GET", &uri, Some(&owner_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = app.send("GET", &uri, Some(&other_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
        let (status, _) = app.send("GET", &uri, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK);

        // Owners may edit themselves but not their role
        let (status, body) = app
            .send("PUT", &uri, Some(&owner_token), Some(json!({"name": "Indra P"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Indra P");
        let (status, _) = app
            .send("PUT", &uri, Some(&owner_token), Some(json!({"role": "admin"})))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = app
            .send("PUT", &uri, Some(&admin_token), Some(json!({"role": "admin"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "admin");

        // Listing is admin only
        let (status, _) = app.send("GET", "/api/v1/users", Some(&other_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = app.send("GET", "/api/v1/users", Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);

        let (status, _) = app.send("DELETE", &uri, Some(&other_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.send("DELETE", &uri, Some(&owner_token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_products_public_read_admin_write() {
        let app = TestApp::new().await;
        let (_, user_token) = app.seed_user("kiki", UserRole::User).await;
        let (admin, admin_token) = app.seed_user("root", UserRole::Admin).await;
        let product = json!({"name": "Dome Tent", "price": 150000, "stock": 4});

        let (status, _) = app
            .send("POST", "/api/v1/products", None, Some(product.clone()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = app
            .send("POST", "/api/v1/products", Some(&user_token), Some(product.clone()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = app
            .send("POST", "/api/v1/products", Some(&admin_token), Some(product))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["admin_id"], admin.id);
        let id = body["id"].as_i64().unwrap();

        let (status, body) = app.send("GET", "/api/v1/products?name=dome", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["page"], 1);
        assert_eq!(body["limit"], 10);

        let uri = format!("/api/v1/products/{}", id);
        let (status, _) = app
            .send("PUT", &uri, Some(&admin_token), Some(json!({"price": -5})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, body) = app
            .send("PUT", &uri, Some(&admin_token), Some(json!({"price": 175000})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"], 175000);

        let (status, _) = app.send("DELETE", &uri, Some(&user_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.send("DELETE", &uri, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app.send("GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_carts_require_token() {
        let app = TestApp::new().await;

        let (status, body) = app.send("POST", "/api/v1/carts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

        let (status, _) = app
            .send("GET", "/api/v1/carts", Some("not-a-token"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_is_distinguished() {
        let app = TestApp::new().await;
        let (user, _) = app.seed_user("lina", UserRole::User).await;
        let stale = app
            .state
            .tokens
            .issue_at(
                user.id,
                &user.username,
                user.role,
                Utc::now() - Duration::hours(1),
            )
            .unwrap()
            .access_token;

        let (status, body) = app.send("GET", "/api/v1/carts", Some(&stale), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn test_cart_flow_and_ownership() {
        let app = TestApp::new().await;
        let (_, owner_token) = app.seed_user("maya", UserRole::User).await;
        let (_, other_token) = app.seed_user("nina", UserRole::User).await;
        let (_, admin_token) = app.seed_user("root", UserRole::Admin).await;
        let tent = app.seed_product("Tent", 1000).await;
        let lamp = app.seed_product("Lamp", 500).await;

        let (status, body) = app.send("POST", "/api/v1/carts", Some(&owner_token), None).await;
        assert_eq!(status, StatusCode::CREATED);
        let cart_id = body["id"].as_i64().unwrap();
        let items_uri = format!("/api/v1/carts/{}/items", cart_id);
        let total_uri = format!("/api/v1/carts/{}/total", cart_id);

        let (status, body) = app
            .send(
                "POST",
                &items_uri,
                Some(&owner_token),
                Some(json!({"product_id": tent.id, "quantity": 2})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let tent_item = body["id"].as_i64().unwrap();
        app.send(
            "POST",
            &items_uri,
            Some(&owner_token),
            Some(json!({"product_id": lamp.id, "quantity": 1})),
        )
        .await;

        let (status, body) = app.send("GET", &total_uri, Some(&owner_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_price"], 2500);
        assert_eq!(body["item_count"], 2);

        // Another user cannot see or touch the cart, an admin can
        let (status, _) = app.send("GET", &total_uri, Some(&other_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app
            .send("DELETE", &items_uri, Some(&other_token), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = app
            .send("GET", &format!("/api/v1/carts/{}", cart_id), Some(&admin_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"].as_array().unwrap().len(), 2);
        assert_eq!(body["total_price"], 2500);

        let item_uri = format!("{}/{}", items_uri, tent_item);
        let (status, body) = app
            .send("PUT", &item_uri, Some(&owner_token), Some(json!({"quantity": 3})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["quantity"], 3);

        let (status, _) = app.send("DELETE", &item_uri, Some(&owner_token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app.send("DELETE", &item_uri, Some(&owner_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.send("DELETE", &items_uri, Some(&owner_token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app.send("DELETE", &items_uri, Some(&owner_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = app.send("GET", &total_uri, Some(&owner_token), None).await;
        assert_eq!(body["total_price"], 0);
    }

    #[tokio::test]
    async fn test_add_item_validation() {
        let app = TestApp::new().await;
        let (_, token) = app.seed_user("oki", UserRole::User).await;
        let tent = app.seed_product("Tent", 1000).await;
        let (_, body) = app.send("POST", "/api/v1/carts", Some(&token), None).await;
        let items_uri = format!("/api/v1/carts/{}/items", body["id"].as_i64().unwrap());

        let (status, body) = app
            .send(
                "POST",
                &items_uri,
                Some(&token),
                Some(json!({"product_id": tent.id + 100, "quantity": 1})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, body) = app
            .send(
                "POST",
                &items_uri,
                Some(&token),
                Some(json!({"product_id": tent.id, "quantity": 0})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");

        let (status, _) = app
            .send(
                "POST",
                &items_uri,
                Some(&token),
                Some(json!({"product_id": tent.id, "quantity": i64::MAX / 10})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .send("GET", "/api/v1/carts/999/items", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_listing_far_past_last_page() {
        let app = TestApp::new().await;
        let (_, admin_token) = app.seed_user("root", UserRole::Admin).await;
        app.seed_product("Tent", 1000).await;

        let (status, body) = app
            .send("GET", "/api/v1/products?page=9223372036854775807", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["products"].as_array().unwrap().is_empty());
        assert_eq!(body["total"], 1);

        let (status, body) = app
            .send(
                "GET",
                "/api/v1/users?page=9223372036854775807&limit=10",
                Some(&admin_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["users"].as_array().unwrap().is_empty());
    }
}
