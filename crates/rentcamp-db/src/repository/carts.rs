//! Cart and cart item operations
//!
//! Every statement here is a single SQL statement; callers get the atomicity
//! SQLite gives a single statement and nothing more.

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{Cart, CartItem, CartItemDetail};
use crate::repository::Database;

/// Largest quantity a single cart item may hold
///
/// Matches the CHECK on `cart_items.quantity`.
pub const MAX_ITEM_QUANTITY: i64 = 10_000;

impl Database {
    // ==================== Cart Operations ====================

    /// Create a cart owned by `user_id`
    pub async fn insert_cart(&self, user_id: i64) -> Result<Cart, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO carts (user_id, created_at, updated_at)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        Ok(Cart {
            id: result.get("id"),
            user_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a cart by ID
    pub async fn get_cart_by_id(&self, id: i64) -> Result<Option<Cart>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, user_id, created_at, updated_at
            FROM carts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Cart::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List the carts owned by a user, oldest first
    pub async fn list_carts_by_user(&self, user_id: i64) -> Result<Vec<Cart>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, created_at, updated_at
            FROM carts
            WHERE user_id = ?
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Cart::try_from(row).map_err(DbError::from))
            .collect()
    }

    // ==================== Cart Item Operations ====================

    /// Insert an item into a cart
    pub async fn insert_cart_item(
        &self,
        cart_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartItem, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO cart_items (cart_id, product_id, quantity, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        Ok(CartItem {
            id: result.get("id"),
            cart_id,
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get the items of a cart joined with their current product data
    pub async fn get_cart_items_with_products(
        &self,
        cart_id: i64,
    ) -> Result<Vec<CartItemDetail>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT ci.id, ci.cart_id, ci.product_id, ci.quantity, ci.created_at, ci.updated_at,
                   p.name AS product_name, p.price AS product_price, p.stock AS product_stock
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = ?
            ORDER BY ci.id
            "#,
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| CartItemDetail::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Set the quantity of an item, scoped to its cart
    ///
    /// Returns `None` when the (cart, item) pair does not exist.
    pub async fn update_cart_item_quantity(
        &self,
        cart_id: i64,
        item_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE cart_items
            SET quantity = ?, updated_at = ?
            WHERE cart_id = ? AND id = ?
            RETURNING id, cart_id, product_id, quantity, created_at, updated_at
            "#,
        )
        .bind(quantity)
        .bind(Utc::now().to_rfc3339())
        .bind(cart_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| CartItem::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Delete an item, scoped to its cart
    pub async fn delete_cart_item(&self, cart_id: i64, item_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ? AND id = ?")
            .bind(cart_id)
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every item of a cart, returning how many were removed
    pub async fn delete_cart_items(&self, cart_id: i64) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
            .bind(cart_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Count the items of a cart
    pub async fn count_cart_items(&self, cart_id: i64) -> Result<i64, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM cart_items WHERE cart_id = ?")
            .bind(cart_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(result.get("count"))
    }

    /// Sum of quantity × current price over the items of a cart
    ///
    /// An empty cart sums to zero.
    pub async fn get_cart_total(&self, cart_id: i64) -> Result<i64, DbError> {
        let result = sqlx::query(
            r#"
            SELECT COALESCE(SUM(ci.quantity * p.price), 0) as total
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = ?
            "#,
        )
        .bind(cart_id)
        .fetch_one(&self.pool)
        .await?;
        // SQLite falls back to REAL when the sum leaves the i64 range
        Ok(result.try_get("total")?)
    }
}
