//! Cart manager implementation

use rentcamp_db::{Cart, CartItem, CartItemDetail, Database, MAX_ITEM_QUANTITY};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::CoreError;

/// A cart together with its items and current total
#[derive(Debug, Clone, Serialize)]
pub struct CartWithItems {
    #[serde(flatten)]
    pub cart: Cart,
    pub items: Vec<CartItemDetail>,
    pub total_price: i64,
}

/// Cart and cart item lifecycle
///
/// The manager trusts the cart IDs it is given. Callers check ownership
/// before reaching it.
#[derive(Clone)]
pub struct CartManager {
    db: Database,
}

impl CartManager {
    /// Create a new cart manager
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create an empty cart owned by `user_id`
    pub async fn create_cart(&self, user_id: i64) -> Result<Cart, CoreError> {
        let cart = self.db.insert_cart(user_id).await?;
        info!("Created cart {} for user {}", cart.id, user_id);
        metrics::counter!("rentcamp_carts_created_total").increment(1);
        Ok(cart)
    }

    /// Get a cart without its items
    pub async fn find_cart(&self, cart_id: i64) -> Result<Cart, CoreError> {
        self.db
            .get_cart_by_id(cart_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("cart {}", cart_id)))
    }

    /// Get a cart with its items and total
    pub async fn get_cart(&self, cart_id: i64) -> Result<CartWithItems, CoreError> {
        let cart = self.find_cart(cart_id).await?;
        let items = self.db.get_cart_items_with_products(cart_id).await?;
        let total_price = self.db.get_cart_total(cart_id).await?;

        Ok(CartWithItems {
            cart,
            items,
            total_price,
        })
    }

    /// List the carts owned by a user
    pub async fn list_carts_for_user(&self, user_id: i64) -> Result<Vec<Cart>, CoreError> {
        Ok(self.db.list_carts_by_user(user_id).await?)
    }

    /// Add an item to a cart
    ///
    /// The product is not looked up here. An unknown product or cart is
    /// rejected by the store as a persistence error.
    pub async fn add_item(
        &self,
        cart_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartItem, CoreError> {
        validate_quantity(quantity)?;

        let item = self.db.insert_cart_item(cart_id, product_id, quantity).await?;
        debug!(
            "Added product {} x{} to cart {} (item {})",
            product_id, quantity, cart_id, item.id
        );
        metrics::counter!("rentcamp_cart_items_added_total").increment(1);
        Ok(item)
    }

    /// Change the quantity of an item in a cart
    pub async fn update_item(
        &self,
        cart_id: i64,
        item_id: i64,
        quantity: i64,
    ) -> Result<CartItem, CoreError> {
        validate_quantity(quantity)?;

        self.db
            .update_cart_item_quantity(cart_id, item_id, quantity)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("item {} in cart {}", item_id, cart_id)))
    }

    /// Remove an item from a cart
    ///
    /// Returns `false` when the cart holds no such item.
    pub async fn remove_item(&self, cart_id: i64, item_id: i64) -> Result<bool, CoreError> {
        let removed = self.db.delete_cart_item(cart_id, item_id).await?;
        if removed {
            debug!("Removed item {} from cart {}", item_id, cart_id);
        }
        Ok(removed)
    }

    /// List the items of a cart with their current product data
    pub async fn list_items(&self, cart_id: i64) -> Result<Vec<CartItemDetail>, CoreError> {
        Ok(self.db.get_cart_items_with_products(cart_id).await?)
    }

    /// Remove every item from a cart
    ///
    /// Returns `false` when the cart was already empty. The cart itself is kept.
    pub async fn clear_cart(&self, cart_id: i64) -> Result<bool, CoreError> {
        let removed = self.db.delete_cart_items(cart_id).await?;
        debug!("Cleared {} items from cart {}", removed, cart_id);
        Ok(removed > 0)
    }

    /// Sum of quantity × current unit price over the cart's items
    ///
    /// An empty cart totals zero. A failed query is an error, never zero.
    pub async fn total_price(&self, cart_id: i64) -> Result<i64, CoreError> {
        Ok(self.db.get_cart_total(cart_id).await?)
    }

    /// Number of items in a cart
    pub async fn item_count(&self, cart_id: i64) -> Result<i64, CoreError> {
        Ok(self.db.count_cart_items(cart_id).await?)
    }
}

fn validate_quantity(quantity: i64) -> Result<(), CoreError> {
    if quantity <= 0 {
        return Err(CoreError::Validation(format!(
            "quantity must be greater than zero, got {}",
            quantity
        )));
    }
    if quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::Validation(format!(
            "quantity must be at most {}, got {}",
            MAX_ITEM_QUANTITY, quantity
        )));
    }
    Ok(())
}
