//! Product catalog operations

use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::error::DbError;
use crate::models::{NewProduct, Product, UpdateProduct};
use crate::repository::Database;
use crate::utils::contains_pattern;

/// Default page size for product listings
const DEFAULT_PRODUCT_LIMIT: i64 = 10;
/// Largest page size a caller may request
const MAX_PRODUCT_LIMIT: i64 = 100;

/// Query parameters for listing products
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Filter by name (partial match)
    pub name: Option<String>,
    /// Pagination offset (must be non-negative)
    pub offset: i64,
    /// Pagination limit (must be positive)
    pub limit: i64,
}

impl ProductQuery {
    /// Build a query from 1-based page parameters
    pub fn page(page: i64, limit: i64, name: Option<String>) -> Self {
        let query = Self {
            name,
            offset: 0,
            limit,
        }
        .validated();
        let page = page.max(1);
        Self {
            offset: (page - 1).saturating_mul(query.limit),
            ..query
        }
    }

    /// Validates and normalizes the query parameters
    pub fn validated(mut self) -> Self {
        if self.offset < 0 {
            self.offset = 0;
        }
        if self.limit <= 0 {
            self.limit = DEFAULT_PRODUCT_LIMIT;
        } else if self.limit > MAX_PRODUCT_LIMIT {
            self.limit = MAX_PRODUCT_LIMIT;
        }
        if let Some(name) = &self.name
            && name.is_empty()
        {
            self.name = None;
        }
        self
    }
}

impl Database {
    // ==================== Product Operations ====================

    /// Insert a new product
    pub async fn insert_product(&self, product: NewProduct) -> Result<Product, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO products (name, description, price, stock, image, admin_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.image)
        .bind(product.admin_id)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Product {
            id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            image: product.image,
            admin_id: product.admin_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a product by ID
    pub async fn get_product_by_id(&self, id: i64) -> Result<Option<Product>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, description, price, stock, image, admin_id, created_at, updated_at
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Product::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List products with an optional name search and pagination
    pub async fn list_products(&self, query: ProductQuery) -> Result<(Vec<Product>, i64), DbError> {
        let query = query.validated();

        let (where_clause, params) = match &query.name {
            Some(name) => ("WHERE name LIKE ? ESCAPE '\\'", vec![contains_pattern(name)]),
            None => ("", Vec::new()),
        };

        // Get total count
        let count_sql = format!("SELECT COUNT(*) as count FROM products {}", where_clause);
        let mut count_query = sqlx::query(&count_sql);
        for param in &params {
            count_query = count_query.bind(param);
        }
        let total: i64 = count_query.fetch_one(&self.pool).await?.get("count");

        let sql = format!(
            r#"
            SELECT id, name, description, price, stock, image, admin_id, created_at, updated_at
            FROM products
            {}
            ORDER BY id
            LIMIT ? OFFSET ?
            "#,
            where_clause
        );

        let mut products_query = sqlx::query(&sql);
        for param in &params {
            products_query = products_query.bind(param);
        }
        products_query = products_query.bind(query.limit).bind(query.offset);

        let rows = products_query.fetch_all(&self.pool).await?;
        let products: Result<Vec<Product>, _> = rows
            .iter()
            .map(|row| Product::try_from(row).map_err(DbError::from))
            .collect();

        Ok((products?, total))
    }

    /// Apply a partial update and return the updated product
    ///
    /// Returns `None` when no product has the given ID.
    pub async fn update_product(
        &self,
        id: i64,
        update: UpdateProduct,
    ) -> Result<Option<Product>, DbError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE products SET updated_at = ");
        builder.push_bind(Utc::now().to_rfc3339());

        if let Some(name) = update.name {
            builder.push(", name = ").push_bind(name);
        }
        if let Some(description) = update.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(price) = update.price {
            builder.push(", price = ").push_bind(price);
        }
        if let Some(stock) = update.stock {
            builder.push(", stock = ").push_bind(stock);
        }
        if let Some(image) = update.image {
            builder.push(", image = ").push_bind(image);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(
            " RETURNING id, name, description, price, stock, image, admin_id, created_at, updated_at",
        );

        let result = builder.build().fetch_optional(&self.pool).await?;

        result.map(|row| Product::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Delete a product
    ///
    /// Cart items referencing the product are removed with it.
    pub async fn delete_product(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
