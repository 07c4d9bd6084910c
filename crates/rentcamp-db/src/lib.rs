//! Rentcamp Database Layer
//!
//! This crate provides the persistence gateway for Rentcamp: accounts,
//! the product catalog and shopping carts, stored in SQLite via sqlx.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::{Database, MAX_ITEM_QUANTITY, ProductQuery, UserQuery};

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
pub use sqlx::Error as SqlxError;
