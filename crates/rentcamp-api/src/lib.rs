//! Rentcamp REST API
//!
//! This crate provides the Axum-based HTTP API for Rentcamp: accounts and
//! tokens, the product catalog and shopping carts.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
