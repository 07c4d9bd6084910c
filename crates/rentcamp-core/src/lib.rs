//! Rentcamp Core Business Logic
//!
//! This crate provides the cart aggregate: cart and item lifecycle plus the
//! price total computed against the live product catalog.

pub mod cart;
pub mod error;

pub use cart::{CartManager, CartWithItems};
pub use error::CoreError;
