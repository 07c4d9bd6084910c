//! Cart management module

mod manager;

pub use manager::{CartManager, CartWithItems};
