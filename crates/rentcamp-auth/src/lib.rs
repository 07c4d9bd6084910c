//! Rentcamp Authentication and Authorization
//!
//! This crate provides password hashing, two-secret JWT issuance and
//! validation, and the request guard that enforces role and ownership rules.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use error::AuthError;
pub use jwt::{Claims, TokenKind, TokenPair, TokenService};
pub use middleware::{AuthUser, authenticate, enforce_owner_or_role, require_admin, require_auth};
pub use password::CredentialHasher;
